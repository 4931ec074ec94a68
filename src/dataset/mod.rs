//! Row-oriented, schema-fixed table of raw string values
//!
//! A [`Dataset`] is what ingestion produces and what every analysis reads.
//! Its column list is fixed by the header line; every [`Row`] holds exactly
//! one raw value per column, with absent trailing fields stored as empty
//! strings. Once built, a dataset is never mutated; a new upload replaces it.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// One record, aligned with its dataset's column list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    values: Vec<String>,
}

impl Row {
    /// Builds a row of exactly `width` values, padding or truncating
    pub fn with_width(mut values: Vec<String>, width: usize) -> Self {
        values.resize(width, String::new());
        Row { values }
    }

    /// Value at a column position; out-of-range reads as empty
    pub fn get(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// All values in column order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered rows over a fixed schema
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// 空のデータセットを作成
    pub fn new(columns: Vec<String>) -> Self {
        Dataset {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a dataset from raw records, normalizing each to the schema width
    pub fn from_records<I>(columns: Vec<String>, records: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let width = columns.len();
        let rows = records
            .into_iter()
            .map(|values| Row::with_width(values, width))
            .collect();
        Dataset { columns, rows }
    }

    /// Column names in header order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when no rows were ingested (the schema may still be known)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Raw value of `column` in row `row`; unknown columns read as empty
    pub fn value(&self, row: usize, column: &str) -> &str {
        match (self.rows.get(row), self.column_index(column)) {
            (Some(r), Some(idx)) => r.get(idx),
            _ => "",
        }
    }

    /// All raw values of a column in row order.
    ///
    /// An unknown column yields one empty string per row, matching how a
    /// missing field reads.
    pub fn column_values(&self, column: &str) -> Vec<&str> {
        match self.column_index(column) {
            Some(idx) => self.rows.iter().map(|r| r.get(idx)).collect(),
            None => {
                log::warn!("column '{}' not found; reading it as empty", column);
                vec![""; self.rows.len()]
            }
        }
    }

    /// Rows `[offset, offset + len)`, clamped to the dataset
    pub fn slice(&self, offset: usize, len: usize) -> &[Row] {
        let start = offset.min(self.rows.len());
        let end = start.saturating_add(len).min(self.rows.len());
        &self.rows[start..end]
    }
}

/// Accumulates row batches into a [`Dataset`] without ever exceeding its cap
#[derive(Debug)]
pub struct DatasetBuilder {
    dataset: Dataset,
    max_rows: usize,
    discarded: usize,
}

impl DatasetBuilder {
    pub fn new(columns: Vec<String>, max_rows: usize) -> Self {
        DatasetBuilder {
            dataset: Dataset::new(columns),
            max_rows,
            discarded: 0,
        }
    }

    /// Appends a batch, dropping whatever does not fit.
    ///
    /// Returns `true` once the cap has been reached.
    pub fn extend<I>(&mut self, batch: I) -> bool
    where
        I: IntoIterator<Item = Row>,
    {
        let width = self.dataset.columns.len();
        for row in batch {
            if self.dataset.rows.len() >= self.max_rows {
                self.discarded += 1;
                continue;
            }
            let row = if row.len() == width {
                row
            } else {
                Row::with_width(row.values, width)
            };
            self.dataset.rows.push(row);
        }
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.dataset.rows.len() >= self.max_rows
    }

    pub fn len(&self) -> usize {
        self.dataset.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.rows.is_empty()
    }

    /// Rows dropped because the cap was already reached
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn finish(self) -> Dataset {
        self.dataset
    }
}

struct RowRef<'a> {
    columns: &'a [String],
    row: &'a Row,
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (idx, name) in self.columns.iter().enumerate() {
            map.serialize_entry(name, self.row.get(idx))?;
        }
        map.end()
    }
}

// 行はヘッダー順のオブジェクト配列として出力する
impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowRef {
                columns: &self.columns,
                row,
            })?;
        }
        seq.end()
    }
}
