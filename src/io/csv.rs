use csv::{Reader, ReaderBuilder, StringRecord};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::config::InsightConfig;
use crate::dataset::{Dataset, DatasetBuilder, Row};
use crate::error::{Error, Result};

/// Extension a source name must carry to be accepted
pub const CSV_EXTENSION: &str = ".csv";

/// ソース名の拡張子を確認する（大文字小文字は区別しない）
pub fn check_extension(name: &str) -> Result<()> {
    if name.to_lowercase().ends_with(CSV_EXTENSION) {
        Ok(())
    } else {
        Err(Error::InputFormat(format!(
            "'{}' is not a {} file",
            name, CSV_EXTENSION
        )))
    }
}

/// Shared reader settings: comma-delimited, quoted fields, ragged rows allowed.
///
/// The source is wrapped in a [`QuoteGuard`], so quoting mistakes surface as
/// read errors on both the one-shot and the streaming path.
pub(crate) fn csv_reader<R: Read>(source: R) -> Reader<QuoteGuard<R>> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(QuoteGuard::new(source))
}

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// A quoting mistake found while reading; converts to [`Error::InputFormat`]
#[derive(Debug)]
pub(crate) struct MalformedQuote {
    line: u64,
    reason: &'static str,
}

impl fmt::Display for MalformedQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for MalformedQuote {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    /// Closing quote, or the first half of an escaped `""`
    QuoteInQuoted,
    /// Blanks between a closing quote and the next delimiter
    AfterQuoted,
}

/// クォートの対応を検査するリーダー
///
/// The csv parser lets an unclosed quote run to the end of input and glues
/// text after a closing quote onto the field. This adaptor tracks field
/// quoting over the raw bytes and fails the read instead. A quote in the
/// middle of an unquoted field is literal, as it is for the parser.
pub(crate) struct QuoteGuard<R> {
    inner: R,
    state: QuoteState,
    line: u64,
    opened_at: u64,
    bom_seen: usize,
    bom_pending: bool,
}

impl<R: Read> QuoteGuard<R> {
    pub(crate) fn new(inner: R) -> Self {
        QuoteGuard {
            inner,
            state: QuoteState::FieldStart,
            line: 1,
            opened_at: 1,
            bom_seen: 0,
            bom_pending: true,
        }
    }

    fn fail(line: u64, reason: &'static str) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, MalformedQuote { line, reason })
    }

    fn step(&mut self, byte: u8) -> io::Result<()> {
        if self.bom_pending {
            if self.bom_seen < UTF8_BOM.len() && byte == UTF8_BOM[self.bom_seen] {
                self.bom_seen += 1;
                return Ok(());
            }
            self.bom_pending = false;
        }

        use QuoteState::*;
        self.state = match (self.state, byte) {
            (Quoted, b'"') => QuoteInQuoted,
            (Quoted, b'\n') => {
                self.line += 1;
                Quoted
            }
            (Quoted, _) => Quoted,
            (QuoteInQuoted, b'"') => Quoted,
            (QuoteInQuoted | AfterQuoted, b' ' | b'\t') => AfterQuoted,
            (FieldStart, b'"') => {
                self.opened_at = self.line;
                Quoted
            }
            (_, b',' | b'\r') => FieldStart,
            (_, b'\n') => {
                self.line += 1;
                FieldStart
            }
            (QuoteInQuoted | AfterQuoted, _) => {
                return Err(Self::fail(
                    self.line,
                    "unexpected character after closing quote",
                ))
            }
            (FieldStart | Unquoted, _) => Unquoted,
        };
        Ok(())
    }
}

impl<R: Read> Read for QuoteGuard<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && self.state == QuoteState::Quoted {
            return Err(Self::fail(self.opened_at, "unterminated quoted field"));
        }
        for &byte in &buf[..n] {
            self.step(byte)?;
        }
        Ok(n)
    }
}

/// Reads the header line and turns it into a unique, ordered column list
pub(crate) fn read_header<R: Read>(rdr: &mut Reader<R>) -> Result<Vec<String>> {
    let header = rdr.headers()?;
    Ok(normalize_header(header))
}

/// Strips a BOM and disambiguates repeated names as `name_1`, `name_2`, ...
pub(crate) fn normalize_header(header: &StringRecord) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(header.len());

    for (i, field) in header.iter().enumerate() {
        let name = if i == 0 {
            field.trim_start_matches('\u{feff}')
        } else {
            field
        };

        let mut candidate = name.to_string();
        let mut suffix = 1;
        while columns.contains(&candidate) {
            candidate = format!("{}_{}", name, suffix);
            suffix += 1;
        }
        columns.push(candidate);
    }

    columns
}

/// Copies a parsed record into a schema-width row
pub(crate) fn record_to_row(record: &StringRecord, width: usize) -> Row {
    if record.len() > width {
        log::warn!(
            "record at line {} has {} fields, header has {}; extra fields dropped",
            record.position().map(|p| p.line()).unwrap_or(0),
            record.len(),
            width
        );
    }
    let values: Vec<String> = record.iter().take(width).map(str::to_string).collect();
    Row::with_width(values, width)
}

/// Reads at most `max_rows` records from any byte source.
///
/// Reading stops at the cap; anything after it is never parsed.
pub fn read_csv_reader<R: Read>(source: R, max_rows: usize) -> Result<Dataset> {
    let mut rdr = csv_reader(source);
    let columns = read_header(&mut rdr)?;
    let width = columns.len();

    let mut builder = DatasetBuilder::new(columns, max_rows);
    let mut record = StringRecord::new();

    while !builder.is_full() {
        if !rdr.read_record(&mut record)? {
            break;
        }
        builder.extend(std::iter::once(record_to_row(&record, width)));
    }

    if builder.is_full() {
        log::warn!("row cap of {} reached; remaining input ignored", max_rows);
    }

    let dataset = builder.finish();
    log::info!(
        "parsed {} rows x {} columns",
        dataset.row_count(),
        dataset.column_count()
    );
    Ok(dataset)
}

/// Parses an in-memory CSV text blob in one shot
pub fn read_csv_str(text: &str, config: &InsightConfig) -> Result<Dataset> {
    read_csv_reader(text.as_bytes(), config.max_rows)
}

/// CSVファイルからDatasetを読み込む
pub fn read_csv<P: AsRef<Path>>(path: P, config: &InsightConfig) -> Result<Dataset> {
    let path = path.as_ref();
    check_extension(&path.to_string_lossy())?;

    let file = File::open(path).map_err(Error::Io)?;
    read_csv_reader(file, config.max_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Dataset {
        read_csv_str(text, &InsightConfig::default()).unwrap()
    }

    #[test]
    fn test_extension_check() {
        assert!(check_extension("data.csv").is_ok());
        assert!(check_extension("DATA.CSV").is_ok());
        assert!(matches!(check_extension("data.tsv"), Err(Error::InputFormat(_))));
        assert!(matches!(check_extension("csv"), Err(Error::InputFormat(_))));
    }

    #[test]
    fn test_quoted_fields() {
        let ds = parse("name,note\n\"Smith, J\",\"line one\nline two\"\nBob,plain\n");
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.value(0, "name"), "Smith, J");
        assert_eq!(ds.value(0, "note"), "line one\nline two");
        assert_eq!(ds.value(1, "note"), "plain");
    }

    #[test]
    fn test_escaped_and_literal_quotes() {
        let ds = parse("q,size\n\"say \"\"hi\"\"\",12\"\n\"\" ,x\"y\n");
        assert_eq!(ds.value(0, "q"), "say \"hi\"");
        assert_eq!(ds.value(0, "size"), "12\"");
        assert_eq!(ds.value(1, "size"), "x\"y");
    }

    #[test]
    fn test_unterminated_quote_is_input_format_error() {
        let result = read_csv_str("a,b\n1,2\n\"oops,3\n4,5\n6,7\n", &InsightConfig::default());
        match result {
            Err(Error::InputFormat(msg)) => {
                assert_eq!(msg, "line 3: unterminated quoted field");
            }
            other => panic!("expected an input format error, got {:?}", other),
        }

        // an unclosed quote in the header is caught as well
        assert!(matches!(
            read_csv_str("\"a,b\n1,2\n", &InsightConfig::default()),
            Err(Error::InputFormat(_))
        ));
    }

    #[test]
    fn test_text_after_closing_quote_rejected() {
        match read_csv_str("a,b\n1,2\n\"x\"y,3\n", &InsightConfig::default()) {
            Err(Error::InputFormat(msg)) => assert!(msg.starts_with("line 3:"), "{}", msg),
            other => panic!("expected an input format error, got {:?}", other),
        }
    }

    #[test]
    fn test_quote_guard_passes_bytes_through() {
        let text = "\u{feff}\"h\"\r\n\"a\nb\"\r\n";
        let mut out = String::new();
        QuoteGuard::new(text.as_bytes())
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn test_empty_lines_skipped_and_short_rows_padded() {
        let ds = parse("a,b,c\n1,2,3\n\n4\n\n");
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.value(1, "a"), "4");
        assert_eq!(ds.value(1, "b"), "");
        assert_eq!(ds.value(1, "c"), "");
    }

    #[test]
    fn test_long_rows_truncated() {
        let ds = parse("a,b\n1,2,3,4\n");
        assert_eq!(ds.rows()[0].values().len(), 2);
        assert_eq!(ds.value(0, "b"), "2");
    }

    #[test]
    fn test_header_only_and_empty_sources() {
        let ds = parse("a,b\n");
        assert!(ds.is_empty());
        assert_eq!(ds.columns(), &["a".to_string(), "b".to_string()]);

        let ds = parse("");
        assert!(ds.is_empty());
        assert_eq!(ds.column_count(), 0);
    }

    #[test]
    fn test_duplicate_headers_and_bom() {
        let ds = parse("\u{feff}id,x,x,x\n1,a,b,c\n");
        assert_eq!(ds.columns(), &["id", "x", "x_1", "x_2"].map(String::from));
        assert_eq!(ds.value(0, "x_2"), "c");
    }

    #[test]
    fn test_row_cap() {
        let mut text = String::from("n\n");
        for i in 0..50 {
            text.push_str(&format!("{}\n", i));
        }
        let ds = read_csv_reader(text.as_bytes(), 20).unwrap();
        assert_eq!(ds.row_count(), 20);
        assert_eq!(ds.value(19, "n"), "19");
    }

    #[test]
    fn test_invalid_utf8_is_encoding_error() {
        let bytes: &[u8] = b"a,b\n1,\xff\xfe\n";
        assert!(matches!(read_csv_reader(bytes, 100), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_wrong_extension_rejected_before_open() {
        let result = read_csv("/definitely/not/here.txt", &InsightConfig::default());
        assert!(matches!(result, Err(Error::InputFormat(_))));
    }
}
