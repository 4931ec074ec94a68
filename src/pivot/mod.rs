//! ピボットテーブル機能を提供するモジュール
//!
//! 2つのカテゴリ列の組み合わせごとの出現回数を集計する。

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};

use crate::config::InsightConfig;
use crate::dataset::Dataset;
use crate::stats::EMPTY_KEY;

/// 2列のクロス集計結果
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    /// 行軸となる列名
    col_a: String,

    /// 列軸となる列名
    col_b: String,

    /// (行値, 列値) → 件数。軸の切り詰めに影響されない
    counts: HashMap<(String, String), usize>,

    /// 行軸の値（出現順、上限あり）
    a_values: Vec<String>,

    /// 列軸の値（出現順、上限あり）
    b_values: Vec<String>,
}

impl PivotTable {
    pub fn col_a(&self) -> &str {
        &self.col_a
    }

    pub fn col_b(&self) -> &str {
        &self.col_b
    }

    /// 行軸の値一覧
    pub fn a_values(&self) -> &[String] {
        &self.a_values
    }

    /// 列軸の値一覧
    pub fn b_values(&self) -> &[String] {
        &self.b_values
    }

    /// 組み合わせの件数（存在しなければ0）
    pub fn count(&self, a: &str, b: &str) -> usize {
        self.counts
            .get(&(a.to_string(), b.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// 集計された組み合わせの総数
    pub fn pair_count(&self) -> usize {
        self.counts.len()
    }

    /// 全件数の合計（データセットの行数と一致する）
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Largest count among the visible (truncated) axis values
    pub fn max_visible_count(&self) -> usize {
        self.a_values
            .iter()
            .flat_map(|a| self.b_values.iter().map(move |b| self.count(a, b)))
            .max()
            .unwrap_or(0)
    }

    /// Count scaled into `[0, 1]` against [`max_visible_count`](Self::max_visible_count)
    pub fn intensity(&self, a: &str, b: &str) -> f64 {
        let max = self.max_visible_count();
        if max == 0 {
            return 0.0;
        }
        (self.count(a, b) as f64 / max as f64).min(1.0)
    }
}

struct PivotRow<'a> {
    table: &'a PivotTable,
    a: &'a str,
}

impl Serialize for PivotRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.b_values.len()))?;
        for b in &self.table.b_values {
            map.serialize_entry(b, &self.table.count(self.a, b))?;
        }
        map.end()
    }
}

struct PivotCounts<'a>(&'a PivotTable);

impl Serialize for PivotCounts<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let table = self.0;
        let mut map = serializer.serialize_map(Some(table.a_values.len()))?;
        for a in &table.a_values {
            map.serialize_entry(a, &PivotRow { table, a })?;
        }
        map.end()
    }
}

// 表示用の軸に沿って出力する
impl Serialize for PivotTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("colA", &self.col_a)?;
        map.serialize_entry("colB", &self.col_b)?;
        map.serialize_entry("aValues", &self.a_values)?;
        map.serialize_entry("bValues", &self.b_values)?;
        map.serialize_entry("counts", &PivotCounts(self))?;
        map.end()
    }
}

/// 空文字列は予約キーに置き換える
fn key_of(value: &str) -> &str {
    if value.is_empty() {
        EMPTY_KEY
    } else {
        value
    }
}

/// 出現順を保ったまま値を記録する
fn discover(seen: &mut HashSet<String>, order: &mut Vec<String>, value: &str) {
    if !seen.contains(value) {
        seen.insert(value.to_string());
        order.push(value.to_string());
    }
}

/// `col_a` × `col_b` の頻度クロス集計を作成する。
///
/// 全行を集計し、軸の値一覧だけを `pivot_axis_limit` 件に切り詰める。
/// 存在しない列はすべて空値として扱われる。
pub fn pivot(dataset: &Dataset, col_a: &str, col_b: &str, config: &InsightConfig) -> PivotTable {
    let a_column = dataset.column_values(col_a);
    let b_column = dataset.column_values(col_b);

    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    let mut a_seen = HashSet::new();
    let mut b_seen = HashSet::new();
    let mut a_values = Vec::new();
    let mut b_values = Vec::new();

    for (a, b) in a_column.into_iter().zip(b_column) {
        let (a, b) = (key_of(a), key_of(b));
        discover(&mut a_seen, &mut a_values, a);
        discover(&mut b_seen, &mut b_values, b);
        *counts.entry((a.to_string(), b.to_string())).or_insert(0) += 1;
    }

    a_values.truncate(config.pivot_axis_limit);
    b_values.truncate(config.pivot_axis_limit);

    log::debug!(
        "pivot {} x {}: {} pairs over {} rows",
        col_a,
        col_b,
        counts.len(),
        dataset.row_count()
    );

    PivotTable {
        col_a: col_a.to_string(),
        col_b: col_b.to_string(),
        counts,
        a_values,
        b_values,
    }
}
