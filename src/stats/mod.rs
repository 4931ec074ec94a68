// 統計モジュール
//
// 列ごとの分類（数値 / カテゴリ）と要約統計量を計算します。
// すべての関数はDatasetに対する純粋関数で、Dataset差し替えのたびに呼び出されます。

pub mod correlation;
pub mod descriptive;
pub mod histogram;

use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::config::InsightConfig;
use crate::dataset::Dataset;

pub use correlation::{correlation_matrix, pearson, CorrelationMatrix};
pub use descriptive::{is_numeric, mean, median, parse_finite, parse_number, population_stdev};
pub use histogram::{build_histogram, HistogramBin};

/// Reserved frequency key for a raw empty value
pub const EMPTY_KEY: &str = "__EMPTY__";

/// Decimal digits kept for mean, median and stdev
const ROUND_DIGITS: usize = 6;

/// Numeric column summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericProfile {
    /// Finite values parsed from the column
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub stdev: f64,
    /// Leading parsed values, first-encountered order
    pub sample: Vec<f64>,
    pub histogram: Vec<HistogramBin>,
}

/// One entry of a categorical frequency table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Categorical column summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalProfile {
    /// Distinct non-empty values
    pub unique_count: usize,
    /// Most frequent values, descending by count, ties in discovery order
    pub top: Vec<ValueCount>,
}

/// Summary of one column, tagged by its classification
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSummary {
    Numeric(NumericProfile),
    Categorical(CategoricalProfile),
}

/// A column's name together with its summary
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub summary: ColumnSummary,
}

impl ColumnProfile {
    pub fn is_numeric(&self) -> bool {
        matches!(self.summary, ColumnSummary::Numeric(_))
    }

    pub fn as_numeric(&self) -> Option<&NumericProfile> {
        match &self.summary {
            ColumnSummary::Numeric(p) => Some(p),
            ColumnSummary::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&CategoricalProfile> {
        match &self.summary {
            ColumnSummary::Categorical(p) => Some(p),
            ColumnSummary::Numeric(_) => None,
        }
    }
}

/// Numeric/categorical decision for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    Numeric,
    Categorical,
}

impl ColumnClass {
    /// Numeric iff at least `threshold` of the non-empty values are numbers
    /// and there is at least one non-empty value
    pub fn from_counts(numeric: usize, non_empty: usize, threshold: f64) -> Self {
        if non_empty == 0 {
            return ColumnClass::Categorical;
        }
        let ratio = numeric as f64 / non_empty as f64;
        if ratio >= threshold {
            ColumnClass::Numeric
        } else {
            ColumnClass::Categorical
        }
    }
}

/// Values of a column whose trimmed content is not empty
fn non_empty<'a>(values: &[&'a str]) -> Vec<&'a str> {
    values
        .iter()
        .copied()
        .filter(|v| !v.trim().is_empty())
        .collect()
}

/// Classifies raw column values
pub fn classify(values: &[&str], threshold: f64) -> ColumnClass {
    let present = non_empty(values);
    let numeric = present.iter().filter(|v| is_numeric(v)).count();
    ColumnClass::from_counts(numeric, present.len(), threshold)
}

/// 数値列の要約
pub fn numeric_profile(values: &[&str], config: &InsightConfig) -> NumericProfile {
    let nums: Vec<f64> = values.iter().filter_map(|v| parse_finite(v)).collect();
    let (min, max) = descriptive::min_max(&nums);

    NumericProfile {
        count: nums.len(),
        mean: descriptive::round_to(mean(&nums).unwrap_or(0.0), ROUND_DIGITS),
        median: descriptive::round_to(median(&nums).unwrap_or(0.0), ROUND_DIGITS),
        min,
        max,
        stdev: descriptive::round_to(population_stdev(&nums).unwrap_or(0.0), ROUND_DIGITS),
        sample: nums.iter().take(config.sample_size).copied().collect(),
        histogram: build_histogram(&nums, config.histogram_bins),
    }
}

/// カテゴリ列の要約（頻度の降順、同数は出現順）
pub fn categorical_profile(values: &[&str], config: &InsightConfig) -> CategoricalProfile {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut freq: Vec<(&str, usize)> = Vec::new();

    for &raw in values {
        let key = if raw.is_empty() { EMPTY_KEY } else { raw };
        match index.get(key) {
            Some(&i) => freq[i].1 += 1,
            None => {
                index.insert(key, freq.len());
                freq.push((key, 1));
            }
        }
    }

    // sort_by is stable, so ties keep discovery order
    freq.sort_by(|a, b| b.1.cmp(&a.1));

    CategoricalProfile {
        unique_count: freq.len(),
        top: freq
            .into_iter()
            .take(config.top_categories)
            .map(|(value, count)| ValueCount {
                value: value.to_string(),
                count,
            })
            .collect(),
    }
}

/// Classifies and summarizes one column
pub fn profile_column(name: &str, values: &[&str], config: &InsightConfig) -> ColumnProfile {
    let present = non_empty(values);
    let numeric = present.iter().filter(|v| is_numeric(v)).count();
    let class = ColumnClass::from_counts(numeric, present.len(), config.numeric_ratio);
    log::debug!(
        "column '{}': {}/{} numeric -> {:?}",
        name,
        numeric,
        present.len(),
        class
    );

    let summary = match class {
        ColumnClass::Numeric => ColumnSummary::Numeric(numeric_profile(&present, config)),
        ColumnClass::Categorical => {
            ColumnSummary::Categorical(categorical_profile(&present, config))
        }
    };

    ColumnProfile {
        name: name.to_string(),
        summary,
    }
}

/// Profiles of every column, in header order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profiles {
    columns: Vec<ColumnProfile>,
}

impl Profiles {
    pub fn new(columns: Vec<ColumnProfile>) -> Self {
        Profiles { columns }
    }

    /// All profiles in discovery order
    pub fn columns(&self) -> &[ColumnProfile] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|p| p.name == name)
    }

    pub fn numeric(&self) -> impl Iterator<Item = (&str, &NumericProfile)> {
        self.columns
            .iter()
            .filter_map(|p| p.as_numeric().map(|n| (p.name.as_str(), n)))
    }

    pub fn categorical(&self) -> impl Iterator<Item = (&str, &CategoricalProfile)> {
        self.columns
            .iter()
            .filter_map(|p| p.as_categorical().map(|c| (p.name.as_str(), c)))
    }

    pub fn numeric_profile(&self, name: &str) -> Option<&NumericProfile> {
        self.get(name).and_then(ColumnProfile::as_numeric)
    }

    pub fn categorical_profile(&self, name: &str) -> Option<&CategoricalProfile> {
        self.get(name).and_then(ColumnProfile::as_categorical)
    }

    /// Names of numeric columns in discovery order
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.numeric().map(|(name, _)| name).collect()
    }

    /// Names of categorical columns in discovery order
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.categorical().map(|(name, _)| name).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

struct NamedEntries<'a, V>(Vec<(&'a str, &'a V)>);

impl<V: Serialize> Serialize for NamedEntries<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, profile) in &self.0 {
            map.serialize_entry(name, profile)?;
        }
        map.end()
    }
}

// {"numeric": {...}, "categorical": {...}} を列の出現順で出力する
impl Serialize for Profiles {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("numeric", &NamedEntries(self.numeric().collect()))?;
        map.serialize_entry("categorical", &NamedEntries(self.categorical().collect()))?;
        map.end()
    }
}

/// Recomputes every column profile for a dataset.
///
/// Call once per dataset replacement. An empty dataset (no rows) has no
/// profiles, even when its header is known.
pub fn recompute_profiles(dataset: &Dataset, config: &InsightConfig) -> Profiles {
    if dataset.is_empty() {
        return Profiles::default();
    }

    let profile = |name: &String| {
        let values = dataset.column_values(name);
        profile_column(name, &values, config)
    };

    let columns: Vec<ColumnProfile> = if config.parallel {
        dataset.columns().par_iter().map(profile).collect()
    } else {
        dataset.columns().iter().map(profile).collect()
    };

    log::info!(
        "profiled {} columns over {} rows",
        columns.len(),
        dataset.row_count()
    );
    Profiles::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InsightConfig {
        InsightConfig::default()
    }

    #[test]
    fn test_classification_boundary() {
        assert_eq!(ColumnClass::from_counts(4, 5, 0.8), ColumnClass::Numeric);
        assert_eq!(ColumnClass::from_counts(8, 10, 0.8), ColumnClass::Numeric);
        assert_eq!(
            ColumnClass::from_counts(79_999, 100_000, 0.8),
            ColumnClass::Categorical
        );
        assert_eq!(ColumnClass::from_counts(0, 0, 0.8), ColumnClass::Categorical);
    }

    #[test]
    fn test_three_of_four_is_categorical() {
        assert_eq!(classify(&["1", "2", "3", "x"], 0.8), ColumnClass::Categorical);
        assert_eq!(classify(&["1", "2", "3", "4", "x"], 0.8), ColumnClass::Numeric);
    }

    #[test]
    fn test_comma_only_cell_counts_as_zero() {
        let values = ["1", "2", "3", ","];
        assert_eq!(classify(&values, 0.8), ColumnClass::Numeric);

        let p = numeric_profile(&values, &InsightConfig::default());
        assert_eq!(p.count, 4);
        assert_eq!(p.min, 0.0);
        assert_eq!(p.mean, 1.5);
    }

    #[test]
    fn test_empty_values_do_not_count() {
        assert_eq!(classify(&["1", "", "  ", "2"], 0.8), ColumnClass::Numeric);
        assert_eq!(classify(&["", " "], 0.8), ColumnClass::Categorical);
    }

    #[test]
    fn test_numeric_profile_values() {
        let p = numeric_profile(&["1", "2", "3"], &config());
        assert_eq!(p.count, 3);
        assert_eq!(p.mean, 2.0);
        assert_eq!(p.median, 2.0);
        assert_eq!(p.min, 1.0);
        assert_eq!(p.max, 3.0);
        assert_eq!(p.stdev, 0.816497);
        assert_eq!(p.sample, vec![1.0, 2.0, 3.0]);
        assert_eq!(p.histogram.len(), 12);
    }

    #[test]
    fn test_numeric_profile_drops_non_finite_and_words() {
        let p = numeric_profile(&["1,000", "Infinity", "2,000", "n/a", "3000"], &config());
        assert_eq!(p.count, 3);
        assert_eq!(p.mean, 2000.0);
        assert_eq!(p.sample, vec![1000.0, 2000.0, 3000.0]);
    }

    #[test]
    fn test_sample_is_capped() {
        let raw: Vec<String> = (0..6000).map(|i| i.to_string()).collect();
        let values: Vec<&str> = raw.iter().map(String::as_str).collect();
        let p = numeric_profile(&values, &config());
        assert_eq!(p.count, 6000);
        assert_eq!(p.sample.len(), 5000);
        assert_eq!(p.sample[4999], 4999.0);
    }

    #[test]
    fn test_categorical_ordering() {
        let p = categorical_profile(&["b", "a", "c", "a", "b", "d"], &config());
        assert_eq!(p.unique_count, 4);
        let order: Vec<(&str, usize)> = p.top.iter().map(|v| (v.value.as_str(), v.count)).collect();
        assert_eq!(order, vec![("b", 2), ("a", 2), ("c", 1), ("d", 1)]);
    }

    #[test]
    fn test_categorical_top_is_capped() {
        let raw: Vec<String> = (0..30).map(|i| format!("v{}", i)).collect();
        let values: Vec<&str> = raw.iter().map(String::as_str).collect();
        let p = categorical_profile(&values, &config());
        assert_eq!(p.unique_count, 30);
        assert_eq!(p.top.len(), 20);
        assert_eq!(p.top[0].value, "v0");
    }

    #[test]
    fn test_empty_key_mapping() {
        let p = categorical_profile(&["", "x", ""], &config());
        assert_eq!(p.top[0].value, EMPTY_KEY);
        assert_eq!(p.top[0].count, 2);
    }

    #[test]
    fn test_recompute_profiles_end_to_end() {
        let ds = Dataset::from_records(
            vec!["a".into(), "b".into()],
            vec![
                vec!["1".into(), "cat".into()],
                vec!["2".into(), "dog".into()],
                vec!["3".into(), "cat".into()],
            ],
        );
        let profiles = recompute_profiles(&ds, &config());

        let a = profiles.numeric_profile("a").unwrap();
        assert_eq!((a.count, a.mean, a.median, a.min, a.max), (3, 2.0, 2.0, 1.0, 3.0));
        assert!((a.stdev - 0.8165).abs() < 1e-4);

        let b = profiles.categorical_profile("b").unwrap();
        assert_eq!(b.unique_count, 2);
        assert_eq!(
            b.top,
            vec![
                ValueCount { value: "cat".into(), count: 2 },
                ValueCount { value: "dog".into(), count: 1 },
            ]
        );
        assert_eq!(profiles.numeric_columns(), vec!["a"]);
        assert_eq!(profiles.categorical_columns(), vec!["b"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let ds = Dataset::from_records(
            vec!["n".into(), "c".into(), "m".into()],
            (0..200).map(|i| vec![i.to_string(), format!("k{}", i % 7), format!("{}.5", i % 13)]),
        );
        let mut seq = config();
        seq.parallel = false;
        assert_eq!(recompute_profiles(&ds, &config()), recompute_profiles(&ds, &seq));
    }

    #[test]
    fn test_empty_dataset_has_no_profiles() {
        let ds = Dataset::new(vec!["a".into(), "b".into()]);
        assert!(recompute_profiles(&ds, &config()).is_empty());
    }

    #[test]
    fn test_profiles_serialize_in_column_order() {
        let ds = Dataset::from_records(
            vec!["z".into(), "label".into(), "a".into()],
            vec![vec!["1".into(), "x".into(), "2".into()]],
        );
        let json = serde_json::to_value(recompute_profiles(&ds, &config())).unwrap();
        let text = serde_json::to_string(&recompute_profiles(&ds, &config())).unwrap();
        assert!(text.find("\"z\"").unwrap() < text.find("\"a\"").unwrap());
        assert_eq!(json["categorical"]["label"]["uniqueCount"], 1);
        assert_eq!(json["numeric"]["a"]["count"], 1);
    }
}
