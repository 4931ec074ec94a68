//! Pairwise Pearson correlation over numeric columns

use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::descriptive::{mean, parse_finite};
use crate::config::InsightConfig;
use crate::dataset::Dataset;

/// Pearson correlation coefficient of two equally long samples.
///
/// Returns 0 for empty or mismatched inputs. When the product of the two
/// sums of squared deviations is 0 (a zero-variance side) the denominator is
/// taken as 1, which makes the result 0 as well.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.is_empty() || x.len() != y.len() {
        return 0.0;
    }

    let (Some(mean_x), Some(mean_y)) = (mean(x), mean(y)) else {
        return 0.0;
    };

    let mut numerator = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        numerator += (xi - mean_x) * (yi - mean_y);
        sum_sq_x += (xi - mean_x).powi(2);
        sum_sq_y += (yi - mean_y).powi(2);
    }

    let product = sum_sq_x * sum_sq_y;
    let denominator = if product == 0.0 { 1.0 } else { product }.sqrt();
    (numerator / denominator).clamp(-1.0, 1.0)
}

/// Square matrix of coefficients keyed by column name
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Columns in matrix order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row-major coefficients
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Coefficient for the ordered pair `(a, b)`
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

struct MatrixRow<'a> {
    columns: &'a [String],
    values: &'a [f64],
}

impl Serialize for MatrixRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for CorrelationMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, row) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(
                name,
                &MatrixRow {
                    columns: &self.columns,
                    values: row,
                },
            )?;
        }
        map.end()
    }
}

/// Coefficient for one ordered column pair, from rows where both parse
fn pair_coefficient(a: &[Option<f64>], b: &[Option<f64>], min_paired: usize) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();

    if xs.len() < min_paired {
        return 0.0;
    }
    pearson(&xs, &ys)
}

/// Builds the correlation matrix for the first `correlation_max_columns`
/// names in `columns`.
///
/// Every ordered pair, the diagonal included, is computed on its own from
/// the rows where both cells hold finite numbers; fewer than
/// `min_paired_observations` such rows give 0. Unknown columns read as
/// empty and therefore correlate as 0.
pub fn correlation_matrix<S: AsRef<str>>(
    dataset: &Dataset,
    columns: &[S],
    config: &InsightConfig,
) -> CorrelationMatrix {
    let columns: Vec<String> = columns
        .iter()
        .take(config.correlation_max_columns)
        .map(|c| c.as_ref().to_string())
        .collect();

    let parsed: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| {
            dataset
                .column_values(c)
                .into_iter()
                .map(parse_finite)
                .collect()
        })
        .collect();

    let min_paired = config.min_paired_observations;
    let row_for = |a: &Vec<Option<f64>>| -> Vec<f64> {
        parsed
            .iter()
            .map(|b| pair_coefficient(a, b, min_paired))
            .collect()
    };

    let values: Vec<Vec<f64>> = if config.parallel {
        parsed.par_iter().map(row_for).collect()
    } else {
        parsed.iter().map(row_for).collect()
    };

    log::debug!("correlation matrix computed for {} columns", columns.len());
    CorrelationMatrix { columns, values }
}
