//! Resolution of chart specs into renderer-ready series

use serde::Serialize;

use super::spec::{ChartKind, ChartSpec, Operands};
use crate::config::InsightConfig;
use crate::dataset::Dataset;
use crate::stats::{
    correlation_matrix, descriptive::round_to, parse_finite, CorrelationMatrix, HistogramBin,
    Profiles, ValueCount,
};

/// Categories shown by a bar chart
pub const BAR_CATEGORIES: usize = 12;
/// Slices shown by a pie or donut chart
pub const PIE_SLICES: usize = 8;
/// Categories shown when a spec falls back to a bar chart
pub const FALLBACK_CATEGORIES: usize = 10;
/// Points plotted by a scatter chart
pub const SCATTER_POINTS: usize = 2000;

/// Labelled counts, one per bar or slice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
}

impl Series {
    fn from_histogram(label: &str, histogram: &[HistogramBin]) -> Self {
        Series {
            label: label.to_string(),
            labels: histogram.iter().map(bin_label).collect(),
            counts: histogram.iter().map(|b| b.count).collect(),
        }
    }

    fn from_top(label: &str, top: &[ValueCount], limit: usize) -> Self {
        let top = &top[..top.len().min(limit)];
        Series {
            label: label.to_string(),
            labels: top.iter().map(|t| t.value.clone()).collect(),
            counts: top.iter().map(|t| t.count).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Data behind one rendered chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "render", rename_all = "camelCase")]
pub enum ChartData {
    /// Vertical bars; histograms and categorical bars both land here
    Bars(Series),
    /// Proportional slices
    Slices { series: Series, donut: bool },
    /// Paired numeric points
    Points {
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
    },
    /// Pearson coefficients over the spec's columns
    Heatmap(CorrelationMatrix),
}

/// `"start–end"` with each edge rounded to two decimals
pub fn bin_label(bin: &HistogramBin) -> String {
    format!("{}–{}", round_to(bin.bin_start, 2), round_to(bin.bin_end, 2))
}

/// Resolves a spec against the current analysis.
///
/// The spec's kind picks the layout when its columns fit it. Otherwise the
/// first column falls back to its histogram (numeric) or its top categories
/// as bars (categorical). `None` means nothing can be drawn, for example
/// when the column is unknown.
pub fn chart_data(
    spec: &ChartSpec,
    dataset: &Dataset,
    profiles: &Profiles,
    config: &InsightConfig,
) -> Option<ChartData> {
    let operands = spec.operands();
    let primary = operands.primary();

    let direct = match (spec.kind, &operands) {
        (ChartKind::Histogram, _) => primary
            .and_then(|c| profiles.numeric_profile(c).map(|p| (c, p)))
            .map(|(c, p)| ChartData::Bars(Series::from_histogram(c, &p.histogram))),
        (ChartKind::Bar, _) => primary
            .and_then(|c| profiles.categorical_profile(c).map(|p| (c, p)))
            .map(|(c, p)| ChartData::Bars(Series::from_top(c, &p.top, BAR_CATEGORIES))),
        (ChartKind::Pie | ChartKind::Donut, _) => primary
            .and_then(|c| profiles.categorical_profile(c).map(|p| (c, p)))
            .map(|(c, p)| ChartData::Slices {
                series: Series::from_top(c, &p.top, PIE_SLICES),
                donut: spec.kind == ChartKind::Donut,
            }),
        (ChartKind::Scatter, Operands::Pair { x, y }) => {
            if profiles.numeric_profile(x).is_some() && profiles.numeric_profile(y).is_some() {
                Some(scatter_points(dataset, x, y))
            } else {
                None
            }
        }
        (ChartKind::Corr, _) => {
            let cols = operands.columns();
            if cols.len() >= 2 {
                Some(ChartData::Heatmap(correlation_matrix(dataset, cols.as_slice(), config)))
            } else {
                None
            }
        }
        _ => None,
    };

    direct.or_else(|| fallback(primary?, profiles))
}

fn fallback(column: &str, profiles: &Profiles) -> Option<ChartData> {
    if let Some(p) = profiles.numeric_profile(column) {
        return Some(ChartData::Bars(Series::from_histogram(column, &p.histogram)));
    }
    profiles
        .categorical_profile(column)
        .map(|p| ChartData::Bars(Series::from_top(column, &p.top, FALLBACK_CATEGORIES)))
}

fn scatter_points(dataset: &Dataset, x: &str, y: &str) -> ChartData {
    let xs = dataset.column_values(x);
    let ys = dataset.column_values(y);
    let points = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(a, b)| Some((parse_finite(a)?, parse_finite(b)?)))
        .take(SCATTER_POINTS)
        .collect();

    ChartData::Points {
        x_label: x.to_string(),
        y_label: y.to_string(),
        points,
    }
}
