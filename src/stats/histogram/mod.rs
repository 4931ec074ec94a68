//! Fixed-bin histograms for numeric profiles

use serde::Serialize;

use super::descriptive::min_max;

/// One histogram bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub bin_start: f64,
    pub bin_end: f64,
    pub count: usize,
}

/// Buckets `data` into `bins` equal-width bins between its min and max.
///
/// A constant input collapses into a single `[min, max]` bin. The last bin's
/// upper edge is exactly `max`, and bucket indices are clamped so values
/// sitting on an edge after rounding still land in range. Bin counts always
/// sum to `data.len()`.
pub fn build_histogram(data: &[f64], bins: usize) -> Vec<HistogramBin> {
    if data.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (min, max) = min_max(data);
    if min == max {
        return vec![HistogramBin {
            bin_start: min,
            bin_end: max,
            count: data.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            bin_start: min + i as f64 * width,
            bin_end: if i == bins - 1 {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            count: 0,
        })
        .collect();

    for &value in data {
        // 負値やNaNはusizeへのキャストで0になる
        let idx = ((value - min) / width).floor() as usize;
        result[idx.min(bins - 1)].count += 1;
    }

    result
}
