// 記述統計モジュール

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 10進数表記: 符号、小数部、指数部は任意
    static ref DECIMAL: Regex =
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").unwrap();
    static ref RADIX: Regex = Regex::new(r"^0(?:[xX][0-9a-fA-F]+|[oO][0-7]+|[bB][01]+)$").unwrap();
    static ref INFINITY: Regex = Regex::new(r"^[+-]?Infinity$").unwrap();
}

/// Parses a raw cell as a number.
///
/// A blank cell is not a number. Otherwise thousands-separator commas are
/// stripped and whitespace is trimmed; a cell made only of commas reads as
/// `0`. Accepted forms are decimal literals (`12`, `-3.5`, `.5`, `1e3`),
/// `0x`/`0o`/`0b` integer literals and `Infinity` with an optional sign.
/// The result may be infinite; callers that need finite values filter them
/// out.
pub fn parse_number(raw: &str) -> Option<f64> {
    if raw.trim().is_empty() {
        return None;
    }
    let cleaned = raw.replace(',', "");
    let s = cleaned.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    if DECIMAL.is_match(s) {
        return s.parse::<f64>().ok();
    }

    if RADIX.is_match(s) {
        let radix = match s.as_bytes()[1] {
            b'x' | b'X' => 16,
            b'o' | b'O' => 8,
            _ => 2,
        };
        let value = s[2..].chars().fold(0.0_f64, |acc, c| {
            acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64
        });
        return Some(value);
    }

    if INFINITY.is_match(s) {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    None
}

/// Whether a raw cell reads as a number under [`parse_number`]
pub fn is_numeric(raw: &str) -> bool {
    parse_number(raw).is_some()
}

/// Finite numeric value of a raw cell, if any
pub fn parse_finite(raw: &str) -> Option<f64> {
    parse_number(raw).filter(|v| v.is_finite())
}

/// 算術平均
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Median of the values; even lengths average the two middle elements
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = sorted.len();
    let mid = count / 2;
    if count % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// 母標準偏差（nで割る）
pub fn population_stdev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let sum_squared_diff = data.iter().map(|&x| (x - m).powi(2)).sum::<f64>();
    Some((sum_squared_diff / data.len() as f64).sqrt())
}

/// Smallest and largest value; `(+inf, -inf)` for an empty slice
pub fn min_max(data: &[f64]) -> (f64, f64) {
    data.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        })
}

/// Rounds to a fixed number of decimal digits through decimal formatting,
/// so `0.8164965809` becomes exactly the double nearest `0.816497`
pub fn round_to(value: f64, digits: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", digits, value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("  -3.5 "), Some(-3.5));
        assert_eq!(parse_number("1,234,567"), Some(1234567.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("5."), Some(5.0));
        assert_eq!(parse_number("+7"), Some(7.0));
        assert_eq!(parse_number("0x1F"), Some(31.0));
        assert_eq!(parse_number("0b101"), Some(5.0));
        assert_eq!(parse_number("0o17"), Some(15.0));
        assert_eq!(parse_number("-Infinity"), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_parse_number_rejects() {
        for raw in ["", "   ", "abc", "1.2.3", "NaN", "inf", "12px", "-0x10", "1 2"] {
            assert_eq!(parse_number(raw), None, "{:?} should not parse", raw);
        }
    }

    #[test]
    fn test_comma_only_cell_reads_as_zero() {
        assert_eq!(parse_number(","), Some(0.0));
        assert_eq!(parse_number(" ,, "), Some(0.0));
        assert_eq!(parse_number(", ,"), Some(0.0));
        assert_eq!(parse_finite("5 ,"), Some(5.0));
    }

    #[test]
    fn test_parse_finite_drops_infinity() {
        assert!(is_numeric("Infinity"));
        assert_eq!(parse_finite("Infinity"), None);
        assert_eq!(parse_finite("1e400"), None);
        assert_eq!(parse_finite("2"), Some(2.0));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(median(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_population_stdev() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_stdev(&data).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(population_stdev(&[5.0]), Some(0.0));
        assert_eq!(population_stdev(&[]), None);
    }

    #[test]
    fn test_mean_and_min_max() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(min_max(&[3.0, -1.0, 8.0]), (-1.0, 8.0));
        assert_eq!(min_max(&[]), (f64::INFINITY, f64::NEG_INFINITY));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.816496580927726, 6), 0.816497);
        assert_eq!(round_to(2.0, 6), 2.0);
        assert_eq!(round_to(-1.23456789, 2), -1.23);
    }
}
