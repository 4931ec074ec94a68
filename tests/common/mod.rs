//! Common test utilities module
//!
//! - Temporary CSV files with automatic cleanup
//! - Test data generation

#![allow(dead_code)]

use std::io::Write;
use tempfile::{Builder, NamedTempFile};

/// Writes `text` to a temporary file ending in `extension`
pub fn temp_file(text: &[u8], extension: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .prefix("insightrs_test_")
        .suffix(extension)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(text).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Writes CSV text to a temporary `.csv` file
pub fn temp_csv(text: &str) -> NamedTempFile {
    temp_file(text.as_bytes(), ".csv")
}

/// Builds CSV text from a header and rows
pub fn csv_text(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut text = headers.join(",");
    text.push('\n');
    for row in rows {
        text.push_str(&row.join(","));
        text.push('\n');
    }
    text
}

/// `rows` rows of `id,value,group` with a numeric id, a derived value and
/// three rotating groups
pub fn sales_csv(rows: usize) -> String {
    let data: Vec<Vec<String>> = (0..rows)
        .map(|i| {
            vec![
                i.to_string(),
                format!("{:.2}", i as f64 * 1.5 + 3.0),
                ["north", "south", "east"][i % 3].to_string(),
            ]
        })
        .collect();
    csv_text(&["id", "value", "group"], &data)
}
