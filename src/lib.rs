//! insightrs: automatic profiling and chart suggestions for CSV data
//!
//! A CSV source is ingested (optionally on a background thread in row
//! batches) into an immutable [`Dataset`] capped at [`MAX_ROWS`] rows. Every
//! column is classified as numeric or categorical and summarized, and a
//! capped list of declarative [`ChartSpec`]s is chosen from the summaries.
//! Correlation matrices, pivot tables and chart data are computed on demand.
//!
//! ```no_run
//! use insightrs::{InsightConfig, InsightSession};
//!
//! let mut session = InsightSession::new(InsightConfig::load()?);
//! session.load_path("sales.csv")?;
//! println!("{}", serde_json::to_string_pretty(&session.report())?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// 特定の警告を無効化
#![allow(clippy::needless_return)]
#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod pivot;
pub mod session;
pub mod stats;
pub mod vis;

// Re-export commonly used types
pub use config::{InsightConfig, InsightConfigBuilder, MAX_CHARTS, MAX_ROWS, PREVIEW_CHUNK};
pub use dataset::{Dataset, Row};
pub use error::{Error, Result};
pub use io::{read_csv, read_csv_str, ChunkedCsvReader};
pub use pivot::{pivot, PivotTable};
pub use session::{InsightSession, LoadSummary, Report};
pub use stats::{recompute_profiles, ColumnProfile, CorrelationMatrix, Profiles};
pub use vis::{chart_data, select_charts, ChartData, ChartDeck, ChartKind, ChartSpec};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
