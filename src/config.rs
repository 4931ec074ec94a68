//! Configuration for the profiling pipeline
//!
//! Every cap and threshold the pipeline uses lives in [`InsightConfig`]. The
//! defaults reproduce the fixed constants of the dashboard this engine feeds
//! (10 000 rows, 10 charts, 12 histogram bins), so most callers never load a
//! file at all.
//!
//! Configuration files may be TOML or YAML:
//!
//! ```toml
//! max_rows = 5000
//! max_charts = 6
//! parallel = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Hard cap on rows retained and analyzed
pub const MAX_ROWS: usize = 10_000;
/// Cap on emitted chart specs
pub const MAX_CHARTS: usize = 10;
/// Rows per "load more" page in the preview table (UI only)
pub const PREVIEW_CHUNK: usize = 200;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "INSIGHTRS_CONFIG";

/// Tunable limits for ingestion, profiling and chart selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Maximum rows kept from a source
    pub max_rows: usize,
    /// Maximum chart specs produced by the selector
    pub max_charts: usize,
    /// Bins per numeric histogram
    pub histogram_bins: usize,
    /// Raw numeric values kept per numeric profile
    pub sample_size: usize,
    /// Categories kept in a categorical profile's `top` list
    pub top_categories: usize,
    /// Minimum share of numeric values for a column to be numeric
    pub numeric_ratio: f64,
    /// Columns considered by the correlation engine
    pub correlation_max_columns: usize,
    /// Paired observations needed before a coefficient is computed
    pub min_paired_observations: usize,
    /// Distinct values kept per pivot axis
    pub pivot_axis_limit: usize,
    /// Rows per batch delivered by the streaming reader
    pub chunk_rows: usize,
    /// Profile columns and correlation rows on the rayon pool
    pub parallel: bool,
    /// Preview page size, carried for UI collaborators
    pub preview_chunk: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        InsightConfig {
            max_rows: MAX_ROWS,
            max_charts: MAX_CHARTS,
            histogram_bins: 12,
            sample_size: 5000,
            top_categories: 20,
            numeric_ratio: 0.8,
            correlation_max_columns: 10,
            min_paired_observations: 5,
            pivot_axis_limit: 25,
            chunk_rows: 1000,
            parallel: true,
            preview_chunk: PREVIEW_CHUNK,
        }
    }
}

impl InsightConfig {
    /// Parses a TOML document, filling absent keys with defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: InsightConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a YAML document, filling absent keys with defaults
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: InsightConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file; the format is chosen by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(Error::Io)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("toml") => Self::from_toml_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Err(Error::Config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// Resolves the active configuration.
    ///
    /// Looks at `$INSIGHTRS_CONFIG` first, then `<config dir>/insightrs/config.toml`,
    /// and falls back to the defaults when neither exists.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            log::info!("loading config from ${} = {}", CONFIG_ENV_VAR, path);
            return Self::from_file(path);
        }

        if let Some(path) = Self::default_path().filter(|p| p.is_file()) {
            log::info!("loading config from {}", path.display());
            return Self::from_file(path);
        }

        Ok(Self::default())
    }

    /// Per-user config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("insightrs").join("config.toml"))
    }

    /// Rejects settings the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_rows", self.max_rows),
            ("max_charts", self.max_charts),
            ("histogram_bins", self.histogram_bins),
            ("sample_size", self.sample_size),
            ("top_categories", self.top_categories),
            ("correlation_max_columns", self.correlation_max_columns),
            ("pivot_axis_limit", self.pivot_axis_limit),
            ("chunk_rows", self.chunk_rows),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", name)));
            }
        }

        if !(self.numeric_ratio > 0.0 && self.numeric_ratio <= 1.0) {
            return Err(Error::Config(format!(
                "numeric_ratio must be in (0, 1], got {}",
                self.numeric_ratio
            )));
        }

        Ok(())
    }
}

/// Builder for InsightConfig
pub struct InsightConfigBuilder {
    config: InsightConfig,
}

impl InsightConfigBuilder {
    /// Creates a new builder
    pub fn new() -> Self {
        InsightConfigBuilder {
            config: InsightConfig::default(),
        }
    }

    /// Sets the row cap
    pub fn max_rows(mut self, rows: usize) -> Self {
        self.config.max_rows = rows;
        self
    }

    /// Sets the chart cap
    pub fn max_charts(mut self, charts: usize) -> Self {
        self.config.max_charts = charts;
        self
    }

    /// Sets the histogram bin count
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.config.histogram_bins = bins;
        self
    }

    /// Sets the streaming batch size
    pub fn chunk_rows(mut self, rows: usize) -> Self {
        self.config.chunk_rows = rows;
        self
    }

    /// Sets the numeric classification threshold
    pub fn numeric_ratio(mut self, ratio: f64) -> Self {
        self.config.numeric_ratio = ratio;
        self
    }

    /// Enables or disables rayon
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Validates and builds the config
    pub fn build(self) -> Result<InsightConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for InsightConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
