//! The current analysis and the queries run against it
//!
//! An [`InsightSession`] holds one dataset snapshot together with everything
//! derived from it. Loading a new source replaces the whole analysis at once;
//! a failed load leaves the previous one in place.

use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::config::InsightConfig;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::io::{check_extension, ChunkedCsvReader, CsvStream, IngestProgress};
use crate::pivot::{pivot, PivotTable};
use crate::stats::{correlation_matrix, recompute_profiles, CorrelationMatrix, Profiles};
use crate::vis::{chart_data, ChartData, ChartDeck, ChartKind};

/// Summary of one successful load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub source: String,
    pub rows: usize,
    pub columns: usize,
    pub batches: usize,
    /// Rows dropped after the row cap
    pub discarded_rows: usize,
    pub capped: bool,
}

/// Serializable output of an analysis
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub dataset: &'a Dataset,
    pub columns: &'a [String],
    pub row_count: usize,
    pub profiles: &'a Profiles,
    pub chart_specs: &'a ChartDeck,
}

#[derive(Debug, Clone, Default)]
struct Analysis {
    source: Option<String>,
    dataset: Arc<Dataset>,
    profiles: Profiles,
    deck: ChartDeck,
}

/// One dataset at a time, with its profiles and charts
#[derive(Debug, Clone, Default)]
pub struct InsightSession {
    config: InsightConfig,
    analysis: Analysis,
}

impl InsightSession {
    pub fn new(config: InsightConfig) -> Self {
        InsightSession {
            config,
            analysis: Analysis::default(),
        }
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Name of the loaded source, if any
    pub fn source(&self) -> Option<&str> {
        self.analysis.source.as_deref()
    }

    /// Shared handle to the current snapshot
    pub fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(&self.analysis.dataset)
    }

    pub fn profiles(&self) -> &Profiles {
        &self.analysis.profiles
    }

    pub fn charts(&self) -> &ChartDeck {
        &self.analysis.deck
    }

    /// Loads a `.csv` file through the background reader
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadSummary> {
        self.load_path_with(path, |_| {})
    }

    /// Like [`load_path`](Self::load_path), reporting each batch as it lands
    pub fn load_path_with<P, F>(&mut self, path: P, on_batch: F) -> Result<LoadSummary>
    where
        P: AsRef<Path>,
        F: FnMut(&IngestProgress),
    {
        let path = path.as_ref();
        let stream = ChunkedCsvReader::from_config(&self.config).open(path)?;
        self.ingest(path.display().to_string(), stream, on_batch)
    }

    /// Loads any byte source; `name` must carry the `.csv` extension
    pub fn load_reader<R>(&mut self, name: &str, source: R) -> Result<LoadSummary>
    where
        R: Read + Send + 'static,
    {
        check_extension(name)?;
        let stream = ChunkedCsvReader::from_config(&self.config).spawn(source);
        self.ingest(name.to_string(), stream, |_| {})
    }

    /// Loads CSV text already in memory
    pub fn load_str(&mut self, name: &str, text: &str) -> Result<LoadSummary> {
        self.load_reader(name, std::io::Cursor::new(text.as_bytes().to_vec()))
    }

    fn ingest<F>(&mut self, source: String, stream: CsvStream, on_batch: F) -> Result<LoadSummary>
    where
        F: FnMut(&IngestProgress),
    {
        let outcome = stream.collect_with(self.config.max_rows, on_batch).map_err(|e| {
            log::error!("failed to load '{}': {}", source, e);
            e
        })?;

        let summary = LoadSummary {
            source: source.clone(),
            rows: outcome.dataset.row_count(),
            columns: outcome.dataset.column_count(),
            batches: outcome.batches,
            discarded_rows: outcome.discarded_rows,
            capped: outcome.cancelled,
        };
        self.install(source, outcome.dataset);
        Ok(summary)
    }

    /// Replaces the analysis with a freshly profiled dataset
    fn install(&mut self, source: String, dataset: Dataset) {
        let profiles = recompute_profiles(&dataset, &self.config);
        let deck = ChartDeck::generate(
            &profiles,
            self.config.max_charts,
            self.config.correlation_max_columns,
        );
        log::info!(
            "loaded '{}': {} rows, {} charts suggested",
            source,
            dataset.row_count(),
            deck.len()
        );
        self.analysis = Analysis {
            source: Some(source),
            dataset: Arc::new(dataset),
            profiles,
            deck,
        };
    }

    /// Analyses a dataset built elsewhere
    pub fn load_dataset(&mut self, name: &str, dataset: Dataset) {
        self.install(name.to_string(), dataset);
    }

    /// Drops the current analysis
    pub fn reset(&mut self) {
        self.analysis = Analysis::default();
    }

    /// Output contract for the current analysis.
    ///
    /// `columns` comes from the first row, so it is empty when no rows were
    /// loaded even if the header was.
    pub fn report(&self) -> Report<'_> {
        let dataset = self.analysis.dataset.as_ref();
        let columns: &[String] = if dataset.is_empty() {
            &[]
        } else {
            dataset.columns()
        };
        Report {
            dataset,
            columns,
            row_count: dataset.row_count(),
            profiles: &self.analysis.profiles,
            chart_specs: &self.analysis.deck,
        }
    }

    /// Pearson matrix over the given columns (first ten kept)
    pub fn correlation_matrix<S: AsRef<str>>(&self, columns: &[S]) -> CorrelationMatrix {
        correlation_matrix(&self.analysis.dataset, columns, &self.config)
    }

    /// Pearson matrix over the leading numeric columns, when there are two
    pub fn numeric_correlation(&self) -> Option<CorrelationMatrix> {
        let numeric = self.analysis.profiles.numeric_columns();
        if numeric.len() < 2 {
            return None;
        }
        Some(self.correlation_matrix(numeric.as_slice()))
    }

    /// Frequency cross-tabulation of two columns
    pub fn pivot(&self, col_a: &str, col_b: &str) -> PivotTable {
        pivot(&self.analysis.dataset, col_a, col_b, &self.config)
    }

    /// Renderer-ready data for a chart in the deck
    pub fn chart_data(&self, id: &str) -> Result<Option<ChartData>> {
        let spec = self
            .analysis
            .deck
            .get(id)
            .ok_or_else(|| Error::ChartNotFound(id.to_string()))?;
        Ok(chart_data(
            spec,
            &self.analysis.dataset,
            &self.analysis.profiles,
            &self.config,
        ))
    }

    /// Shows one chart as a different kind
    pub fn set_chart_kind(&mut self, id: &str, kind: ChartKind) -> Result<()> {
        self.analysis.deck.set_kind(id, kind)
    }

    /// Reruns chart selection, discarding kind overrides
    pub fn regenerate_charts(&mut self) {
        self.analysis.deck.regenerate(
            &self.analysis.profiles,
            self.config.max_charts,
            self.config.correlation_max_columns,
        );
    }
}
