//! Declarative chart specifications and the automatic chart selector
//!
//! The selector turns column profiles into an ordered, capped list of
//! [`ChartSpec`]s. It runs as a pipeline of independent stages (numeric
//! histograms, categorical bar/pie pairs, numeric scatter pairs, one
//! correlation matrix) that share a remaining-capacity counter; the first
//! stage to fill the deck ends selection, even halfway through a column.
//!
//! Specs carry no rendering state. Renderers key whatever chart objects they
//! create by [`ChartSpec::id`].

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::stats::Profiles;

/// Chart kinds a spec can be displayed as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Histogram,
    Line,
    Area,
    Bar,
    Stacked,
    Pie,
    Donut,
    Scatter,
    /// Correlation heatmap
    Corr,
}

impl ChartKind {
    /// Every kind, in the order a kind picker lists them
    pub const ALL: [ChartKind; 9] = [
        ChartKind::Histogram,
        ChartKind::Line,
        ChartKind::Area,
        ChartKind::Bar,
        ChartKind::Stacked,
        ChartKind::Pie,
        ChartKind::Donut,
        ChartKind::Scatter,
        ChartKind::Corr,
    ];

    /// 種類名を文字列で取得
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Bar => "bar",
            ChartKind::Stacked => "stacked",
            ChartKind::Pie => "pie",
            ChartKind::Donut => "donut",
            ChartKind::Scatter => "scatter",
            ChartKind::Corr => "corr",
        }
    }

    /// Columns a spec needs before it can be shown as this kind
    pub fn min_operands(&self) -> usize {
        match self {
            ChartKind::Scatter => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChartKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "correlation" | "correlation_matrix" => return Ok(ChartKind::Corr),
            "hist" => return Ok(ChartKind::Histogram),
            _ => {}
        }
        ChartKind::ALL
            .into_iter()
            .find(|k| k.name() == lowered)
            .ok_or_else(|| Error::UnknownChartKind(s.to_string()))
    }
}

impl Serialize for ChartKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Columns a spec is drawn from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operands {
    Column(String),
    Pair { x: String, y: String },
    Columns(Vec<String>),
}

impl Operands {
    /// Operand columns in order
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Operands::Column(c) => vec![c.as_str()],
            Operands::Pair { x, y } => vec![x.as_str(), y.as_str()],
            Operands::Columns(cols) => cols.iter().map(String::as_str).collect(),
        }
    }

    /// First operand, the one single-column kinds draw
    pub fn primary(&self) -> Option<&str> {
        self.columns().first().copied()
    }
}

/// One suggested chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    /// Stable identifier derived from the original kind and operands
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    #[serde(flatten)]
    pub operands: OperandFields,
}

/// Serialized operand layout: `colX`, `colY` and `cols` as applicable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperandFields {
    #[serde(rename = "colX", skip_serializing_if = "Option::is_none")]
    pub col_x: Option<String>,
    #[serde(rename = "colY", skip_serializing_if = "Option::is_none")]
    pub col_y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cols: Option<Vec<String>>,
}

impl From<Operands> for OperandFields {
    fn from(operands: Operands) -> Self {
        match operands {
            Operands::Column(c) => OperandFields {
                col_x: Some(c),
                col_y: None,
                cols: None,
            },
            Operands::Pair { x, y } => OperandFields {
                col_x: Some(x),
                col_y: Some(y),
                cols: None,
            },
            Operands::Columns(cols) => OperandFields {
                col_x: None,
                col_y: None,
                cols: Some(cols),
            },
        }
    }
}

impl OperandFields {
    /// Structured view of the operand fields
    pub fn operands(&self) -> Operands {
        if let Some(cols) = &self.cols {
            return Operands::Columns(cols.clone());
        }
        match (&self.col_x, &self.col_y) {
            (Some(x), Some(y)) => Operands::Pair {
                x: x.clone(),
                y: y.clone(),
            },
            (Some(x), None) => Operands::Column(x.clone()),
            (None, Some(y)) => Operands::Column(y.clone()),
            (None, None) => Operands::Columns(Vec::new()),
        }
    }
}

impl ChartSpec {
    fn new(id: String, kind: ChartKind, operands: Operands) -> Self {
        ChartSpec {
            id,
            kind,
            operands: operands.into(),
        }
    }

    pub fn histogram(col: &str) -> Self {
        Self::new(
            format!("hist_{}", col),
            ChartKind::Histogram,
            Operands::Column(col.to_string()),
        )
    }

    pub fn bar(col: &str) -> Self {
        Self::new(
            format!("bar_{}", col),
            ChartKind::Bar,
            Operands::Column(col.to_string()),
        )
    }

    pub fn pie(col: &str) -> Self {
        Self::new(
            format!("pie_{}", col),
            ChartKind::Pie,
            Operands::Column(col.to_string()),
        )
    }

    pub fn scatter(x: &str, y: &str) -> Self {
        Self::new(
            format!("scatter_{}_{}", x, y),
            ChartKind::Scatter,
            Operands::Pair {
                x: x.to_string(),
                y: y.to_string(),
            },
        )
    }

    pub fn correlation_matrix(cols: Vec<String>) -> Self {
        Self::new(
            "corr_matrix".to_string(),
            ChartKind::Corr,
            Operands::Columns(cols),
        )
    }

    pub fn operands(&self) -> Operands {
        self.operands.operands()
    }

    /// The same spec shown as another kind.
    ///
    /// Id, operands and therefore deck position are unchanged. Fails when
    /// the spec has fewer columns than the kind needs.
    pub fn with_kind(&self, kind: ChartKind) -> Result<Self> {
        if self.operands().columns().len() < kind.min_operands() {
            return Err(Error::InvalidChartKind {
                id: self.id.clone(),
                kind: kind.name().to_string(),
            });
        }
        Ok(ChartSpec {
            kind,
            ..self.clone()
        })
    }
}

/// Remaining-capacity counter shared by the selection stages
struct Deck {
    specs: Vec<ChartSpec>,
    capacity: usize,
}

impl Deck {
    fn is_full(&self) -> bool {
        self.specs.len() >= self.capacity
    }

    /// Takes specs from a stage until the deck is full
    fn fill<I: IntoIterator<Item = ChartSpec>>(&mut self, stage: I) {
        let room = self.capacity.saturating_sub(self.specs.len());
        self.specs.extend(stage.into_iter().take(room));
    }
}

/// Chooses up to `max_charts` specs from the profiles.
///
/// Order: one histogram per numeric column; bar then pie per categorical
/// column; a scatter per numeric pair `(i, j)` with `i < j`; finally, with
/// at least two numeric columns, one correlation matrix over the first
/// `corr_columns` numeric columns. Pure and deterministic.
pub fn select_charts(profiles: &Profiles, max_charts: usize, corr_columns: usize) -> Vec<ChartSpec> {
    let numeric = profiles.numeric_columns();
    let categorical = profiles.categorical_columns();

    let mut deck = Deck {
        specs: Vec::with_capacity(max_charts),
        capacity: max_charts,
    };

    deck.fill(numeric.iter().map(|c| ChartSpec::histogram(c)));

    deck.fill(
        categorical
            .iter()
            .flat_map(|c| [ChartSpec::bar(c), ChartSpec::pie(c)]),
    );

    deck.fill(numeric.iter().enumerate().flat_map(|(i, x)| {
        numeric[i + 1..]
            .iter()
            .map(move |y| ChartSpec::scatter(x, y))
    }));

    if numeric.len() >= 2 && !deck.is_full() {
        let cols = numeric
            .iter()
            .take(corr_columns)
            .map(|c| c.to_string())
            .collect();
        deck.fill(std::iter::once(ChartSpec::correlation_matrix(cols)));
    }

    deck.specs
}

/// The current chart list with per-id kind overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChartDeck {
    specs: Vec<ChartSpec>,
}

impl ChartDeck {
    /// Runs the selector over the profiles
    pub fn generate(profiles: &Profiles, max_charts: usize, corr_columns: usize) -> Self {
        ChartDeck {
            specs: select_charts(profiles, max_charts, corr_columns),
        }
    }

    /// Reruns the selector, dropping every kind override
    pub fn regenerate(&mut self, profiles: &Profiles, max_charts: usize, corr_columns: usize) {
        self.specs = select_charts(profiles, max_charts, corr_columns);
    }

    pub fn specs(&self) -> &[ChartSpec] {
        &self.specs
    }

    pub fn get(&self, id: &str) -> Option<&ChartSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    /// Shows one spec as a different kind, leaving all others untouched
    pub fn set_kind(&mut self, id: &str, kind: ChartKind) -> Result<()> {
        let slot = self
            .specs
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::ChartNotFound(id.to_string()))?;
        *slot = slot.with_kind(kind)?;
        log::debug!("chart '{}' now shown as {}", id, kind);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
