//! Chart selection and rendering
//!
//! - [`spec`]: declarative chart specs, the automatic selector and the deck
//!   of per-id kind overrides
//! - [`data`]: resolution of a spec into renderer-ready series
//! - [`ascii`]: terminal rendering of resolved chart data

pub mod ascii;
pub mod data;
pub mod spec;

pub use self::ascii::{render_chart_data, render_pivot, Chart, ChartConfig, ChartStyle};
pub use self::data::{chart_data, ChartData, Series};
pub use self::spec::{select_charts, ChartDeck, ChartKind, ChartSpec, Operands};
