//! Text-based chart rendering
//!
//! Draws resolved [`ChartData`] and pivot tables as ASCII/Unicode text for
//! terminal output.

mod charts;

pub use charts::{BarChart, Heatmap, PieChart, ScatterPlot};

use super::data::ChartData;
use crate::pivot::PivotTable;

/// Chart rendering trait
pub trait Chart {
    /// Render the chart to a string
    fn render(&self) -> String;

    /// Render to stdout
    fn display(&self) {
        println!("{}", self.render());
    }
}

/// Common chart configuration
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Chart width in characters
    pub width: usize,
    /// Chart height in characters
    pub height: usize,
    /// Show axis labels
    pub show_labels: bool,
    /// Title for the chart
    pub title: Option<String>,
    /// Chart style
    pub style: ChartStyle,
    /// Max label width
    pub label_width: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 20,
            show_labels: true,
            title: None,
            style: ChartStyle::Unicode,
            label_width: 14,
        }
    }
}

impl ChartConfig {
    /// Same configuration with a title
    pub fn titled(&self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self.clone()
        }
    }

    pub(crate) fn bar_char(&self) -> char {
        match self.style {
            ChartStyle::Ascii => '#',
            ChartStyle::Unicode => '█',
        }
    }

    pub(crate) fn title_line(&self, output: &mut String) {
        if let Some(ref title) = self.title {
            output.push_str(&format!("{:^width$}\n\n", title, width = self.width));
        }
    }
}

/// Chart style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartStyle {
    /// Simple ASCII characters
    Ascii,
    /// Unicode block characters
    #[default]
    Unicode,
}

/// Renders resolved chart data with the matching chart type
pub fn render_chart_data(data: &ChartData, config: &ChartConfig) -> String {
    match data {
        ChartData::Bars(series) => BarChart::new(series, config.clone()).render(),
        ChartData::Slices { series, donut } => PieChart::new(series, *donut, config.clone()).render(),
        ChartData::Points {
            x_label,
            y_label,
            points,
        } => ScatterPlot::new(points, x_label, y_label, config.clone()).render(),
        ChartData::Heatmap(matrix) => Heatmap::correlation(matrix, config.clone()).render(),
    }
}

/// Renders a pivot table as a count grid
pub fn render_pivot(table: &PivotTable, config: &ChartConfig) -> String {
    Heatmap::pivot(table, config.clone()).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vis::data::Series;

    #[test]
    fn test_chart_config_default() {
        let config = ChartConfig::default();
        assert_eq!(config.width, 60);
        assert_eq!(config.height, 20);
        assert!(config.show_labels);
        assert_eq!(config.titled("t").title.as_deref(), Some("t"));
    }

    #[test]
    fn test_render_bars() {
        let data = ChartData::Bars(Series {
            label: "x".into(),
            labels: vec!["a".into(), "b".into()],
            counts: vec![3, 1],
        });
        let result = render_chart_data(&data, &ChartConfig::default());
        assert!(result.contains('█'));
        assert_eq!(result.lines().count(), 2);
    }
}
