//! Chart implementations for text-based visualization

use super::{Chart, ChartConfig, ChartStyle};
use crate::pivot::PivotTable;
use crate::stats::CorrelationMatrix;
use crate::vis::data::Series;

fn truncate_label(label: &str, width: usize) -> String {
    label.chars().take(width).collect()
}

// ============================================================================
// Bar Chart
// ============================================================================

/// Horizontal bar chart over labelled counts
#[derive(Debug, Clone)]
pub struct BarChart {
    labels: Vec<String>,
    counts: Vec<usize>,
    config: ChartConfig,
}

impl BarChart {
    pub fn new(series: &Series, config: ChartConfig) -> Self {
        Self {
            labels: series.labels.clone(),
            counts: series.counts.clone(),
            config,
        }
    }
}

impl Chart for BarChart {
    fn render(&self) -> String {
        if self.counts.is_empty() {
            return String::from("No data to display");
        }

        let mut output = String::new();
        let max_count = self.counts.iter().copied().max().unwrap_or(0);
        let label_width = self.config.label_width;
        let bar_width = self.config.width.saturating_sub(label_width + 10);
        let bar_char = self.config.bar_char();

        self.config.title_line(&mut output);

        for (label, &count) in self.labels.iter().zip(&self.counts) {
            let bar_len = if max_count > 0 {
                (count as f64 / max_count as f64 * bar_width as f64).round() as usize
            } else {
                0
            };
            let bar: String = std::iter::repeat(bar_char).take(bar_len).collect();

            output.push_str(&format!(
                "{:>label_width$} │{:<bar_width$}│ {}\n",
                truncate_label(label, label_width),
                bar,
                count,
                label_width = label_width,
                bar_width = bar_width
            ));
        }

        output
    }
}

// ============================================================================
// Pie Chart
// ============================================================================

/// Share of each category, drawn as percentage bars
#[derive(Debug, Clone)]
pub struct PieChart {
    labels: Vec<String>,
    counts: Vec<usize>,
    donut: bool,
    config: ChartConfig,
}

impl PieChart {
    pub fn new(series: &Series, donut: bool, config: ChartConfig) -> Self {
        Self {
            labels: series.labels.clone(),
            counts: series.counts.clone(),
            donut,
            config,
        }
    }

    fn slice_char(&self) -> char {
        match (self.config.style, self.donut) {
            (ChartStyle::Ascii, false) => '#',
            (ChartStyle::Ascii, true) => 'o',
            (ChartStyle::Unicode, false) => '█',
            (ChartStyle::Unicode, true) => '▒',
        }
    }
}

impl Chart for PieChart {
    fn render(&self) -> String {
        let total: usize = self.counts.iter().sum();
        if total == 0 {
            return String::from("No data to display");
        }

        let mut output = String::new();
        let label_width = self.config.label_width;
        let bar_width = self.config.width.saturating_sub(label_width + 12);
        let slice_char = self.slice_char();

        self.config.title_line(&mut output);

        // 表示中のスライスに対する割合
        for (label, &count) in self.labels.iter().zip(&self.counts) {
            let share = count as f64 / total as f64;
            let bar_len = (share * bar_width as f64).round() as usize;
            let bar: String = std::iter::repeat(slice_char).take(bar_len).collect();
            output.push_str(&format!(
                "{:>label_width$} │{:<bar_width$}│ {:>5.1}%\n",
                truncate_label(label, label_width),
                bar,
                share * 100.0,
                label_width = label_width,
                bar_width = bar_width
            ));
        }

        output
    }
}

// ============================================================================
// Scatter Plot
// ============================================================================

/// Point grid for two numeric columns
#[derive(Debug, Clone)]
pub struct ScatterPlot {
    points: Vec<(f64, f64)>,
    x_label: String,
    y_label: String,
    config: ChartConfig,
}

impl ScatterPlot {
    pub fn new(points: &[(f64, f64)], x_label: &str, y_label: &str, config: ChartConfig) -> Self {
        Self {
            points: points.to_vec(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            config,
        }
    }

    fn point_char(&self) -> char {
        match self.config.style {
            ChartStyle::Ascii => '*',
            ChartStyle::Unicode => '●',
        }
    }
}

fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

impl Chart for ScatterPlot {
    fn render(&self) -> String {
        let height = self.config.height.max(2);
        let width = self.config.width.max(10);
        if self.points.is_empty() {
            return String::from("No data to display");
        }

        let (x_min, x_max) = span(self.points.iter().map(|p| p.0));
        let (y_min, y_max) = span(self.points.iter().map(|p| p.1));
        let x_range = if (x_max - x_min).abs() < f64::EPSILON {
            1.0
        } else {
            x_max - x_min
        };
        let y_range = if (y_max - y_min).abs() < f64::EPSILON {
            1.0
        } else {
            y_max - y_min
        };

        let mut grid = vec![vec![' '; width]; height];
        for &(x, y) in &self.points {
            let px = ((x - x_min) / x_range * (width - 1) as f64).round() as usize;
            let py = ((y - y_min) / y_range * (height - 1) as f64).round() as usize;
            grid[py.min(height - 1)][px.min(width - 1)] = self.point_char();
        }

        let mut output = String::new();
        self.config.title_line(&mut output);

        if self.config.show_labels {
            output.push_str(&format!("{} ↑\n", self.y_label));
        }
        for row in (0..height).rev() {
            if self.config.show_labels {
                let y_val = y_min + (row as f64 / (height - 1) as f64) * y_range;
                output.push_str(&format!("{:>8.1} │", y_val));
            }
            output.extend(grid[row].iter());
            output.push('\n');
        }

        if self.config.show_labels {
            output.push_str("         └");
            output.extend(std::iter::repeat('─').take(width));
            output.push('\n');
            output.push_str(&format!(
                "          {:<w$.1}{:>8.1}\n",
                x_min,
                x_max,
                w = width.saturating_sub(8)
            ));
            output.push_str(&format!("{:>w$} →\n", self.x_label, w = width + 8));
        }

        output
    }
}

// ============================================================================
// Heatmap
// ============================================================================

/// Labelled grid of cells with shade by intensity
#[derive(Debug, Clone)]
pub struct Heatmap {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    /// (表示値, 濃さ 0..=1)
    cells: Vec<Vec<(String, f64)>>,
    config: ChartConfig,
}

impl Heatmap {
    /// Coefficients printed with two decimals, shaded by magnitude
    pub fn correlation(matrix: &CorrelationMatrix, config: ChartConfig) -> Self {
        let cells = matrix
            .values()
            .iter()
            .map(|row| row.iter().map(|v| (format!("{:.2}", v), v.abs())).collect())
            .collect();
        Self {
            row_labels: matrix.columns().to_vec(),
            col_labels: matrix.columns().to_vec(),
            cells,
            config,
        }
    }

    /// Visible pivot counts; zero cells stay blank
    pub fn pivot(table: &PivotTable, config: ChartConfig) -> Self {
        let cells = table
            .a_values()
            .iter()
            .map(|a| {
                table
                    .b_values()
                    .iter()
                    .map(|b| {
                        let count = table.count(a, b);
                        let text = if count > 0 {
                            count.to_string()
                        } else {
                            String::new()
                        };
                        (text, table.intensity(a, b))
                    })
                    .collect()
            })
            .collect();
        Self {
            row_labels: table.a_values().to_vec(),
            col_labels: table.b_values().to_vec(),
            cells,
            config,
        }
    }

    fn shade(&self, intensity: f64) -> char {
        let ramp: &[char] = match self.config.style {
            ChartStyle::Ascii => &[' ', '.', ':', '+', '#'],
            ChartStyle::Unicode => &[' ', '░', '▒', '▓', '█'],
        };
        let idx = (intensity.clamp(0.0, 1.0) * (ramp.len() - 1) as f64).round() as usize;
        ramp[idx]
    }
}

impl Chart for Heatmap {
    fn render(&self) -> String {
        if self.row_labels.is_empty() || self.col_labels.is_empty() {
            return String::from("No data to display");
        }

        const CELL: usize = 7;
        let label_width = self.config.label_width;
        let mut output = String::new();
        self.config.title_line(&mut output);

        output.push_str(&" ".repeat(label_width + 1));
        for label in &self.col_labels {
            output.push_str(&format!("{:>CELL$}", truncate_label(label, CELL - 1)));
        }
        output.push('\n');

        for (label, row) in self.row_labels.iter().zip(&self.cells) {
            output.push_str(&format!(
                "{:>w$} ",
                truncate_label(label, label_width),
                w = label_width
            ));
            for (text, intensity) in row {
                output.push(' ');
                output.push(self.shade(*intensity));
                output.push_str(&format!("{:>5}", text));
            }
            output.push('\n');
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightConfig;
    use crate::dataset::Dataset;
    use crate::pivot::pivot;
    use crate::stats::correlation_matrix;

    fn series(labels: &[&str], counts: &[usize]) -> Series {
        Series {
            label: "col".into(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            counts: counts.to_vec(),
        }
    }

    #[test]
    fn test_bar_chart_scaling() {
        let chart = BarChart::new(&series(&["cat", "dog"], &[4, 2]), ChartConfig::default());
        let output = chart.render();
        let lines: Vec<&str> = output.lines().collect();
        let full = lines[0].matches('█').count();
        let half = lines[1].matches('█').count();
        assert_eq!(full, 36);
        assert_eq!(half, 18);
        assert!(lines[0].ends_with(" 4"));
    }

    #[test]
    fn test_bar_chart_empty() {
        let chart = BarChart::new(&series(&[], &[]), ChartConfig::default());
        assert_eq!(chart.render(), "No data to display");
    }

    #[test]
    fn test_pie_percentages() {
        let chart = PieChart::new(&series(&["a", "b"], &[3, 1]), true, ChartConfig::default());
        let output = chart.render();
        assert!(output.contains("75.0%"));
        assert!(output.contains("25.0%"));
        assert!(output.contains('▒'));
    }

    #[test]
    fn test_scatter_ascii() {
        let config = ChartConfig {
            style: ChartStyle::Ascii,
            width: 20,
            height: 5,
            ..Default::default()
        };
        let plot = ScatterPlot::new(&[(0.0, 0.0), (1.0, 1.0), (1.0, 1.0)], "x", "y", config);
        let output = plot.render();
        assert_eq!(output.matches('*').count(), 2);
        assert!(output.contains('└'));
    }

    #[test]
    fn test_correlation_heatmap() {
        let rows: Vec<Vec<String>> = (0..6).map(|i| vec![i.to_string(), (-i).to_string()]).collect();
        let ds = Dataset::from_records(vec!["p".into(), "n".into()], rows);
        let matrix = correlation_matrix(&ds, &["p", "n"], &InsightConfig::default());
        let output = Heatmap::correlation(&matrix, ChartConfig::default()).render();
        assert!(output.contains("1.00"));
        assert!(output.contains("-1.00"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_pivot_heatmap_blanks_zero() {
        let ds = Dataset::from_records(
            vec!["a".into(), "b".into()],
            vec![
                vec!["x".to_string(), "p".to_string()],
                vec!["y".to_string(), "q".to_string()],
            ],
        );
        let table = pivot(&ds, "a", "b", &InsightConfig::default());
        let config = ChartConfig {
            style: ChartStyle::Ascii,
            ..Default::default()
        };
        let output = Heatmap::pivot(&table, config).render();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("#    1"));
        assert!(!lines[1].contains('0'));
    }
}
