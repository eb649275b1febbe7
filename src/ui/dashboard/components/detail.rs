//! Detail component
//!
//! Draws the selected widget at full size: line charts as a ratatui chart,
//! bar and radar charts as grouped bars, everything else as text.

use super::super::state::DashboardState;
use super::super::utils::tone_color;
use crate::sync::Renderer;
use crate::sync::format;
use crate::sync::widget::{ChartSpec, ChartStyle, Widget, WidgetBody};
use ratatui::Frame;
use ratatui::layout::{Direction, Rect};
use ratatui::prelude::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::Line;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, BorderType, Borders, Chart, Dataset, GraphType,
    Paragraph, Wrap,
};

const SERIES_COLORS: [Color; 4] = [Color::Cyan, Color::LightMagenta, Color::LightGreen, Color::Yellow];

/// `(x, y)` pairs of every series, skipping gaps.
fn line_points(chart: &ChartSpec) -> Vec<Vec<(f64, f64)>> {
    chart
        .series
        .iter()
        .map(|series| {
            series
                .points
                .iter()
                .enumerate()
                .filter_map(|(x, y)| y.filter(|v| v.is_finite()).map(|v| (x as f64, v)))
                .collect()
        })
        .collect()
}

/// Lowest and highest y value, padded so a flat series stays visible.
fn y_bounds(points: &[Vec<(f64, f64)>]) -> Option<[f64; 2]> {
    let mut values = points.iter().flatten().map(|(_, y)| *y);
    let first = values.next()?;
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((max - min) * 0.05).max(0.01);
    Some([min - pad, max + pad])
}

fn render_line_chart(f: &mut Frame, area: Rect, chart: &ChartSpec, block: Block) {
    let points = line_points(chart);
    let Some(bounds) = y_bounds(&points) else {
        f.render_widget(Paragraph::new("No data points").block(block), area);
        return;
    };

    let datasets: Vec<Dataset> = chart
        .series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (series, data))| {
            Dataset::default()
                .name(series.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(data)
        })
        .collect();

    let x_labels: Vec<String> = match (chart.labels.first(), chart.labels.last()) {
        (Some(first), Some(last)) => vec![first.clone(), last.clone()],
        _ => Vec::new(),
    };
    let x_max = chart.labels.len().saturating_sub(1).max(1) as f64;

    let widget = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds(bounds)
                .labels(vec![format!("{:.2}", bounds[0]), format!("{:.2}", bounds[1])]),
        );
    f.render_widget(widget, area);
}

/// Bar length and caption of one value. Bars are integers, so lengths are in
/// hundredths of a unit; a negative value draws its magnitude. Missing values
/// draw nothing and read `N/A`.
fn bar_reading(value: Option<f64>) -> (u64, String) {
    let value = value.filter(|v| v.is_finite());
    let length = value.map_or(0, |v| (v.abs() * 100.0).round() as u64);
    (length, format::decimal(value, 2))
}

fn render_bar_chart(f: &mut Frame, area: Rect, chart: &ChartSpec, block: Block) {
    let groups: Vec<BarGroup> = chart
        .series
        .iter()
        .enumerate()
        .map(|(i, series)| {
            let bars: Vec<Bar> = series
                .points
                .iter()
                .zip(chart.labels.iter())
                .map(|(value, label)| {
                    let (length, caption) = bar_reading(*value);
                    let color = match value {
                        Some(v) if *v < 0.0 => Color::LightRed,
                        _ => SERIES_COLORS[i % SERIES_COLORS.len()],
                    };
                    Bar::default()
                        .value(length)
                        .text_value(caption)
                        .label(Line::from(label.clone()))
                        .style(Style::default().fg(color))
                })
                .collect();
            BarGroup::default()
                .label(Line::from(series.name.clone()))
                .bars(&bars)
        })
        .collect();

    let mut widget = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1);
    for group in groups {
        widget = widget.data(group);
    }
    f.render_widget(widget, area);
}

fn text_lines(widget: &Widget) -> Vec<Line<'static>> {
    match &widget.body {
        WidgetBody::Card(card) => {
            let mut lines = vec![
                Line::styled(
                    card.title.clone(),
                    Style::default()
                        .fg(tone_color(card.tone))
                        .add_modifier(Modifier::BOLD),
                ),
                Line::from(card.subtitle.clone()),
                Line::from(""),
                Line::from(card.body.clone()),
            ];
            if !card.badges.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(card.badges.join("  ")));
            }
            lines
        }
        WidgetBody::Panel(panel) => panel
            .rows
            .iter()
            .map(|(label, value)| Line::from(format!("{}: {}", label, value)))
            .collect(),
        WidgetBody::Row(_) | WidgetBody::Chart(_) => vec![Line::from(widget.to_string())],
    }
}

pub fn render_detail_panel(f: &mut Frame, area: Rect, state: &DashboardState, renderer: &Renderer) {
    let widgets = renderer.widgets(state.current_section());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));

    let Some(widget) = widgets.get(state.selected) else {
        f.render_widget(Paragraph::new("Nothing selected").block(block.title("DETAIL")), area);
        return;
    };
    let block = block.title(format!("DETAIL - {} {}", widget.kind, widget.id));

    match &widget.body {
        WidgetBody::Chart(chart) if chart.style == ChartStyle::Line => {
            render_line_chart(f, area, chart, block)
        }
        WidgetBody::Chart(chart) => render_bar_chart(f, area, chart, block),
        _ => f.render_widget(
            Paragraph::new(text_lines(widget))
                .block(block)
                .wrap(Wrap { trim: false }),
            area,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::widget::Series;

    fn chart(points: Vec<Option<f64>>) -> ChartSpec {
        ChartSpec {
            title: "AAPL".to_string(),
            style: ChartStyle::Line,
            labels: (0..points.len()).map(|i| format!("d{}", i)).collect(),
            series: vec![Series {
                name: "forecast".to_string(),
                points,
            }],
            captions: Vec::new(),
        }
    }

    #[test]
    fn test_gaps_are_skipped() {
        let points = line_points(&chart(vec![Some(1.0), None, Some(3.0)]));
        assert_eq!(points, vec![vec![(0.0, 1.0), (2.0, 3.0)]]);
    }

    #[test]
    fn test_flat_series_gets_padded_bounds() {
        let points = line_points(&chart(vec![Some(5.0), Some(5.0)]));
        let [lo, hi] = y_bounds(&points).unwrap();
        assert!(lo < 5.0 && hi > 5.0);
    }

    #[test]
    fn test_missing_bar_reads_not_available() {
        assert_eq!(bar_reading(None), (0, "N/A".to_string()));
        assert_eq!(bar_reading(Some(f64::NAN)), (0, "N/A".to_string()));
    }

    #[test]
    fn test_negative_bar_keeps_its_magnitude_and_sign() {
        assert_eq!(bar_reading(Some(-0.35)), (35, "-0.35".to_string()));
        assert_eq!(bar_reading(Some(1.2)), (120, "1.20".to_string()));
    }

    #[test]
    fn test_no_points_no_bounds() {
        assert!(y_bounds(&line_points(&chart(vec![None, None]))).is_none());
    }
}
