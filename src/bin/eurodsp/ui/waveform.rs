//! Two channel oscilloscope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

const CHANNEL_COLORS: [Color; 2] = [Color::Cyan, Color::Magenta];

/// Render both channels over the same axes
pub fn render_waveform(frame: &mut Frame, area: Rect, scope: &[[f32; 2]]) {
    let block = Block::default()
        .title(" Scope  1 cyan  2 magenta ")
        .borders(Borders::ALL);

    let len = scope.len().max(1) as f64;
    let points: Vec<Vec<(f64, f64)>> = (0..2)
        .map(|channel| {
            scope
                .iter()
                .enumerate()
                .map(|(i, frame)| (i as f64 / len, f64::from(frame[channel])))
                .collect()
        })
        .collect();

    let datasets = points
        .iter()
        .zip(CHANNEL_COLORS)
        .map(|(data, color)| {
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color))
                .data(data)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
