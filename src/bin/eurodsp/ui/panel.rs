//! Front panel widget - edit mode, functions, knobs and channel LEDs

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use super::EngineStatus;

/// Render the panel: a status line, then one gauge per knob
pub fn render_panel(frame: &mut Frame, area: Rect, status: &EngineStatus, selected: usize, sample_rate: f32) {
    let block = Block::default().title(" eurodsp ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let bank = if status.function.is_alternate() { "alt" } else { "main" };
    let line = Line::from(vec![
        Span::styled(
            format!(" {:<7}", status.edit_mode.name()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} ({bank})  ", status.function.name()),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!(
                "1: {}  2: {}  ",
                status.processors[0].name(),
                status.processors[1].name()
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            if status.settings.snap_mode { "snap  " } else { "" },
            Style::default().fg(Color::LightRed),
        ),
        Span::styled(
            format!("{:.1}kHz", sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), rows[0]);

    let mut leds = vec![
        led(" LED 1 ", status.brightness[0]),
        led(" LED 2 ", status.brightness[1]),
    ];
    if let Some(pattern) = status.led_pattern {
        leds.push(Span::styled(
            format!(" digits {pattern:04b} "),
            Style::default().fg(Color::Green),
        ));
    }
    leds.push(Span::styled(
        format!(
            " dac {:5} {:5}",
            status.dac_codes[0], status.dac_codes[1]
        ),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(leds)), rows[1]);

    let knobs = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[2]);
    for (index, (&value, area)) in status.pots.iter().zip(knobs.iter()).enumerate() {
        let color = if index == selected { Color::Yellow } else { Color::Blue };
        let gauge = Gauge::default()
            .block(Block::default().title(format!(" knob {} ", index + 1)))
            .gauge_style(Style::default().fg(color))
            .ratio(f64::from(value) / 65535.0)
            .label(format!("{value}"));
        frame.render_widget(gauge, *area);
    }
}

fn led(label: &'static str, brightness: u8) -> Span<'static> {
    Span::styled(
        label,
        Style::default()
            .fg(Color::Black)
            .bg(Color::Rgb(brightness, brightness / 4, 0)),
    )
}
