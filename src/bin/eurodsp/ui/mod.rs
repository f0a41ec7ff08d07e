//! TUI module for eurodsp
//!
//! Draws the panel and the scopes, and turns key presses into
//! [`ControlMessage`]s for the audio thread.

mod panel;
mod spectrum;
pub mod state;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::warn;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::path::PathBuf;
use std::time::Duration;

use eurodsp::NUM_PARAMETERS;

pub use state::{ControlMessage, EngineStatus};

use panel::render_panel;
use spectrum::{render_spectrum, SpectrumAnalyzer};
use waveform::render_waveform;

/// Scope length in frames, also the FFT size
const VIS_BUFFER_SIZE: usize = 1024;
/// Knob step for Up / Down, and with Shift held
const POT_STEP: i32 = 1024;
const POT_STEP_COARSE: i32 = 8192;

/// UI application state
pub struct UiApp {
    scope_rx: Consumer<[f32; 2]>,
    status_rx: Consumer<EngineStatus>,
    control_tx: Producer<ControlMessage>,
    status: EngineStatus,
    scope: Vec<[f32; 2]>,
    spectrum: SpectrumAnalyzer,
    sample_rate: f32,
    selected_pot: usize,
    settings_path: PathBuf,
    message: String,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        scope_rx: Consumer<[f32; 2]>,
        status_rx: Consumer<EngineStatus>,
        control_tx: Producer<ControlMessage>,
        status: EngineStatus,
        sample_rate: f32,
        settings_path: PathBuf,
    ) -> Self {
        Self {
            scope_rx,
            status_rx,
            control_tx,
            status,
            scope: vec![[0.0; 2]; VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, sample_rate),
            sample_rate,
            selected_pot: 0,
            settings_path,
            message: String::new(),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_scope();
            self.poll_status();

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Keep the last VIS_BUFFER_SIZE frames
    fn poll_scope(&mut self) {
        let available = self.scope_rx.slots();
        if available == 0 {
            return;
        }
        while let Ok(frame) = self.scope_rx.pop() {
            self.scope.push(frame);
        }
        if self.scope.len() > VIS_BUFFER_SIZE {
            let excess = self.scope.len() - VIS_BUFFER_SIZE;
            self.scope.drain(0..excess);
        }
        self.spectrum.update(self.scope.iter().map(|frame| frame[0]));
    }

    /// Keep only the latest status
    fn poll_status(&mut self) {
        while let Ok(status) = self.status_rx.pop() {
            self.status = status;
        }
    }

    fn send(&mut self, message: ControlMessage) {
        if self.control_tx.push(message).is_err() {
            warn!("control ring full, dropped {message:?}");
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(c @ '1'..='4') => {
                self.selected_pot = (c as usize - '1' as usize).min(NUM_PARAMETERS - 1);
            }
            KeyCode::Up | KeyCode::Down => {
                let step = if shift { POT_STEP_COARSE } else { POT_STEP };
                let delta = if key.code == KeyCode::Up { step } else { -step };
                self.send(ControlMessage::NudgePot {
                    index: self.selected_pot,
                    delta,
                });
            }
            KeyCode::Char(' ') => self.send(ControlMessage::Trigger { channel: 0 }),
            KeyCode::Enter => self.send(ControlMessage::Trigger { channel: 1 }),
            KeyCode::Char('m') => self.send(ControlMessage::ModeButton { long: false }),
            KeyCode::Char('M') => self.send(ControlMessage::ModeButton { long: true }),
            KeyCode::Char('f') => self.send(ControlMessage::FunctionButton { long: false }),
            KeyCode::Char('F') => self.send(ControlMessage::FunctionButton { long: true }),
            KeyCode::Char('n') | KeyCode::Char('N') => self.send(ControlMessage::NumberStation),
            KeyCode::Char('p') | KeyCode::Char('P') => self.send(ControlMessage::ToggleSnapMode),
            KeyCode::Char('s') | KeyCode::Char('S') => self.save_settings(),
            _ => {}
        }
    }

    fn save_settings(&mut self) {
        self.message = match self.status.settings.save(&self.settings_path) {
            Ok(()) => format!("saved {}", self.settings_path.display()),
            Err(err) => format!("save failed: {err}"),
        };
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6),  // Panel
                Constraint::Min(8),     // Scope
                Constraint::Length(10), // Spectrum
                Constraint::Length(1),  // Help bar
            ])
            .split(frame.area());

        render_panel(frame, chunks[0], &self.status, self.selected_pot, self.sample_rate);
        render_waveform(frame, chunks[1], &self.scope);
        render_spectrum(frame, chunks[2], self.spectrum.data());

        let help = format!(
            " [1-4] knob  [Up/Down] turn  [Space/Enter] gate 1/2  [m/M] mode  [f/F] function  [n] numbers  [p] snap  [s] save  [q] quit  {}",
            self.message
        );
        frame.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            chunks[3],
        );
    }
}
