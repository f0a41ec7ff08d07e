//! App - audio device setup and the audio thread side of the engine

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{info, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use eurodsp::engine::{Calibration, Engine, Settings};
use eurodsp::io::converter::unsigned_to_f32;
use eurodsp::{NUM_CHANNELS, SAMPLE_RATE};

use super::config::Config;
use super::ui::{ControlMessage, EngineStatus, UiApp};

const CONTROL_RING_SIZE: usize = 64;
const STATUS_RING_SIZE: usize = 8;
const SCOPE_RING_SIZE: usize = 8192;
/// Engine samples between two status updates
const STATUS_INTERVAL: u32 = SAMPLE_RATE / 60;
/// How long a panel button trigger holds the gate, in engine samples
const TRIGGER_LENGTH: u32 = SAMPLE_RATE / 20;

pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let settings = Settings::load(&self.config.settings_path)
            .wrap_err_with(|| format!("failed to load {}", self.config.settings_path.display()))?;
        let calibration = Calibration::load(&self.config.calibration_path).wrap_err_with(|| {
            format!("failed to load {}", self.config.calibration_path.display())
        })?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;
        let sample_rate = config.sample_rate().0 as f32;
        let channels = usize::from(config.channels());
        info!("output at {sample_rate} Hz, {channels} channels");

        let mut engine = Engine::with_settings(&settings);
        engine.set_calibration(calibration);
        let initial = EngineStatus::capture(&engine);

        let (control_tx, control_rx) = RingBuffer::<ControlMessage>::new(CONTROL_RING_SIZE);
        let (status_tx, status_rx) = RingBuffer::<EngineStatus>::new(STATUS_RING_SIZE);
        let (scope_tx, scope_rx) = RingBuffer::<[f32; 2]>::new(SCOPE_RING_SIZE);

        let mut audio = AudioState::new(engine, control_rx, status_tx, scope_tx, sample_rate);
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| audio.fill(data, channels),
            |err| warn!("audio error: {err}"),
            None,
        )?;
        stream.play()?;

        let mut ui = UiApp::new(
            scope_rx,
            status_rx,
            control_tx,
            initial,
            SAMPLE_RATE as f32,
            self.config.settings_path.clone(),
        );
        let mut terminal = ratatui::init();
        let result = ui.run(&mut terminal);
        ratatui::restore();
        result
    }
}

/// Everything the audio callback owns
struct AudioState {
    engine: Engine,
    control_rx: Consumer<ControlMessage>,
    status_tx: Producer<EngineStatus>,
    scope_tx: Producer<[f32; 2]>,
    /// Engine samples per device frame, and the running fraction
    step: f64,
    position: f64,
    trigger: [u32; NUM_CHANNELS],
    frame: [f32; NUM_CHANNELS],
    status_countdown: u32,
}

impl AudioState {
    fn new(
        engine: Engine,
        control_rx: Consumer<ControlMessage>,
        status_tx: Producer<EngineStatus>,
        scope_tx: Producer<[f32; 2]>,
        device_rate: f32,
    ) -> Self {
        Self {
            engine,
            control_rx,
            status_tx,
            scope_tx,
            step: f64::from(SAMPLE_RATE) / f64::from(device_rate.max(1.0)),
            position: 0.0,
            trigger: [0; NUM_CHANNELS],
            frame: [0.0; NUM_CHANNELS],
            status_countdown: 0,
        }
    }

    fn handle(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::NudgePot { index, delta } => {
                let current = self.engine.pots().get(index).copied().unwrap_or(0);
                let value = (i32::from(current) + delta).clamp(0, 65535) as u16;
                if let Err(err) = self.engine.set_pot(index, value) {
                    warn!("{err}");
                }
            }
            ControlMessage::ModeButton { long } => self.engine.press_mode_button(long),
            ControlMessage::FunctionButton { long } => self.engine.press_function_button(long),
            ControlMessage::Trigger { channel } => {
                if let Some(countdown) = self.trigger.get_mut(channel) {
                    *countdown = TRIGGER_LENGTH;
                }
            }
            ControlMessage::NumberStation => self.engine.enable_number_station(),
            ControlMessage::ToggleSnapMode => {
                let snap_mode = !self.engine.snap_mode();
                self.engine.set_snap_mode(snap_mode);
            }
        }
    }

    /// One engine sample, at 48 kHz.
    fn tick(&mut self) {
        let mut buttons = 0u8;
        for (channel, countdown) in self.trigger.iter_mut().enumerate() {
            if *countdown > 0 {
                *countdown -= 1;
                buttons |= 1 << channel;
            }
        }
        self.engine.poll();
        let codes = self.engine.tick(0, buttons);
        self.frame = codes.map(unsigned_to_f32);
        // Scope drops frames when the UI falls behind.
        let _ = self.scope_tx.push(self.frame);

        if self.status_countdown == 0 {
            self.status_countdown = STATUS_INTERVAL;
            let _ = self.status_tx.push(EngineStatus::capture(&self.engine));
        }
        self.status_countdown -= 1;
    }

    /// Device callback. The engine runs at its own rate; each device frame
    /// holds the latest engine sample.
    fn fill(&mut self, data: &mut [f32], channels: usize) {
        while let Ok(message) = self.control_rx.pop() {
            self.handle(message);
        }
        for out in data.chunks_mut(channels.max(1)) {
            self.position += self.step;
            while self.position >= 1.0 {
                self.position -= 1.0;
                self.tick();
            }
            for (i, sample) in out.iter_mut().enumerate() {
                *sample = self.frame[i % NUM_CHANNELS];
            }
        }
    }
}
