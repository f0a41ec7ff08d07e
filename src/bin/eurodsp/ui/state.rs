//! Messages between the UI thread and the audio thread
//!
//! Both directions travel through `rtrb` rings, so everything here is
//! `Copy` and allocation-free.

use eurodsp::engine::{EditMode, Engine, Function, Settings};
use eurodsp::processors::ProcessorFunction;
use eurodsp::{NUM_CHANNELS, NUM_PARAMETERS};

/// Commands sent from UI thread to audio thread
#[derive(Clone, Copy, Debug)]
pub enum ControlMessage {
    /// Move a knob by `delta` steps of its 16-bit range
    NudgePot { index: usize, delta: i32 },
    /// Short or long press of the mode button
    ModeButton { long: bool },
    /// Short or long press of the function button
    FunctionButton { long: bool },
    /// Hold the panel gate button of a channel for a moment
    Trigger { channel: usize },
    NumberStation,
    ToggleSnapMode,
}

/// Engine state published by the audio thread a few dozen times a second
#[derive(Clone, Copy, Debug)]
pub struct EngineStatus {
    pub edit_mode: EditMode,
    pub function: Function,
    pub processors: [ProcessorFunction; NUM_CHANNELS],
    pub pots: [u16; NUM_PARAMETERS],
    pub brightness: [u8; NUM_CHANNELS],
    pub dac_codes: [u16; NUM_CHANNELS],
    pub led_pattern: Option<u8>,
    pub settings: Settings,
}

impl EngineStatus {
    pub fn capture(engine: &Engine) -> Self {
        Self {
            edit_mode: engine.edit_mode(),
            function: engine.function(),
            processors: [
                engine.processors(0).function(),
                engine.processors(1).function(),
            ],
            pots: *engine.pots(),
            brightness: [engine.brightness(0), engine.brightness(1)],
            dac_codes: engine.dac_codes(),
            led_pattern: engine.led_pattern(),
            settings: engine.settings(),
        }
    }
}
