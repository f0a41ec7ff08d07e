/* Engine
======

Two [`Processors`] wired together the way the module's front panel pairs
them: four knobs, a mode button, a function button and two gate inputs.

The edit mode decides where a knob goes:

- Twin: both channels run the same function and follow all four knobs.
- Split: channel 1 gets knobs 1-2, channel 2 knobs 3-4, both in half mode.
- First / Second: the knobs edit one channel at a time, and what they set is
  remembered per channel so the other channel keeps its own values.
*/

pub mod calibration;
pub mod settings;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::io::converter::to_unsigned;
use crate::processors::gate::{Control, GateDetector};
use crate::processors::{ProcessorFunction, Processors};
use crate::voices::ControlMode;
use crate::{NUM_CHANNELS, NUM_PARAMETERS};

pub use calibration::Calibration;
pub use settings::Settings;

/// A knob has to move this far before it registers again.
const POT_THRESHOLD_UNLOCKED: u16 = 1 << (16 - 10);
/// Same, right after the knobs changed meaning.
const POT_THRESHOLD_LOCKED: u16 = 1 << (16 - 8);
/// In snap mode a knob takes over once it is this close to the stored value.
const SNAP_DISTANCE: i16 = 2;
/// Long double presses needed to reach the number station.
const NUMBER_STATION_PRESSES: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EditMode {
    #[default]
    Twin = 0,
    Split,
    First,
    Second,
}

impl EditMode {
    pub const ALL: [EditMode; 4] = [
        EditMode::Twin,
        EditMode::Split,
        EditMode::First,
        EditMode::Second,
    ];

    /// The channel the knobs edit, in the per-channel modes.
    pub fn channel(self) -> Option<usize> {
        match self {
            EditMode::First => Some(0),
            EditMode::Second => Some(1),
            EditMode::Twin | EditMode::Split => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EditMode::Twin => "twin",
            EditMode::Split => "split",
            EditMode::First => "first",
            EditMode::Second => "second",
        }
    }

    fn wrap(index: u8) -> EditMode {
        Self::ALL[usize::from(index) % Self::ALL.len()]
    }
}

impl TryFrom<u8> for EditMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        EditMode::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(Error::InvalidEditMode(value))
    }
}

/// What the function button selects. The first four are the main bank, the
/// last four the alternate bank reached with a long press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Function {
    #[default]
    Envelope = 0,
    Lfo,
    TapLfo,
    DrumGenerator,
    MiniSequencer,
    PulseShaper,
    PulseRandomizer,
    FmDrumGenerator,
}

impl Function {
    pub const ALL: [Function; 8] = [
        Function::Envelope,
        Function::Lfo,
        Function::TapLfo,
        Function::DrumGenerator,
        Function::MiniSequencer,
        Function::PulseShaper,
        Function::PulseRandomizer,
        Function::FmDrumGenerator,
    ];

    const FIRST_ALTERNATE: u8 = 4;

    /// Processor function run on each channel.
    pub fn processors(self) -> [ProcessorFunction; NUM_CHANNELS] {
        use ProcessorFunction as P;
        match self {
            Function::Envelope => [P::MultistageEnvelope; 2],
            Function::Lfo => [P::Lfo; 2],
            Function::TapLfo => [P::TapLfo; 2],
            Function::DrumGenerator => [P::BassDrum, P::SnareDrum],
            Function::MiniSequencer => [P::MiniSequencer; 2],
            Function::PulseShaper => [P::PulseShaper; 2],
            Function::PulseRandomizer => [P::PulseRandomizer; 2],
            Function::FmDrumGenerator => [P::FmDrum; 2],
        }
    }

    pub fn is_alternate(self) -> bool {
        self as u8 >= Self::FIRST_ALTERNATE
    }

    /// Next function within the same bank.
    pub fn next(self) -> Function {
        let bank = (self as u8) & Self::FIRST_ALTERNATE;
        Self::wrap((((self as u8) + 1) & 3) | bank)
    }

    /// Same slot in the other bank.
    pub fn alternate(self) -> Function {
        Self::wrap((self as u8) + Self::FIRST_ALTERNATE)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Envelope => "envelope",
            Function::Lfo => "lfo",
            Function::TapLfo => "tap lfo",
            Function::DrumGenerator => "drums",
            Function::MiniSequencer => "sequencer",
            Function::PulseShaper => "pulse shaper",
            Function::PulseRandomizer => "pulse randomizer",
            Function::FmDrumGenerator => "fm drums",
        }
    }

    fn wrap(index: u8) -> Function {
        Self::ALL[usize::from(index) % Self::ALL.len()]
    }
}

impl TryFrom<u8> for Function {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Function::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(Error::InvalidFunction(value))
    }
}

/// Both channels plus the panel state that routes knobs and buttons to them.
pub struct Engine {
    processors: [Processors; NUM_CHANNELS],
    gates: [GateDetector; NUM_CHANNELS],
    edit_mode: EditMode,
    function: [Function; NUM_CHANNELS],
    snap_mode: bool,
    pot_value: [u8; 2 * NUM_PARAMETERS],
    pots: [u16; NUM_PARAMETERS],
    pot_threshold: [u16; NUM_PARAMETERS],
    snapped: [bool; NUM_PARAMETERS],
    double_press_counter: u8,
    last_sample: [i16; NUM_CHANNELS],
    calibration: Calibration,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_settings(&Settings::default())
    }

    pub fn with_settings(settings: &Settings) -> Self {
        let mut engine = Self {
            processors: [Processors::new(), Processors::new()],
            gates: [GateDetector::new(); NUM_CHANNELS],
            edit_mode: EditMode::Twin,
            function: [Function::Envelope; NUM_CHANNELS],
            snap_mode: false,
            pot_value: [0; 2 * NUM_PARAMETERS],
            pots: [0; NUM_PARAMETERS],
            pot_threshold: [0; NUM_PARAMETERS],
            snapped: [false; NUM_PARAMETERS],
            double_press_counter: 0,
            last_sample: [0; NUM_CHANNELS],
            calibration: Calibration::default(),
        };
        engine.apply_settings(settings);
        engine
    }

    /// Restart both channels from a saved panel state.
    pub fn apply_settings(&mut self, settings: &Settings) {
        for processors in self.processors.iter_mut() {
            processors.init();
        }
        self.gates = [GateDetector::new(); NUM_CHANNELS];
        self.last_sample = [0; NUM_CHANNELS];
        self.pots = [0; NUM_PARAMETERS];
        self.pot_threshold = [0; NUM_PARAMETERS];
        self.snapped = [false; NUM_PARAMETERS];

        self.edit_mode = settings.edit_mode;
        self.function = settings.function;
        self.pot_value = settings.pot_value;
        self.snap_mode = settings.snap_mode;

        if self.edit_mode.channel().is_some() {
            self.lock_pots();
            let (first, second) = self.pot_value.split_at(NUM_PARAMETERS);
            for (channel, stored) in [first, second].into_iter().enumerate() {
                let mut values = [0u16; NUM_PARAMETERS];
                for (value, &pot) in values.iter_mut().zip(stored) {
                    *value = u16::from(pot) << 8;
                }
                self.processors[channel].set_parameters(&values);
            }
        }

        self.change_control_mode();
        self.set_function(0, self.function[0]);
        self.set_function(1, self.function[1]);
        self.double_press_counter = 0;
        debug!(
            "engine restored: {} mode, {} / {}",
            self.edit_mode.name(),
            self.function[0].name(),
            self.function[1].name()
        );
    }

    /// Snapshot of what [`Engine::apply_settings`] needs to come back to
    /// this state.
    pub fn settings(&self) -> Settings {
        Settings {
            edit_mode: self.edit_mode,
            function: self.function,
            pot_value: self.pot_value,
            snap_mode: self.snap_mode,
        }
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    /// Function shown on the panel: the second channel's in
    /// [`EditMode::Second`], the first channel's otherwise.
    pub fn function(&self) -> Function {
        match self.edit_mode {
            EditMode::Second => self.function[1],
            _ => self.function[0],
        }
    }

    pub fn snap_mode(&self) -> bool {
        self.snap_mode
    }

    pub fn set_snap_mode(&mut self, snap_mode: bool) {
        self.snap_mode = snap_mode;
    }

    /// Last position of each knob.
    pub fn pots(&self) -> &[u16; NUM_PARAMETERS] {
        &self.pots
    }

    pub fn processors(&self, channel: usize) -> &Processors {
        &self.processors[channel]
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
    }

    /// A knob moved. Movements smaller than the current threshold are
    /// ignored, like ADC jitter on the hardware.
    pub fn set_pot(&mut self, index: usize, value: u16) -> Result<()> {
        if index >= NUM_PARAMETERS {
            return Err(Error::ParameterIndex(index));
        }
        let threshold = i32::from(self.pot_threshold[index]);
        let distance = (i32::from(value) - i32::from(self.pots[index])).abs();
        if threshold == 0 || distance >= threshold {
            self.on_pot(index, value);
            self.pots[index] = value;
            self.pot_threshold[index] = POT_THRESHOLD_UNLOCKED;
        }
        Ok(())
    }

    fn on_pot(&mut self, index: usize, value: u16) {
        let stored = (value >> 8) as u8;
        match self.edit_mode {
            EditMode::Twin => {
                for processors in self.processors.iter_mut() {
                    processors.set_parameter(index, value);
                }
                self.pot_value[index] = stored;
            }
            EditMode::Split => {
                if index < 2 {
                    self.processors[0].set_parameter(index, value);
                } else {
                    self.processors[1].set_parameter(index - 2, value);
                }
                self.pot_value[index] = stored;
            }
            EditMode::First | EditMode::Second => {
                let channel = usize::from(self.edit_mode == EditMode::Second);
                let slot = index + channel * NUM_PARAMETERS;
                let delta = (i16::from(self.pot_value[slot]) - i16::from(stored)).abs();
                if !self.snap_mode || self.snapped[index] || delta <= SNAP_DISTANCE {
                    self.processors[channel].set_parameter(index, value);
                    self.pot_value[slot] = stored;
                    self.snapped[index] = true;
                }
            }
        }
    }

    /// Raise the knob thresholds and forget which knobs have snapped.
    fn lock_pots(&mut self) {
        self.pot_threshold = [POT_THRESHOLD_LOCKED; NUM_PARAMETERS];
        self.snapped = [false; NUM_PARAMETERS];
    }

    /// Short press toggles Twin and Split, or First and Second. Long press
    /// moves between the shared and the per-channel modes.
    pub fn press_mode_button(&mut self, long: bool) {
        let mode = self.edit_mode as u8;
        if long {
            self.edit_mode = EditMode::wrap(mode + EditMode::First as u8);
            self.function[0] = self.function[1];
            let [first, second] = self.function[0].processors();
            self.processors[0].set_function(first);
            self.processors[1].set_function(second);
            self.lock_pots();
        } else if self.edit_mode.channel().is_none() {
            self.edit_mode = EditMode::wrap(EditMode::Split as u8 - mode);
        } else {
            self.edit_mode = EditMode::wrap(EditMode::Second as u8 - (mode & 1));
            self.lock_pots();
        }
        self.change_control_mode();
        debug!("edit mode {}", self.edit_mode.name());
    }

    /// Short press steps through the current bank, long press jumps to the
    /// other bank.
    pub fn press_function_button(&mut self, long: bool) {
        let function = self.function();
        let function = if long {
            function.alternate()
        } else {
            function.next()
        };
        self.set_function(self.edit_mode.channel().unwrap_or(0), function);
        debug!("function {}", function.name());
    }

    /// Both buttons held down together. The third time in a row switches
    /// to the number station.
    pub fn hold_both_buttons(&mut self) {
        self.double_press_counter += 1;
        if self.double_press_counter == NUMBER_STATION_PRESSES {
            self.double_press_counter = 0;
            self.enable_number_station();
        }
    }

    pub fn enable_number_station(&mut self) {
        for processors in self.processors.iter_mut() {
            processors.set_function(ProcessorFunction::NumberStation);
        }
        info!("number station");
    }

    fn set_function(&mut self, channel: usize, function: Function) {
        let pair = function.processors();
        if self.edit_mode.channel().is_none() {
            self.function = [function; NUM_CHANNELS];
            for (processors, f) in self.processors.iter_mut().zip(pair) {
                processors.set_function(f);
            }
        } else {
            self.function[channel] = function;
            self.processors[channel].set_function(pair[channel]);
        }
    }

    fn change_control_mode(&mut self) {
        match self.edit_mode {
            EditMode::Split => {
                let (first, second) = self.pots.split_at(2);
                self.processors[0].set_parameters(first);
                self.processors[1].set_parameters(second);
                for processors in self.processors.iter_mut() {
                    processors.set_control_mode(ControlMode::Half);
                }
            }
            EditMode::Twin => {
                for processors in self.processors.iter_mut() {
                    processors.set_parameters(&self.pots);
                    processors.set_control_mode(ControlMode::Full);
                }
            }
            EditMode::First | EditMode::Second => {
                for processors in self.processors.iter_mut() {
                    processors.set_control_mode(ControlMode::Full);
                }
            }
        }
    }

    /// One sample of both channels.
    ///
    /// Bit `i` of `gate_inputs` is the gate jack of channel `i`, bit `i` of
    /// `buttons` its panel button. Returns the unsigned output codes.
    #[inline]
    pub fn tick(&mut self, gate_inputs: u8, buttons: u8) -> [u16; NUM_CHANNELS] {
        let mut flags = [Control::NONE; NUM_CHANNELS];
        for (channel, (gate, flag)) in self.gates.iter_mut().zip(flags.iter_mut()).enumerate() {
            let mask = 1 << channel;
            *flag = gate.process((gate_inputs | buttons) & mask != 0);
            if buttons & mask != 0 {
                *flag |= Control::FROM_BUTTON;
            }
        }
        let control = [flags[0] | flags[1].as_auxiliary(), flags[1]];

        let mut out = [0u16; NUM_CHANNELS];
        for channel in 0..NUM_CHANNELS {
            let sample = self.processors[channel].process(control[channel]);
            self.last_sample[channel] = sample;
            out[channel] = to_unsigned(sample);
        }
        out
    }

    /// Render ahead for the block based functions. Call often enough that
    /// the rings never run dry.
    pub fn poll(&mut self) {
        for processors in self.processors.iter_mut() {
            processors.buffer();
        }
    }

    /// Calibrated DAC codes of the last samples.
    pub fn dac_codes(&self) -> [u16; NUM_CHANNELS] {
        [
            self.calibration.dac_code(0, self.last_sample[0]),
            self.calibration.dac_code(1, self.last_sample[1]),
        ]
    }

    /// LED level of a channel, scaled the way each function reads best:
    /// drums by magnitude, bipolar functions around the middle, the rest
    /// from zero up.
    pub fn brightness(&self, channel: usize) -> u8 {
        if let Some(station) = self.processors[channel].number_station() {
            return if station.gate() { 255 } else { 0 };
        }
        let sample = i32::from(self.last_sample[channel]);
        match self.function[channel] {
            Function::DrumGenerator | Function::FmDrumGenerator => (sample.abs() >> 8).min(255) as u8,
            Function::Lfo | Function::TapLfo | Function::MiniSequencer => ((sample + 32768) >> 8) as u8,
            _ => (sample.max(0) >> 7).min(255) as u8,
        }
    }

    /// Pattern shown on the function LEDs while the number station runs.
    pub fn led_pattern(&self) -> Option<u8> {
        let first = self.processors[0].number_station()?;
        let second = self.processors[1].number_station()?;
        Some(first.digit() ^ second.digit())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_banks_cycle() {
        assert_eq!(Function::Envelope.next(), Function::Lfo);
        assert_eq!(Function::DrumGenerator.next(), Function::Envelope);
        assert_eq!(Function::FmDrumGenerator.next(), Function::MiniSequencer);
        assert_eq!(Function::Lfo.alternate(), Function::PulseShaper);
        assert_eq!(Function::PulseShaper.alternate(), Function::Lfo);
        assert!(Function::PulseRandomizer.is_alternate());
    }

    #[test]
    fn raw_bytes_are_checked() {
        assert_eq!(EditMode::try_from(3).unwrap(), EditMode::Second);
        assert!(matches!(EditMode::try_from(4), Err(Error::InvalidEditMode(4))));
        assert_eq!(Function::try_from(7).unwrap(), Function::FmDrumGenerator);
        assert!(matches!(Function::try_from(8), Err(Error::InvalidFunction(8))));
    }

    #[test]
    fn mode_button_walks_the_modes() {
        let mut engine = Engine::new();
        engine.press_mode_button(false);
        assert_eq!(engine.edit_mode(), EditMode::Split);
        assert_eq!(engine.processors(0).control_mode(), ControlMode::Half);
        engine.press_mode_button(false);
        assert_eq!(engine.edit_mode(), EditMode::Twin);
        engine.press_mode_button(true);
        assert_eq!(engine.edit_mode(), EditMode::First);
        engine.press_mode_button(false);
        assert_eq!(engine.edit_mode(), EditMode::Second);
        engine.press_mode_button(false);
        assert_eq!(engine.edit_mode(), EditMode::First);
        engine.press_mode_button(true);
        assert_eq!(engine.edit_mode(), EditMode::Twin);
        assert_eq!(engine.processors(1).control_mode(), ControlMode::Full);
    }

    #[test]
    fn drum_generator_pairs_kick_and_snare() {
        let mut engine = Engine::new();
        for _ in 0..3 {
            engine.press_function_button(false);
        }
        assert_eq!(engine.function(), Function::DrumGenerator);
        assert_eq!(engine.processors(0).function(), ProcessorFunction::BassDrum);
        assert_eq!(engine.processors(1).function(), ProcessorFunction::SnareDrum);
    }

    #[test]
    fn pot_index_is_checked() {
        let mut engine = Engine::new();
        assert!(matches!(engine.set_pot(4, 0), Err(Error::ParameterIndex(4))));
    }

    #[test]
    fn split_mode_routes_knob_pairs() {
        let mut engine = Engine::new();
        engine.press_mode_button(false);
        engine.set_pot(1, 20000).unwrap();
        engine.set_pot(3, 40000).unwrap();
        assert_eq!(engine.processors(0).parameters()[1], 20000);
        assert_eq!(engine.processors(1).parameters()[1], 40000);
        assert_eq!(engine.processors(1).parameters()[3], 0);
    }

    #[test]
    fn small_knob_moves_are_ignored_after_a_move() {
        let mut engine = Engine::new();
        engine.set_pot(0, 10000).unwrap();
        engine.set_pot(0, 10010).unwrap();
        assert_eq!(engine.processors(0).parameters()[0], 10000);
        engine.set_pot(0, 10100).unwrap();
        assert_eq!(engine.processors(0).parameters()[0], 10100);
    }

    #[test]
    fn snap_mode_waits_for_the_stored_position() {
        let mut engine = Engine::with_settings(&Settings {
            edit_mode: EditMode::First,
            function: [Function::Envelope; 2],
            pot_value: [128, 0, 0, 0, 0, 0, 0, 0],
            snap_mode: true,
        });
        assert_eq!(engine.processors(0).parameters()[0], 128 << 8);

        engine.set_pot(0, 1000).unwrap();
        assert_eq!(engine.processors(0).parameters()[0], 128 << 8);
        engine.set_pot(0, 127 << 8).unwrap();
        assert_eq!(engine.processors(0).parameters()[0], 127 << 8);
        // Snapped: the knob now moves freely.
        engine.set_pot(0, 1000).unwrap();
        assert_eq!(engine.processors(0).parameters()[0], 1000);
        assert_eq!(engine.settings().pot_value[0], (1000 >> 8) as u8);
    }

    #[test]
    fn channels_remember_their_own_knobs() {
        let mut engine = Engine::new();
        engine.press_mode_button(true);
        engine.set_pot(2, 30000).unwrap();
        engine.press_mode_button(false);
        engine.set_pot(2, 50000).unwrap();
        assert_eq!(engine.processors(0).parameters()[2], 30000);
        assert_eq!(engine.processors(1).parameters()[2], 50000);
        let stored = engine.settings().pot_value;
        assert_eq!(stored[2], (30000 >> 8) as u8);
        assert_eq!(stored[6], (50000 >> 8) as u8);
    }

    #[test]
    fn per_channel_functions() {
        let mut engine = Engine::new();
        engine.press_mode_button(true);
        engine.press_mode_button(false);
        engine.press_function_button(true);
        assert_eq!(engine.function(), Function::MiniSequencer);
        assert_eq!(engine.processors(1).function(), ProcessorFunction::MiniSequencer);
        assert_eq!(
            engine.processors(0).function(),
            ProcessorFunction::MultistageEnvelope
        );
    }

    #[test]
    fn number_station_after_three_double_presses() {
        let mut engine = Engine::new();
        engine.hold_both_buttons();
        engine.hold_both_buttons();
        assert!(engine.led_pattern().is_none());
        engine.hold_both_buttons();
        assert_eq!(
            engine.processors(0).function(),
            ProcessorFunction::NumberStation
        );
        assert!(engine.led_pattern().is_some());
    }

    #[test]
    fn button_gate_fires_the_envelope() {
        let mut engine = Engine::new();
        engine.set_pot(2, 65535).unwrap();
        let mut peak = 0;
        for _ in 0..2000 {
            engine.poll();
            let [first, _] = engine.tick(0, 0b01);
            peak = peak.max(first);
        }
        assert!(peak > 40000, "peak {peak}");
        assert!(engine.brightness(0) > 0);
    }
}
