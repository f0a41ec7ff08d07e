//! Per-channel dispatcher.
//!
//! A [`Processors`] owns the one live voice algorithm of a channel, its raw
//! parameters and control mode, and the two rings that let block-rendering
//! algorithms be driven one sample at a time.

pub mod gate;
pub mod io_buffer;

use log::debug;

use crate::error::{Error, Result};
use crate::processors::gate::Control;
use crate::processors::io_buffer::{InputBuffer, OutputBuffer};
use crate::voices::{
    BassDrum, BlockVoice, BouncingBall, ControlMode, FmDrum, HighHat, Lfo, MiniSequencer,
    MultistageEnvelope, NumberStation, Parameters, PulseRandomizer, PulseShaper, SampleVoice,
    SnareDrum, Voice,
};
use crate::{BLOCK_SIZE, NUM_PARAMETERS};

/// Snare tone and snappy both above this: switch to the hi-hat.
const HIGH_HAT_THRESHOLD: u16 = 65000;
/// Either of them back below this: switch back to the snare.
const SNARE_THRESHOLD: u16 = 64500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ProcessorFunction {
    #[default]
    MultistageEnvelope = 0,
    Lfo,
    TapLfo,
    BassDrum,
    SnareDrum,
    HighHat,
    FmDrum,
    PulseShaper,
    PulseRandomizer,
    BouncingBall,
    MiniSequencer,
    NumberStation,
}

impl ProcessorFunction {
    pub const ALL: [ProcessorFunction; 12] = [
        ProcessorFunction::MultistageEnvelope,
        ProcessorFunction::Lfo,
        ProcessorFunction::TapLfo,
        ProcessorFunction::BassDrum,
        ProcessorFunction::SnareDrum,
        ProcessorFunction::HighHat,
        ProcessorFunction::FmDrum,
        ProcessorFunction::PulseShaper,
        ProcessorFunction::PulseRandomizer,
        ProcessorFunction::BouncingBall,
        ProcessorFunction::MiniSequencer,
        ProcessorFunction::NumberStation,
    ];

    /// True for algorithms rendered a block at a time through the rings.
    pub fn is_buffered(self) -> bool {
        matches!(
            self,
            ProcessorFunction::MultistageEnvelope
                | ProcessorFunction::Lfo
                | ProcessorFunction::TapLfo
                | ProcessorFunction::FmDrum
                | ProcessorFunction::NumberStation
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ProcessorFunction::MultistageEnvelope => "envelope",
            ProcessorFunction::Lfo => "lfo",
            ProcessorFunction::TapLfo => "tap lfo",
            ProcessorFunction::BassDrum => "bass drum",
            ProcessorFunction::SnareDrum => "snare drum",
            ProcessorFunction::HighHat => "high hat",
            ProcessorFunction::FmDrum => "fm drum",
            ProcessorFunction::PulseShaper => "pulse shaper",
            ProcessorFunction::PulseRandomizer => "pulse randomizer",
            ProcessorFunction::BouncingBall => "bouncing ball",
            ProcessorFunction::MiniSequencer => "mini sequencer",
            ProcessorFunction::NumberStation => "number station",
        }
    }
}

impl TryFrom<u8> for ProcessorFunction {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        ProcessorFunction::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(Error::InvalidFunction(value))
    }
}

/// The live algorithm of a channel. Lfo and TapLfo share the `Lfo` variant.
#[derive(Debug, Clone)]
enum Algorithm {
    MultistageEnvelope(MultistageEnvelope),
    Lfo(Lfo),
    BassDrum(BassDrum),
    SnareDrum(SnareDrum),
    HighHat(HighHat),
    FmDrum(FmDrum),
    PulseShaper(PulseShaper),
    PulseRandomizer(PulseRandomizer),
    BouncingBall(BouncingBall),
    MiniSequencer(MiniSequencer),
    NumberStation(NumberStation),
}

impl Algorithm {
    fn new(function: ProcessorFunction) -> Self {
        match function {
            ProcessorFunction::MultistageEnvelope => {
                Algorithm::MultistageEnvelope(MultistageEnvelope::new())
            }
            ProcessorFunction::Lfo | ProcessorFunction::TapLfo => {
                let mut lfo = Lfo::new();
                lfo.set_sync(function == ProcessorFunction::TapLfo);
                Algorithm::Lfo(lfo)
            }
            ProcessorFunction::BassDrum => Algorithm::BassDrum(BassDrum::new()),
            ProcessorFunction::SnareDrum => Algorithm::SnareDrum(SnareDrum::new()),
            ProcessorFunction::HighHat => Algorithm::HighHat(HighHat::new()),
            ProcessorFunction::FmDrum => Algorithm::FmDrum(FmDrum::new()),
            ProcessorFunction::PulseShaper => Algorithm::PulseShaper(PulseShaper::new()),
            ProcessorFunction::PulseRandomizer => {
                Algorithm::PulseRandomizer(PulseRandomizer::new())
            }
            ProcessorFunction::BouncingBall => Algorithm::BouncingBall(BouncingBall::new()),
            ProcessorFunction::MiniSequencer => Algorithm::MiniSequencer(MiniSequencer::new()),
            ProcessorFunction::NumberStation => Algorithm::NumberStation(NumberStation::new()),
        }
    }

    fn voice(&mut self) -> &mut dyn Voice {
        match self {
            Algorithm::MultistageEnvelope(v) => v,
            Algorithm::Lfo(v) => v,
            Algorithm::BassDrum(v) => v,
            Algorithm::SnareDrum(v) => v,
            Algorithm::HighHat(v) => v,
            Algorithm::FmDrum(v) => v,
            Algorithm::PulseShaper(v) => v,
            Algorithm::PulseRandomizer(v) => v,
            Algorithm::BouncingBall(v) => v,
            Algorithm::MiniSequencer(v) => v,
            Algorithm::NumberStation(v) => v,
        }
    }

    fn sample_voice(&mut self) -> Option<&mut dyn SampleVoice> {
        match self {
            Algorithm::BassDrum(v) => Some(v),
            Algorithm::SnareDrum(v) => Some(v),
            Algorithm::HighHat(v) => Some(v),
            Algorithm::PulseShaper(v) => Some(v),
            Algorithm::PulseRandomizer(v) => Some(v),
            Algorithm::BouncingBall(v) => Some(v),
            Algorithm::MiniSequencer(v) => Some(v),
            _ => None,
        }
    }

    fn block_voice(&mut self) -> Option<&mut dyn BlockVoice> {
        match self {
            Algorithm::MultistageEnvelope(v) => Some(v),
            Algorithm::Lfo(v) => Some(v),
            Algorithm::FmDrum(v) => Some(v),
            Algorithm::NumberStation(v) => Some(v),
            _ => None,
        }
    }
}

/// One channel: the selected algorithm plus its parameters.
pub struct Processors {
    function: ProcessorFunction,
    control_mode: ControlMode,
    parameters: Parameters,
    algorithm: Algorithm,
    input: InputBuffer,
    output: OutputBuffer,
}

impl Processors {
    pub fn new() -> Self {
        Self {
            function: ProcessorFunction::MultistageEnvelope,
            control_mode: ControlMode::Full,
            parameters: [0; NUM_PARAMETERS],
            algorithm: Algorithm::new(ProcessorFunction::MultistageEnvelope),
            input: InputBuffer::new(),
            output: OutputBuffer::new(),
        }
    }

    /// Back to the envelope, full mode, all knobs at zero.
    pub fn init(&mut self) {
        self.control_mode = ControlMode::Full;
        self.parameters = [0; NUM_PARAMETERS];
        self.function = ProcessorFunction::MultistageEnvelope;
        self.algorithm = Algorithm::new(self.function);
        self.input.flush();
        self.output.flush();
        self.configure();
    }

    pub fn function(&self) -> ProcessorFunction {
        self.function
    }

    pub fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Select an algorithm. The new algorithm starts from its power-on
    /// state, except when moving between Lfo and TapLfo: the running LFO is
    /// kept and only its clock sync is toggled.
    pub fn set_function(&mut self, function: ProcessorFunction) {
        self.switch_function(function);
        self.configure();
    }

    fn switch_function(&mut self, function: ProcessorFunction) {
        debug!("function {} -> {}", self.function.name(), function.name());
        let keep_lfo = matches!(self.algorithm, Algorithm::Lfo(_))
            && matches!(
                function,
                ProcessorFunction::Lfo | ProcessorFunction::TapLfo
            );
        if keep_lfo {
            if let Algorithm::Lfo(lfo) = &mut self.algorithm {
                lfo.set_sync(function == ProcessorFunction::TapLfo);
            }
        } else {
            self.algorithm = Algorithm::new(function);
            self.input.flush();
            self.output.flush();
        }
        self.function = function;
    }

    pub fn set_control_mode(&mut self, mode: ControlMode) {
        self.control_mode = mode;
        self.configure();
    }

    pub fn set_parameter(&mut self, index: usize, value: u16) {
        debug_assert!(index < NUM_PARAMETERS, "parameter index {index}");
        if let Some(parameter) = self.parameters.get_mut(index) {
            *parameter = value;
            self.configure();
        }
    }

    /// Copy the first `values.len()` parameters at once.
    pub fn set_parameters(&mut self, values: &[u16]) {
        for (parameter, &value) in self.parameters.iter_mut().zip(values) {
            *parameter = value;
        }
        self.configure();
    }

    fn configure(&mut self) {
        if matches!(
            self.function,
            ProcessorFunction::SnareDrum | ProcessorFunction::HighHat
        ) {
            let (tone, snappy) = match self.control_mode {
                ControlMode::Half => (self.parameters[0], self.parameters[1]),
                ControlMode::Full => (self.parameters[1], self.parameters[2]),
            };
            if tone > HIGH_HAT_THRESHOLD && snappy > HIGH_HAT_THRESHOLD {
                if self.function != ProcessorFunction::HighHat {
                    self.switch_function(ProcessorFunction::HighHat);
                }
            } else if (tone < SNARE_THRESHOLD || snappy < SNARE_THRESHOLD)
                && self.function != ProcessorFunction::SnareDrum
            {
                self.switch_function(ProcessorFunction::SnareDrum);
            }
        }
        self.algorithm
            .voice()
            .configure(&self.parameters, self.control_mode);
    }

    /// One tick of the channel.
    ///
    /// Unbuffered algorithms answer immediately. Buffered ones queue the
    /// control byte for the next [`Processors::buffer`] call and return the
    /// oldest rendered sample, or silence if nothing is ready yet.
    #[inline]
    pub fn process(&mut self, control: Control) -> i16 {
        if let Some(voice) = self.algorithm.sample_voice() {
            return voice.process(control);
        }
        self.input.overwrite(control);
        self.output.immediate_read()
    }

    /// Render one block for a buffered algorithm, if a whole block fits in
    /// the output ring. Does nothing for unbuffered algorithms.
    pub fn buffer(&mut self) {
        if self.output.writable() < BLOCK_SIZE || !self.function.is_buffered() {
            return;
        }
        let mut control = [Control::NONE; BLOCK_SIZE];
        for c in control.iter_mut() {
            *c = self.input.immediate_read();
        }
        let mut out = [0i16; BLOCK_SIZE];
        if let Some(voice) = self.algorithm.block_voice() {
            voice.render(&control, &mut out);
        }
        for sample in out {
            self.output.overwrite(sample);
        }
    }

    /// Samples rendered ahead and not yet consumed.
    pub fn pending(&self) -> usize {
        self.output.readable()
    }

    pub fn number_station(&self) -> Option<&NumberStation> {
        match &self.algorithm {
            Algorithm::NumberStation(station) => Some(station),
            _ => None,
        }
    }

    pub fn lfo(&self) -> Option<&Lfo> {
        match &self.algorithm {
            Algorithm::Lfo(lfo) => Some(lfo),
            _ => None,
        }
    }
}

impl Default for Processors {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_from_byte() {
        assert_eq!(
            ProcessorFunction::try_from(3).ok(),
            Some(ProcessorFunction::BassDrum)
        );
        assert!(matches!(
            ProcessorFunction::try_from(12),
            Err(Error::InvalidFunction(12))
        ));
    }

    #[test]
    fn snare_switches_to_high_hat_and_back() {
        let mut processors = Processors::new();
        processors.set_function(ProcessorFunction::SnareDrum);
        processors.set_parameters(&[32768, 65535, 65535, 32768]);
        assert_eq!(processors.function(), ProcessorFunction::HighHat);

        // Inside the band nothing moves.
        processors.set_parameter(1, 64800);
        assert_eq!(processors.function(), ProcessorFunction::HighHat);

        processors.set_parameter(1, 64000);
        assert_eq!(processors.function(), ProcessorFunction::SnareDrum);

        processors.set_parameter(1, 64800);
        assert_eq!(processors.function(), ProcessorFunction::SnareDrum);
    }

    #[test]
    fn half_mode_hysteresis_reads_first_two_knobs() {
        let mut processors = Processors::new();
        processors.set_control_mode(ControlMode::Half);
        processors.set_function(ProcessorFunction::SnareDrum);
        processors.set_parameters(&[65535, 65535, 0, 0]);
        assert_eq!(processors.function(), ProcessorFunction::HighHat);
        processors.set_parameter(0, 0);
        assert_eq!(processors.function(), ProcessorFunction::SnareDrum);
    }

    #[test]
    fn other_functions_ignore_hysteresis() {
        let mut processors = Processors::new();
        processors.set_function(ProcessorFunction::BassDrum);
        processors.set_parameters(&[65535; NUM_PARAMETERS]);
        assert_eq!(processors.function(), ProcessorFunction::BassDrum);
    }

    #[test]
    fn tap_lfo_shares_the_lfo() {
        let mut processors = Processors::new();
        processors.set_function(ProcessorFunction::Lfo);
        assert_eq!(processors.lfo().map(Lfo::sync), Some(false));
        processors.set_function(ProcessorFunction::TapLfo);
        assert_eq!(processors.lfo().map(Lfo::sync), Some(true));
        processors.set_function(ProcessorFunction::Lfo);
        assert_eq!(processors.lfo().map(Lfo::sync), Some(false));
    }

    #[test]
    fn buffer_waits_for_room() {
        let mut processors = Processors::new();
        processors.set_function(ProcessorFunction::Lfo);
        processors.buffer();
        processors.buffer();
        assert_eq!(processors.pending(), 2 * BLOCK_SIZE);
        // Full: a third block does not fit.
        processors.buffer();
        assert_eq!(processors.pending(), 2 * BLOCK_SIZE);
        processors.process(Control::NONE);
        processors.buffer();
        assert_eq!(processors.pending(), 2 * BLOCK_SIZE - 1);
    }

    #[test]
    fn unbuffered_functions_never_buffer() {
        let mut processors = Processors::new();
        processors.set_function(ProcessorFunction::BassDrum);
        processors.set_parameters(&[32768, 65535, 32768, 32768]);
        processors.buffer();
        assert_eq!(processors.pending(), 0);
        let mut peak = 0i32;
        for n in 0..400 {
            let control = if n == 0 {
                Control::GATE | Control::GATE_RISING
            } else {
                Control::NONE
            };
            peak = peak.max(i32::from(processors.process(control)).abs());
        }
        assert!(peak > 1000, "{peak}");
    }
}
