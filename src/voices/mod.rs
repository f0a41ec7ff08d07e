//! Per-channel voice algorithms.
//!
//! Every algorithm maps the channel's four raw parameters onto its own
//! controls in [`Voice::configure`]. In [`ControlMode::Full`] all four knobs
//! are used; in [`ControlMode::Half`] a channel only owns two of them and the
//! algorithm fills in the rest with sensible constants.
//!
//! Algorithms that must react to a gate edge on the very same sample render
//! one sample at a time ([`SampleVoice`]). The others render a block at a
//! time ([`BlockVoice`]) and are fed through the ring buffers in
//! [`crate::processors`].

use crate::processors::gate::Control;
use crate::NUM_PARAMETERS;

mod bass_drum;
mod bouncing_ball;
mod fm_drum;
mod high_hat;
mod lfo;
mod mini_sequencer;
mod multistage_envelope;
mod number_station;
mod pulse_randomizer;
mod pulse_shaper;
mod snare_drum;

pub use bass_drum::BassDrum;
pub use bouncing_ball::BouncingBall;
pub use fm_drum::FmDrum;
pub use high_hat::HighHat;
pub use lfo::{Lfo, LfoShape};
pub use mini_sequencer::MiniSequencer;
pub use multistage_envelope::{EnvelopeShape, MultistageEnvelope};
pub use number_station::NumberStation;
pub use pulse_randomizer::PulseRandomizer;
pub use pulse_shaper::PulseShaper;
pub use snare_drum::SnareDrum;

/// How many of the four knobs a channel owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    Half,
    #[default]
    Full,
}

pub type Parameters = [u16; NUM_PARAMETERS];

/// Capabilities shared by every algorithm.
pub trait Voice: Send {
    /// Back to power-on state.
    fn init(&mut self);

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode);
}

/// Renders one sample per control byte.
pub trait SampleVoice: Voice {
    fn process(&mut self, control: Control) -> i16;
}

/// Renders a block, one output sample per control byte.
pub trait BlockVoice: Voice {
    fn render(&mut self, control: &[Control], out: &mut [i16]);
}

/// Centre a 0..65535 knob value around zero.
#[inline]
pub(crate) fn bipolar(value: u16) -> i16 {
    (i32::from(value) - 32768) as i16
}
