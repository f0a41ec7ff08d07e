//! Fixed-point building blocks shared by the voices and the oscillator.
//!
//! Everything here is allocation-free and safe to run inside the audio
//! callback. Lookup tables are built lazily on first access; call
//! [`resources::warm_up`] from a control thread to keep that work off the
//! audio thread.

/// Decaying impulse for striking resonators.
pub mod excitation;
/// Chamberlin state-variable filter with punch.
pub mod filter;
/// Table interpolation and saturation helpers.
pub mod math;
/// Interval prediction for clock-synced modulation.
pub mod pattern_predictor;
/// MIDI pitch to phase increment and period.
pub mod pitch;
pub mod random;
pub mod resources;

pub use excitation::Excitation;
pub use filter::{Svf, SvfMode};
pub use pattern_predictor::PatternPredictor;
pub use random::Random;
