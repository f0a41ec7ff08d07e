//! Fixed-point percussion, modulation and oscillator engine.
//!
//! The crate is organised leaves first:
//!
//! - [`dsp`]: table interpolation, noise, lookup tables, [`dsp::Excitation`]
//!   and [`dsp::Svf`]
//! - [`voices`]: the per-channel voice algorithms (drums, envelopes, LFOs,
//!   pulse utilities)
//! - [`processors`]: the per-channel dispatcher plus the control byte and
//!   ring buffer plumbing
//! - [`oscillator`]: the audio-rate [`oscillator::DigitalOscillator`]
//! - [`engine`]: two channels wired together, settings and calibration
//!
//! Everything on the per-sample path is integer arithmetic on plain values:
//! no allocation, no locks and no errors.

pub mod dsp;
pub mod engine;
pub mod error;
pub mod io;
pub mod oscillator;
pub mod processors;
pub mod voices;

pub use error::{Error, Result};

/// Rate every table and time constant is computed for.
pub const SAMPLE_RATE: u32 = 48_000;
/// Number of samples rendered per call by buffered algorithms.
pub const BLOCK_SIZE: usize = 16;
pub const NUM_CHANNELS: usize = 2;
pub const NUM_PARAMETERS: usize = 4;
