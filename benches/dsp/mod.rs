//! Benchmarks for low-level DSP primitives.

mod excitation;
mod filter;
mod interpolation;

pub use excitation::bench_excitation;
pub use filter::bench_filter;
pub use interpolation::bench_interpolation;
