//! Real-world scenario benchmarks.
//!
//! A channel per function, the oscillator per shape, and the full engine
//! with both channels and a running clock.

mod engine;
mod oscillator;
mod processors;

pub use engine::bench_engine;
pub use oscillator::bench_oscillator;
pub use processors::bench_processors;
