//! Benchmarks for the state-variable filter in each mode.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurodsp::dsp::{Random, Svf, SvfMode};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    let modes = [
        ("lowpass", SvfMode::LowPass),
        ("bandpass", SvfMode::BandPass),
        ("highpass", SvfMode::HighPass),
    ];

    for &size in BLOCK_SIZES {
        let mut random = Random::new();
        let input: Vec<i32> = (0..size).map(|_| i32::from(random.sample())).collect();

        for (name, mode) in modes {
            let mut svf = Svf::new();
            svf.set_mode(mode);
            svf.set_frequency(60 << 7);
            svf.set_resonance(24000);

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    let mut acc = 0i32;
                    for &x in &input {
                        acc = acc.wrapping_add(svf.process(black_box(x)));
                    }
                    black_box(acc)
                })
            });
        }
    }

    group.finish();
}
