//! Benchmarks for the decaying excitation pulse.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurodsp::dsp::Excitation;

use crate::BLOCK_SIZES;

pub fn bench_excitation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/excitation");

    for &size in BLOCK_SIZES {
        let mut pulse = Excitation::new();
        pulse.set_delay(4);
        pulse.set_decay(4000);

        group.bench_with_input(BenchmarkId::new("retriggered", size), &size, |b, &size| {
            b.iter(|| {
                pulse.trigger(black_box(32767));
                let mut acc = 0i32;
                for _ in 0..size {
                    acc = acc.wrapping_add(pulse.process());
                }
                black_box(acc)
            })
        });
    }

    group.finish();
}
