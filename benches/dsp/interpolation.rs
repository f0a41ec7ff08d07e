//! Benchmarks for table lookups at audio rate.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurodsp::dsp::math::{crossfade_u8, interpolate824, interpolate88};
use eurodsp::dsp::resources::{wave, WAV_SINE, WS_MODERATE_OVERDRIVE};

use crate::BLOCK_SIZES;

pub fn bench_interpolation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/interpolation");
    eurodsp::dsp::resources::warm_up();

    for &size in BLOCK_SIZES {
        let increment = 0x0123_4567u32;

        group.bench_with_input(BenchmarkId::new("sine_824", size), &size, |b, &size| {
            b.iter(|| {
                let mut phase = 0u32;
                let mut acc = 0i32;
                for _ in 0..size {
                    phase = phase.wrapping_add(increment);
                    acc += i32::from(interpolate824(&WAV_SINE[..], black_box(phase)));
                }
                black_box(acc)
            })
        });

        group.bench_with_input(BenchmarkId::new("overdrive_88", size), &size, |b, &size| {
            b.iter(|| {
                let mut acc = 0i32;
                for i in 0..size {
                    let index = (i as u16).wrapping_mul(127);
                    acc += i32::from(interpolate88(&WS_MODERATE_OVERDRIVE[..], black_box(index)));
                }
                black_box(acc)
            })
        });

        group.bench_with_input(BenchmarkId::new("wave_crossfade", size), &size, |b, &size| {
            b.iter(|| {
                let mut phase = 0u32;
                let mut acc = 0i32;
                for _ in 0..size {
                    phase = phase.wrapping_add(increment);
                    acc += i32::from(crossfade_u8(wave(3), wave(4), phase, black_box(20000)));
                }
                black_box(acc)
            })
        });
    }

    group.finish();
}
