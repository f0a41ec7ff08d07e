//! Both channels through the engine, the way the audio callback drives it.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurodsp::engine::{EditMode, Engine, Function, Settings};

use crate::BLOCK_SIZES;

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");
    eurodsp::dsp::resources::warm_up();

    let setups = [
        ("drums_twin", EditMode::Twin, [Function::DrumGenerator; 2]),
        ("lfo_split", EditMode::Split, [Function::Lfo; 2]),
        (
            "envelope_and_fm_drum",
            EditMode::First,
            [Function::Envelope, Function::FmDrumGenerator],
        ),
    ];

    for &size in BLOCK_SIZES {
        for (name, edit_mode, function) in setups {
            let mut engine = Engine::with_settings(&Settings {
                edit_mode,
                function,
                pot_value: [128; 8],
                snap_mode: false,
            });
            let mut clock = 0u32;

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
                b.iter(|| {
                    let mut acc = 0u32;
                    for _ in 0..size {
                        clock = clock.wrapping_add(1);
                        let gates = if clock % 4800 < 2400 { 0b11 } else { 0 };
                        engine.poll();
                        let [first, second] = engine.tick(black_box(gates), 0);
                        acc += u32::from(first) + u32::from(second);
                    }
                    black_box(acc)
                })
            });
        }
    }

    group.finish();
}
