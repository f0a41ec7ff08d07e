//! One channel per processor function, clocked by a steady gate.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurodsp::processors::gate::{Control, GateDetector};
use eurodsp::processors::{ProcessorFunction, Processors};

use crate::BLOCK_SIZES;

/// Gate period in samples: 8 Hz at 48 kHz.
const CLOCK_PERIOD: usize = 6000;

pub fn bench_processors(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/processors");
    eurodsp::dsp::resources::warm_up();

    for &size in BLOCK_SIZES {
        for function in ProcessorFunction::ALL {
            let mut processors = Processors::new();
            processors.set_function(function);
            processors.set_parameters(&[32768, 24000, 40000, 16384]);
            let mut gate = GateDetector::new();
            let mut clock = 0usize;

            group.bench_with_input(
                BenchmarkId::new(function.name().replace(' ', "_"), size),
                &size,
                |b, &size| {
                    b.iter(|| {
                        let mut acc = 0i32;
                        for _ in 0..size {
                            clock = (clock + 1) % CLOCK_PERIOD;
                            let control: Control = gate.process(clock < CLOCK_PERIOD / 2);
                            processors.buffer();
                            acc += i32::from(processors.process(black_box(control)));
                        }
                        black_box(acc)
                    })
                },
            );
        }
    }

    group.finish();
}
