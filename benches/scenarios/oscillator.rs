//! The digital oscillator, every shape at a mid-range pitch.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use eurodsp::oscillator::{DigitalOscillator, DigitalOscillatorShape};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/oscillator");
    eurodsp::dsp::resources::warm_up();

    for &size in BLOCK_SIZES {
        let sync = vec![0u8; size];
        let mut buffer = vec![0i16; size];

        for shape in DigitalOscillatorShape::ALL {
            let mut oscillator = DigitalOscillator::new();
            oscillator.set_shape(shape);
            oscillator.set_pitch(60 << 7);
            oscillator.set_parameters(20000, 12000);
            oscillator.strike();
            // First render initialises the shape.
            oscillator.render(&sync, &mut buffer);

            group.bench_with_input(
                BenchmarkId::new(shape.name().replace(' ', "_"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        oscillator.render(black_box(&sync), black_box(&mut buffer));
                    })
                },
            );
        }
    }

    group.finish();
}
