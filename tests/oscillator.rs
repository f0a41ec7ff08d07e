use eurodsp::oscillator::{DigitalOscillator, DigitalOscillatorShape};

fn oscillator(shape: DigitalOscillatorShape, pitch: i16, timbre: u16, color: u16) -> DigitalOscillator {
    let mut oscillator = DigitalOscillator::new();
    oscillator.set_shape(shape);
    oscillator.set_pitch(pitch);
    oscillator.set_parameters(timbre, color);
    oscillator
}

fn render(oscillator: &mut DigitalOscillator, blocks: usize, size: usize) -> Vec<i16> {
    let mut out = Vec::with_capacity(blocks * size);
    let mut buffer = vec![0i16; size];
    let sync = vec![0u8; size];
    for _ in 0..blocks {
        oscillator.render(&sync, &mut buffer);
        out.extend_from_slice(&buffer);
    }
    out
}

#[test]
fn every_shape_survives_the_parameter_corners() {
    for shape in DigitalOscillatorShape::ALL {
        for pitch in [0, 60 << 7, 127 << 7] {
            for (timbre, color) in [(0, 0), (65535, 65535), (0, 65535), (32768, 16384)] {
                for size in [1, 5, 24] {
                    let mut oscillator = oscillator(shape, pitch, timbre, color);
                    oscillator.strike();
                    let out = render(&mut oscillator, 8, size);
                    assert_eq!(out.len(), 8 * size, "{shape}");
                }
            }
        }
    }
}

fn strike_roll(oscillator: &mut DigitalOscillator, blocks: usize) -> Vec<i16> {
    let mut out = Vec::with_capacity(blocks * 24);
    let mut buffer = [0i16; 24];
    for _ in 0..blocks {
        oscillator.strike();
        oscillator.render(&[], &mut buffer);
        out.extend_from_slice(&buffer);
    }
    out
}

#[test]
fn every_shape_survives_a_strike_roll_at_extreme_pitches() {
    for shape in DigitalOscillatorShape::ALL {
        for pitch in [i16::MIN, 0, 60 << 7, 140 << 7, i16::MAX] {
            for (timbre, color) in [(0, 0), (32768, 65535), (65535, 65535)] {
                let mut a = oscillator(shape, pitch, timbre, color);
                let mut b = oscillator(shape, pitch, timbre, color);
                let out = strike_roll(&mut a, 100);
                assert_eq!(out.len(), 100 * 24, "{shape}");
                assert_eq!(out, strike_roll(&mut b, 100), "{shape} at pitch {pitch}");
            }
        }
    }
}

#[test]
fn rendering_is_deterministic() {
    for shape in DigitalOscillatorShape::ALL {
        let mut a = oscillator(shape, 48 << 7, 20000, 40000);
        let mut b = oscillator(shape, 48 << 7, 20000, 40000);
        assert_eq!(render(&mut a, 20, 24), render(&mut b, 20, 24), "{shape}");
    }
}

#[test]
fn tonal_shapes_are_not_silent() {
    use DigitalOscillatorShape as S;
    for shape in [
        S::TripleRingMod,
        S::Toy,
        S::Vosim,
        S::Harmonics,
        S::Fm,
        S::Wavetables,
        S::WaveMap,
        S::DigitalModulation,
    ] {
        let mut oscillator = oscillator(shape, 60 << 7, 32768, 32768);
        let out = render(&mut oscillator, 40, 24);
        let peak = out.iter().map(|&s| i32::from(s).abs()).max().unwrap_or(0);
        assert!(peak > 1000, "{shape}: peak {peak}");
    }
}

#[test]
fn switching_shape_starts_from_a_clean_state() {
    use DigitalOscillatorShape as S;
    for (from, to) in [
        (S::Plucked, S::TripleRingMod),
        (S::Bowed, S::Toy),
        (S::GranularCloud, S::Vosim),
        (S::Kick, S::Harmonics),
        (S::Snare, S::Kick),
    ] {
        let mut switched = oscillator(from, 60 << 7, 30000, 30000);
        render(&mut switched, 10, 24);
        switched.set_shape(to);
        let mut fresh = oscillator(to, 60 << 7, 30000, 30000);
        assert_eq!(
            render(&mut switched, 10, 24),
            render(&mut fresh, 10, 24),
            "{from} -> {to}"
        );
    }
}

#[test]
fn hard_sync_restarts_the_waveform() {
    let shape = DigitalOscillatorShape::TripleRingMod;
    let mut free = vec![0i16; 64];
    oscillator(shape, 60 << 7, 0, 0).render(&[], &mut free);

    let mut sync = vec![0u8; 64];
    sync[32] = 1;
    let mut synced = vec![0i16; 64];
    oscillator(shape, 60 << 7, 0, 0).render(&sync, &mut synced);

    assert_eq!(free[..32], synced[..32]);
    assert_ne!(free[32..], synced[32..]);
}
