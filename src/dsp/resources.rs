//! Lookup tables, generated once on first use.
//!
//! Every table is computed for [`SAMPLE_RATE`] and laid out for the
//! interpolation helpers in [`super::math`]: 257-entry tables are indexed by
//! the top byte of a 32-bit phase (or the high byte of a 16-bit value) and
//! carry one guard entry for the interpolation neighbour.

use std::f64::consts::PI;

use once_cell::sync::Lazy;

use crate::SAMPLE_RATE;

pub const LUT_SIZE: usize = 257;
pub const LUT_OSCILLATOR_SIZE: usize = 97;
pub const LUT_BOWING_ENVELOPE_SIZE: usize = 752;
pub const LUT_BLOWING_ENVELOPE_SIZE: usize = 392;
pub const LUT_FLUTE_BODY_FILTER_SIZE: usize = 128;
pub const LUT_RESONATOR_SIZE: usize = 129;
pub const LUT_FM_QUANTIZER_SIZE: usize = 129;
pub const WAVE_LENGTH: usize = 129;
pub const NUM_WAVES: usize = 256;

const SR: f64 = SAMPLE_RATE as f64;

fn note_to_frequency(note: f64) -> f64 {
    440.0 * 2f64.powf((note - 69.0) / 12.0)
}

fn to_i16(x: f64) -> i16 {
    x.round().clamp(-32768.0, 32767.0) as i16
}

fn to_u16(x: f64) -> u16 {
    x.round().clamp(0.0, 65535.0) as u16
}

fn to_u32(x: f64) -> u32 {
    x.round().clamp(0.0, u32::MAX as f64) as u32
}

fn table<T, const N: usize>(f: impl Fn(f64) -> T) -> [T; N] {
    std::array::from_fn(|i| f(i as f64))
}

// Waveforms and shapers

pub static WAV_SINE: Lazy<[i16; LUT_SIZE]> =
    Lazy::new(|| table(|i| to_i16(32767.0 * (2.0 * PI * i / 256.0).sin())));

/// Raised cosine window, zero at both ends.
pub static LUT_BELL: Lazy<[u16; LUT_SIZE]> =
    Lazy::new(|| table(|i| to_u16(65535.0 * (0.5 - 0.5 * (2.0 * PI * i / 256.0).cos()))));

fn overdrive(drive: f64) -> [i16; LUT_SIZE] {
    table(|i| {
        let x = (i - 128.0) / 128.0;
        to_i16(32767.0 * (drive * x).tanh() / drive.tanh())
    })
}

pub static WS_MODERATE_OVERDRIVE: Lazy<[i16; LUT_SIZE]> = Lazy::new(|| overdrive(2.0));
pub static WS_VIOLENT_OVERDRIVE: Lazy<[i16; LUT_SIZE]> = Lazy::new(|| overdrive(8.0));

// Filters

/// SVF frequency coefficient indexed by MIDI note, 1.15.
pub static LUT_SVF_CUTOFF: Lazy<[u16; LUT_SIZE]> = Lazy::new(|| {
    table(|i| {
        let f = note_to_frequency(i).min(SR / 2.0);
        to_u16((2.0 * (PI * f / SR).sin() * 32768.0).min(32767.0))
    })
});

/// SVF damping (1/Q), 1.15, indexed by resonance.
pub static LUT_SVF_DAMP: Lazy<[u16; LUT_SIZE]> = Lazy::new(|| {
    table(|i| {
        let headroom = 1.0 - i / 256.0;
        to_u16((2.0 * 32767.0 * headroom.powf(0.9)).min(32767.0))
    })
});

/// Threshold above which a resonant filter's cutoff coefficient starts
/// attenuating its output.
pub static LUT_SVF_SCALE: Lazy<[u16; LUT_SIZE]> = Lazy::new(|| {
    let damp = &*LUT_SVF_DAMP;
    table(|i| to_u16(32767.0 * (f64::from(damp[i as usize]) / 32767.0).sqrt()))
});

/// `2 cos(w)` for two-pole resonators, indexed by MIDI note, capped at a
/// quarter of the sample rate so it stays positive.
pub static LUT_RESONATOR_COEFFICIENT: Lazy<[u16; LUT_RESONATOR_SIZE]> = Lazy::new(|| {
    table(|i| {
        let f = note_to_frequency(i).min(SR / 4.0);
        to_u16(2.0 * (2.0 * PI * f / SR).cos() * 32768.0)
    })
});

/// Input gain of the two-pole resonators, proportional to `sin(w)` so the
/// resonant peak has roughly the same height at every pitch.
pub static LUT_RESONATOR_SCALE: Lazy<[u16; LUT_RESONATOR_SIZE]> = Lazy::new(|| {
    table(|i| {
        let f = note_to_frequency(i).min(SR / 4.0);
        to_u16(3277.0 * (2.0 * PI * f / SR).sin())
    })
});

/// One-pole loop filter coefficient (x/4096) for the wind models.
pub static LUT_FLUTE_BODY_FILTER: Lazy<[u16; LUT_FLUTE_BODY_FILTER_SIZE]> = Lazy::new(|| {
    table(|i| {
        let f = (4.0 * note_to_frequency(i)).min(SR / 2.0);
        to_u16(4096.0 * (1.0 - (-2.0 * PI * f / SR).exp()))
    })
});

// Pitch

/// Phase increments for the octave above the pitch range (notes 128 to
/// 140, in eighths of a semitone). Lower pitches fold down by octaves.
pub static LUT_OSCILLATOR_INCREMENTS: Lazy<[u32; LUT_OSCILLATOR_SIZE]> = Lazy::new(|| {
    table(|i| {
        let f = note_to_frequency(128.0 + i / 8.0);
        to_u32(f / SR * 4_294_967_296.0)
    })
});

/// Period in samples for the same pitches, in 4.28 fixed point.
pub static LUT_OSCILLATOR_DELAYS: Lazy<[u32; LUT_OSCILLATOR_SIZE]> = Lazy::new(|| {
    table(|i| {
        let f = note_to_frequency(128.0 + i / 8.0);
        to_u32(SR / f * 268_435_456.0)
    })
});

/// Snaps the FM modulator ratio to musically useful intervals. Input is the
/// raw parameter's high byte, output a parameter value in the same scale.
pub static LUT_FM_FREQUENCY_QUANTIZER: Lazy<[i16; LUT_FM_QUANTIZER_SIZE]> = Lazy::new(|| {
    const RATIOS: [f64; 14] = [
        0.25, 0.5, 1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 11.0, 13.0,
    ];
    let targets: Vec<f64> = RATIOS.iter().map(|r| 12.0 * r.log2() - 12.0).collect();
    table(|i| {
        let semitones = i - 64.0;
        let snapped = targets
            .iter()
            .copied()
            .find(|t| (t - semitones).abs() < 1.5)
            .unwrap_or(semitones);
        to_i16(16384.0 + snapped * 256.0)
    })
});

// Envelopes and modulation

pub static LUT_ENV_LINEAR: Lazy<[u16; LUT_SIZE]> = Lazy::new(|| table(|i| to_u16(65535.0 * i / 256.0)));

pub static LUT_ENV_EXPO: Lazy<[u16; LUT_SIZE]> = Lazy::new(|| {
    table(|i| {
        let t = i / 256.0;
        to_u16(65535.0 * (1.0 - (-4.0 * t).exp()) / (1.0 - (-4.0f64).exp()))
    })
});

pub static LUT_ENV_QUARTIC: Lazy<[u16; LUT_SIZE]> = Lazy::new(|| {
    table(|i| {
        let t = i / 256.0;
        to_u16(65535.0 * (1.0 - (1.0 - t).powi(4)))
    })
});

/// Segment phase increments for times from 1 ms to 10 s.
pub static LUT_ENV_INCREMENTS: Lazy<[u32; LUT_SIZE]> = Lazy::new(|| {
    table(|i| {
        let seconds = 0.001 * 10f64.powf(4.0 * i / 256.0);
        to_u32(4_294_967_296.0 / (seconds * SR))
    })
});

/// LFO phase increments from 0.05 Hz to about 100 Hz.
pub static LUT_LFO_INCREMENTS: Lazy<[u32; LUT_SIZE]> = Lazy::new(|| {
    table(|i| {
        let f = 0.05 * 2f64.powf(11.0 * i / 256.0);
        to_u32(f / SR * 4_294_967_296.0)
    })
});

pub static LUT_RAISED_COSINE: Lazy<[u16; LUT_SIZE]> =
    Lazy::new(|| table(|i| to_u16(65535.0 * (0.5 - 0.5 * (PI * i / 256.0).cos()))));

/// Pulse durations in samples, 0.5 ms to 4 s.
pub static LUT_PULSE_TIMES: Lazy<[u32; LUT_SIZE]> = Lazy::new(|| {
    table(|i| {
        let seconds = 0.0005 * 8000f64.powf(i / 256.0);
        to_u32(seconds * SR).max(1)
    })
});

// Granular and physical models

/// Grain window: a Hann window over the first 256 entries, silent guard.
pub static LUT_GRANULAR_ENVELOPE: Lazy<[u16; LUT_SIZE]> = Lazy::new(|| {
    table(|i| {
        if i >= 256.0 {
            0
        } else {
            to_u16(65535.0 * (0.5 - 0.5 * (2.0 * PI * i / 256.0).cos()))
        }
    })
});

/// Envelope phase increment (before the `<< 3`) for grains of 100 ms down to
/// 5 ms.
pub static LUT_GRANULAR_ENVELOPE_RATE: Lazy<[u16; 256]> = Lazy::new(|| {
    table(|i| {
        let seconds = 0.1 * 0.05f64.powf(i / 255.0);
        to_u16(16_777_216.0 / (seconds * SR) / 8.0)
    })
});

pub static LUT_BOWING_ENVELOPE: Lazy<[i16; LUT_BOWING_ENVELOPE_SIZE]> =
    Lazy::new(|| table(|i| to_i16(6553.0 * (1.0 - (-i / 64.0).exp()))));

/// Bow-string friction curve (1.15), indexed by relative velocity.
pub static LUT_BOWING_FRICTION: Lazy<[u16; LUT_SIZE]> = Lazy::new(|| {
    table(|i| {
        let x = i / 256.0;
        to_u16(32767.0 * (x * 5.0 + 0.75).powi(-4).min(0.98))
    })
});

pub static LUT_BLOWING_ENVELOPE: Lazy<[i16; LUT_BLOWING_ENVELOPE_SIZE]> =
    Lazy::new(|| table(|i| to_i16(16000.0 * (1.0 - (-i / 40.0).exp()))));

/// Cubic jet nonlinearity, indexed by jet pressure offset by half scale.
pub static LUT_BLOWING_JET: Lazy<[i16; LUT_SIZE]> = Lazy::new(|| {
    table(|i| {
        let x = (i - 128.0) / 128.0;
        to_i16(32767.0 * (2.598 * x * (x * x - 1.0)).clamp(-1.0, 1.0))
    })
});

// Formants

/// 16 phases x 16 amplitudes, small enough that three formants times 255
/// stay in range.
pub static WAV_FORMANT_SINE: Lazy<[i16; 256]> = Lazy::new(|| {
    table(|i| {
        let phase = (i / 16.0).floor();
        let amplitude = i % 16.0;
        to_i16(40.0 * amplitude / 15.0 * (2.0 * PI * phase / 16.0).sin())
    })
});

pub static WAV_FORMANT_SQUARE: Lazy<[i16; 256]> = Lazy::new(|| {
    table(|i| {
        let phase = (i / 16.0).floor();
        let amplitude = i % 16.0;
        let sign = if phase < 8.0 { 1.0 } else { -1.0 };
        to_i16(sign * 40.0 * amplitude / 15.0)
    })
});

// Wavetables

/// One single-cycle wave, values in [-1, 1]. Waves come in 16 families of 16
/// steps; each family morphs smoothly as the step increases.
fn wave_shape(wave: usize, t: f64) -> f64 {
    let family = wave / 16;
    let step = (wave % 16) as f64 / 15.0;
    let harmonic = |n: f64, phase: f64| (2.0 * PI * n * t + phase).sin();
    match family {
        // Bandlimited saw opening up.
        0 => (1..=(2 + (step * 30.0) as usize))
            .map(|n| harmonic(n as f64, 0.0) / n as f64)
            .sum(),
        // Square to narrow pulse.
        1 => (1..=24)
            .map(|n| {
                let n = n as f64;
                let width = 0.5 - 0.45 * step;
                (PI * n * width).sin() * harmonic(n, 0.0) / n
            })
            .sum(),
        // Formant sweep: a sine burst whose partial climbs.
        2 => harmonic(1.0 + step * 12.0, 0.0) * (0.5 - 0.5 * (2.0 * PI * t).cos()),
        // Odd harmonics, brightening.
        3 => (0..12)
            .map(|k| {
                let n = (2 * k + 1) as f64;
                harmonic(n, 0.0) * (-n * (1.2 - step)).exp()
            })
            .sum(),
        // Bell-like inharmonic pairs folded into the cycle.
        4 => harmonic(1.0, 0.0) + step * harmonic(3.0, 0.3) + step * step * harmonic(7.0, 1.1),
        // Sine folding.
        5 => ((1.0 + 4.0 * step) * harmonic(1.0, 0.0)).sin(),
        // Organ drawbars.
        6 => [1.0, 2.0, 3.0, 4.0, 6.0, 8.0]
            .iter()
            .enumerate()
            .map(|(k, &n)| harmonic(n, 0.0) * if (k as f64) <= step * 6.0 { 1.0 } else { 0.1 })
            .sum(),
        // Sync-like sweep.
        7 => {
            let ratio = 1.0 + step * 7.0;
            (2.0 * PI * ratio * t).sin() * (1.0 - t)
        }
        // Triangle to saw.
        8 => {
            let peak = 0.5 + 0.49 * step;
            if t < peak {
                2.0 * t / peak - 1.0
            } else {
                1.0 - 2.0 * (t - peak) / (1.0 - peak)
            }
        }
        // Vocal-ish: two resonant peaks.
        9 => (1..=20)
            .map(|n| {
                let n = n as f64;
                let f1 = 3.0 + 5.0 * step;
                let f2 = 9.0 + 6.0 * step;
                let gain = (-((n - f1) / 1.5).powi(2)).exp() + 0.6 * (-((n - f2) / 2.0).powi(2)).exp();
                harmonic(n, 0.0) * gain
            })
            .sum(),
        // Even harmonics.
        10 => harmonic(1.0, 0.0) + (1..8).map(|k| step * harmonic(2.0 * k as f64, 0.0) / k as f64).sum::<f64>(),
        // Metallic clusters.
        11 => (1..6)
            .map(|k| harmonic((k * k) as f64 + (step * 4.0).floor(), k as f64))
            .sum(),
        // Stepped waves (bit reduction).
        12 => {
            let levels = 2.0 + (1.0 - step) * 14.0;
            ((2.0 * PI * t).sin() * levels).round() / levels
        }
        // Pulse-width modulated saw.
        13 => {
            let saw = 2.0 * t - 1.0;
            if t < 0.5 + 0.4 * step { saw } else { -saw }
        }
        // Noise-like random phases, reproducible per wave.
        14 => (1..16)
            .map(|n| {
                let phase = ((wave * 31 + n * 17) % 97) as f64;
                harmonic(n as f64, phase) / (n as f64).sqrt()
            })
            .sum(),
        // Pure sine towards a fifth dyad.
        _ => harmonic(1.0, 0.0) + step * harmonic(1.5 * 2.0, 0.0),
    }
}

/// 256 single-cycle waves of 129 unsigned bytes, the last byte repeating
/// the first.
pub static WAV_WAVES: Lazy<Vec<u8>> = Lazy::new(|| {
    let mut data = Vec::with_capacity(NUM_WAVES * WAVE_LENGTH);
    for wave in 0..NUM_WAVES {
        let raw: Vec<f64> = (0..128).map(|i| wave_shape(wave, i as f64 / 128.0)).collect();
        let peak = raw.iter().fold(0.0f64, |m, v| m.max(v.abs())).max(1e-9);
        let bytes: Vec<u8> = raw
            .iter()
            .map(|v| (128.0 + 127.0 * v / peak).round().clamp(0.0, 255.0) as u8)
            .collect();
        data.extend_from_slice(&bytes);
        data.push(bytes[0]);
    }
    data
});

/// Wave `index` of [`WAV_WAVES`].
pub fn wave(index: usize) -> &'static [u8] {
    let start = index * WAVE_LENGTH;
    &WAV_WAVES[start..start + WAVE_LENGTH]
}

/// 16x16 grid used by the wave map: rows walk families, columns walk steps,
/// with every other row reversed so neighbouring cells stay similar.
pub static WT_MAP: Lazy<[u8; 256]> = Lazy::new(|| {
    std::array::from_fn(|i| {
        let row = i / 16;
        let column = i % 16;
        let column = if row % 2 == 1 { 15 - column } else { column };
        (row * 16 + column) as u8
    })
});

const MORSE_MESSAGE: &str = "CQ CQ DE EURODSP";

fn morse(c: char) -> &'static str {
    match c {
        'A' => ".-",
        'B' => "-...",
        'C' => "-.-.",
        'D' => "-..",
        'E' => ".",
        'F' => "..-.",
        'G' => "--.",
        'H' => "....",
        'I' => "..",
        'J' => ".---",
        'K' => "-.-",
        'L' => ".-..",
        'M' => "--",
        'N' => "-.",
        'O' => "---",
        'P' => ".--.",
        'Q' => "--.-",
        'R' => ".-.",
        'S' => "...",
        'T' => "-",
        'U' => "..-",
        'V' => "...-",
        'W' => ".--",
        'X' => "-..-",
        'Y' => "-.--",
        'Z' => "--..",
        _ => "",
    }
}

/// Morse message packed four 2-bit symbols per byte, least significant
/// first. Symbols alternate between "on" and "off" durations: 0 is one dit,
/// 1 three, 2 seven, and 3 ends the message.
pub static WT_CODE: Lazy<[u8; 256]> = Lazy::new(|| {
    let mut symbols: Vec<u8> = Vec::new();
    let words: Vec<&str> = MORSE_MESSAGE.split(' ').collect();
    for (w, word) in words.iter().enumerate() {
        let letters: Vec<char> = word.chars().collect();
        for (l, letter) in letters.iter().enumerate() {
            let elements: Vec<char> = morse(*letter).chars().collect();
            for (e, element) in elements.iter().enumerate() {
                symbols.push(if *element == '-' { 1 } else { 0 });
                let gap = if e + 1 < elements.len() {
                    0
                } else if l + 1 < letters.len() {
                    1
                } else if w + 1 < words.len() {
                    2
                } else {
                    3
                };
                symbols.push(gap);
            }
        }
    }
    let mut code = [0xffu8; 256];
    for (i, symbol) in symbols.iter().enumerate().take(1024) {
        let byte = &mut code[i / 4];
        let shift = (i % 4) * 2;
        *byte = (*byte & !(3 << shift)) | (symbol << shift);
    }
    code
});

/// Force every table to be built now.
pub fn warm_up() {
    Lazy::force(&WAV_SINE);
    Lazy::force(&LUT_BELL);
    Lazy::force(&WS_MODERATE_OVERDRIVE);
    Lazy::force(&WS_VIOLENT_OVERDRIVE);
    Lazy::force(&LUT_SVF_CUTOFF);
    Lazy::force(&LUT_SVF_DAMP);
    Lazy::force(&LUT_SVF_SCALE);
    Lazy::force(&LUT_RESONATOR_COEFFICIENT);
    Lazy::force(&LUT_RESONATOR_SCALE);
    Lazy::force(&LUT_FLUTE_BODY_FILTER);
    Lazy::force(&LUT_OSCILLATOR_INCREMENTS);
    Lazy::force(&LUT_OSCILLATOR_DELAYS);
    Lazy::force(&LUT_FM_FREQUENCY_QUANTIZER);
    Lazy::force(&LUT_ENV_LINEAR);
    Lazy::force(&LUT_ENV_EXPO);
    Lazy::force(&LUT_ENV_QUARTIC);
    Lazy::force(&LUT_ENV_INCREMENTS);
    Lazy::force(&LUT_LFO_INCREMENTS);
    Lazy::force(&LUT_RAISED_COSINE);
    Lazy::force(&LUT_PULSE_TIMES);
    Lazy::force(&LUT_GRANULAR_ENVELOPE);
    Lazy::force(&LUT_GRANULAR_ENVELOPE_RATE);
    Lazy::force(&LUT_BOWING_ENVELOPE);
    Lazy::force(&LUT_BOWING_FRICTION);
    Lazy::force(&LUT_BLOWING_ENVELOPE);
    Lazy::force(&LUT_BLOWING_JET);
    Lazy::force(&WAV_FORMANT_SINE);
    Lazy::force(&WAV_FORMANT_SQUARE);
    Lazy::force(&WAV_WAVES);
    Lazy::force(&WT_MAP);
    Lazy::force(&WT_CODE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_is_periodic_and_full_scale() {
        assert_eq!(WAV_SINE[0], 0);
        assert_eq!(WAV_SINE[64], 32767);
        assert_eq!(WAV_SINE[192], -32767);
        assert_eq!(WAV_SINE[256], WAV_SINE[0]);
    }

    #[test]
    fn oscillator_increments_span_one_octave() {
        let first = LUT_OSCILLATOR_INCREMENTS[0] as f64;
        let last = LUT_OSCILLATOR_INCREMENTS[96] as f64;
        assert!((last / first - 2.0).abs() < 1e-6);
        assert!(LUT_OSCILLATOR_INCREMENTS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn damping_decreases_with_resonance() {
        assert!(LUT_SVF_DAMP.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(LUT_SVF_DAMP[0], 32767);
    }

    #[test]
    fn waves_are_closed_loops() {
        for index in [0, 17, 128, 255] {
            let w = wave(index);
            assert_eq!(w.len(), WAVE_LENGTH);
            assert_eq!(w[0], w[128]);
        }
    }

    #[test]
    fn morse_code_terminates() {
        let has_end = WT_CODE
            .iter()
            .any(|byte| (0..4).any(|k| (byte >> (k * 2)) & 3 == 3));
        assert!(has_end);
    }

    #[test]
    fn fm_quantizer_snaps_unison() {
        // Unison sits at semitone offset -12 relative to the modulator's
        // fixed octave-up transposition.
        let unison = 64 - 12;
        assert_eq!(LUT_FM_FREQUENCY_QUANTIZER[unison], to_i16(16384.0 - 12.0 * 256.0));
        assert_eq!(LUT_FM_FREQUENCY_QUANTIZER[unison + 1], LUT_FM_FREQUENCY_QUANTIZER[unison]);
    }
}
