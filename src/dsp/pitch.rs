//! Pitch (MIDI note in 7.7 fixed point) to phase increment and period.

use crate::dsp::resources::{LUT_OSCILLATOR_DELAYS, LUT_OSCILLATOR_INCREMENTS};

pub const OCTAVE: i32 = 12 * 128;
pub const PITCH_TABLE_START: i32 = 128 * 128;
pub const HIGHEST_NOTE: i32 = 140 * 128;

/// Fold `pitch - PITCH_TABLE_START` up into the table octave, returning the
/// folded offset and the number of octaves folded.
fn fold(pitch: i32) -> (i32, u32) {
    let mut reference = pitch - PITCH_TABLE_START;
    let mut shifts = 0;
    while reference < 0 {
        reference += OCTAVE;
        shifts += 1;
    }
    (reference, shifts)
}

fn lookup(table: &[u32], reference: i32) -> u32 {
    let index = (reference >> 4) as usize;
    let a = i64::from(table[index]);
    let b = i64::from(table[index + 1]);
    (a + (((b - a) * i64::from(reference & 0xf)) >> 4)) as u32
}

/// 32-bit phase increment per sample for `pitch`.
pub fn compute_phase_increment(pitch: i16) -> u32 {
    let pitch = i32::from(pitch).min(PITCH_TABLE_START - 1);
    let (reference, shifts) = fold(pitch);
    lookup(&*LUT_OSCILLATOR_INCREMENTS, reference)
        .checked_shr(shifts)
        .unwrap_or(0)
}

/// Period of `pitch` in samples, 16.16 fixed point.
pub fn compute_delay(pitch: i16) -> u32 {
    let pitch = i32::from(pitch).clamp(0, HIGHEST_NOTE - OCTAVE);
    let (reference, shifts) = fold(pitch);
    lookup(&*LUT_OSCILLATOR_DELAYS, reference) >> (12 - shifts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_increment_is_monotonic() {
        let mut previous = 0;
        for pitch in (0..16384).step_by(7) {
            let increment = compute_phase_increment(pitch as i16);
            assert!(increment >= previous, "pitch {pitch}");
            previous = increment;
        }
    }

    #[test]
    fn phase_increment_doubles_per_octave() {
        for pitch in [24 << 7, 48 << 7, (60 << 7) + 37, 90 << 7] {
            let low = f64::from(compute_phase_increment(pitch));
            let high = f64::from(compute_phase_increment(pitch + OCTAVE as i16));
            assert!((high / low - 2.0).abs() < 1e-3, "pitch {pitch}");
        }
    }

    #[test]
    fn a4_is_440_hz() {
        let increment = f64::from(compute_phase_increment(69 << 7));
        let frequency = increment / 4_294_967_296.0 * 48_000.0;
        assert!((frequency - 440.0).abs() < 0.5, "{frequency}");
    }

    #[test]
    fn delay_matches_period() {
        let delay = f64::from(compute_delay(69 << 7)) / 65536.0;
        assert!((delay - 48_000.0 / 440.0).abs() < 0.5, "{delay}");
    }

    #[test]
    fn extreme_pitches_do_not_panic() {
        compute_phase_increment(i16::MIN);
        compute_phase_increment(i16::MAX);
        compute_delay(i16::MIN);
        compute_delay(i16::MAX);
    }
}
