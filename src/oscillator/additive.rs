//! Additive shapes: a bank of harmonics with a movable spectral peak, and the
//! inharmonic partials of a struck bell and a drum head.

use crate::dsp::math::{clip, interpolate824_u16};
use crate::dsp::resources::LUT_SVF_CUTOFF;
use crate::oscillator::state::{NUM_ADDITIVE_HARMONICS, NUM_BELL_PARTIALS, NUM_DRUM_PARTIALS};
use crate::oscillator::{increment_for, sine, synced, write_pair, DigitalOscillator};

/// Partial offsets from the fundamental, in 7.7 semitones.
const BELL_PARTIALS: [i16; NUM_BELL_PARTIALS] = [
    -1284, -1283, -184, -183, 385, 1175, 1536, 2233, 2434, 2934, 3110,
];
const BELL_AMPLITUDES: [i32; NUM_BELL_PARTIALS] = [
    8192, 5488, 8192, 14745, 21872, 13680, 11960, 10895, 10895, 6144, 10895,
];
const BELL_DECAY_LONG: [i32; NUM_BELL_PARTIALS] = [
    65533, 65533, 65533, 65532, 65531, 65531, 65530, 65529, 65527, 65523, 65519,
];
const BELL_DECAY_SHORT: [i32; NUM_BELL_PARTIALS] = [
    65308, 65283, 65186, 65123, 64839, 64889, 64632, 64409, 64038, 63302, 62575,
];

const DRUM_PARTIALS: [i16; NUM_DRUM_PARTIALS] = [0, 0, 1041, 1747, 1846, 3072];
const DRUM_AMPLITUDES: [i32; NUM_DRUM_PARTIALS] = [16986, 2654, 3981, 5308, 3981, 2985];
const DRUM_DECAY_LONG: [i32; NUM_DRUM_PARTIALS] = [65533, 65531, 65531, 65531, 65531, 65516];
const DRUM_DECAY_SHORT: [i32; NUM_DRUM_PARTIALS] = [65083, 64715, 64715, 64715, 64715, 62312];

/// Bell partials updated per block. The rest keep their previous settings.
const PARTIALS_PER_BLOCK: usize = 3;

/// Timbre above this lets partials ring forever.
const SUSTAIN_THRESHOLD: i16 = 32000;

/// Per-partial decay for `timbre`, between the long and short settings.
fn decay(timbre: i16, long: i32, short: i32) -> i32 {
    let balance = i32::from((32767 - timbre) >> 8);
    let balance = (balance * balance) >> 7;
    long - (((long - short) * balance) >> 7)
}

impl DigitalOscillator {
    /// Twelve harmonics whose amplitudes follow two bumps: timbre moves the
    /// main peak, color widens it and raises a second one an octave below.
    pub(crate) fn render_harmonics(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let increment = self.phase_increment << 1;

        let peak = (NUM_ADDITIVE_HARMONICS as i32 * i32::from(self.parameter[0])) >> 7;
        let second_peak = (peak >> 1) + NUM_ADDITIVE_HARMONICS as i32 * 128;
        let color = i32::from(self.parameter[1]);
        let second_peak_amount = (color * color) >> 15;
        let sqrtsqrt_width = if color < 16384 { color >> 6 } else { 511 - (color >> 6) };
        let sqrt_width = (sqrtsqrt_width * sqrtsqrt_width) >> 10;
        let width = sqrt_width * sqrt_width + 4;

        let mut target = [0i32; NUM_ADDITIVE_HARMONICS];
        let mut total = 0i32;
        for (i, gain) in target.iter_mut().enumerate() {
            let x = (i as i32) << 8;
            let d = x - peak;
            let mut g = 32768 * 128 / (128 + d * d / width);
            let d = x - second_peak;
            g += second_peak_amount * 128 / (128 + d * d / width);
            total += g;
            *gain = g;
        }
        let attenuation = i64::from(i32::MAX / total.max(1));
        for (i, gain) in target.iter_mut().enumerate() {
            *gain = if (increment >> 16) as usize * (i + 1) > 0x4000 {
                0
            } else {
                ((i64::from(*gain) * attenuation) >> 16) as i32
            };
        }

        let amplitude = &mut self.state.harmonics.amplitude;
        let mut phase = self.phase;
        let mut previous = self.state.additive.previous_sample;
        for (n, pair) in buffer.chunks_mut(2).enumerate() {
            phase = phase.wrapping_add(increment);
            if synced(sync, 2 * n) || synced(sync, 2 * n + 1) {
                phase = 0;
            }
            let mut out = 0i32;
            for (i, (gain, target)) in amplitude.iter_mut().zip(target.iter()).enumerate() {
                let harmonic_phase = phase.wrapping_mul(i as u32 + 1);
                out += (sine(harmonic_phase) * *gain) >> 15;
                *gain += (target - *gain) >> 8;
            }
            let out = clip(out);
            write_pair(pair, previous, out);
            previous = out;
        }
        self.state.additive.previous_sample = previous;
        self.phase = phase;
    }

    pub(crate) fn render_struck_bell(&mut self, buffer: &mut [i16]) {
        let additive = &mut self.state.additive;
        let mut first_partial = additive.current_partial;
        let mut last_partial = (first_partial + PARTIALS_PER_BLOCK).min(NUM_BELL_PARTIALS);
        additive.current_partial = (first_partial + PARTIALS_PER_BLOCK) % NUM_BELL_PARTIALS;

        if self.strike {
            additive.partial_amplitude = BELL_AMPLITUDES;
            additive.partial_phase = [1 << 30; NUM_BELL_PARTIALS];
            self.strike = false;
            first_partial = 0;
            last_partial = NUM_BELL_PARTIALS;
        }

        let pitch = i32::from(self.pitch);
        let detune = i32::from(self.parameter[1] >> 7);
        for i in first_partial..last_partial {
            let partial_pitch = pitch + i32::from(BELL_PARTIALS[i]);
            let partial_pitch = if i % 2 == 1 { partial_pitch + detune } else { partial_pitch - detune };
            additive.partial_phase_increment[i] = increment_for(partial_pitch) << 1;
        }
        if self.parameter[0] < SUSTAIN_THRESHOLD {
            for i in 0..NUM_BELL_PARTIALS {
                let decay = decay(self.parameter[0], BELL_DECAY_LONG[i], BELL_DECAY_SHORT[i]);
                additive.partial_amplitude[i] = (additive.partial_amplitude[i] * decay) >> 16;
            }
        }

        let mut previous = additive.previous_sample;
        for pair in buffer.chunks_mut(2) {
            let mut out = 0i32;
            for i in 0..NUM_BELL_PARTIALS {
                additive.partial_phase[i] =
                    additive.partial_phase[i].wrapping_add(additive.partial_phase_increment[i]);
                out += (sine(additive.partial_phase[i]) * additive.partial_amplitude[i]) >> 17;
            }
            let out = clip(out);
            write_pair(pair, previous, out);
            previous = out;
        }
        additive.previous_sample = previous;
    }

    pub(crate) fn render_struck_drum(&mut self, buffer: &mut [i16]) {
        let additive = &mut self.state.additive;
        if self.strike {
            let reset_phase = additive.partial_amplitude[0] < 1024;
            for i in 0..NUM_DRUM_PARTIALS {
                additive.target_partial_amplitude[i] = DRUM_AMPLITUDES[i];
                if reset_phase {
                    additive.partial_phase[i] = 1 << 30;
                }
            }
            self.strike = false;
        } else if self.parameter[0] < SUSTAIN_THRESHOLD {
            for i in 0..NUM_DRUM_PARTIALS {
                let decay = decay(self.parameter[0], DRUM_DECAY_LONG[i], DRUM_DECAY_SHORT[i]);
                additive.target_partial_amplitude[i] =
                    (additive.partial_amplitude[i] * decay) >> 16;
            }
        }

        let pitch = i32::from(self.pitch);
        let mut increments = [0u32; NUM_DRUM_PARTIALS];
        for (increment, offset) in increments.iter_mut().zip(DRUM_PARTIALS) {
            *increment = increment_for(pitch + i32::from(offset)) << 1;
        }

        let color = i32::from(self.parameter[1]);
        let cutoff = (pitch - 12 * 128 + (color >> 2)).clamp(0, 32767) as u32;
        let f = i32::from(interpolate824_u16(&*LUT_SVF_CUTOFF, cutoff << 16));
        let harmonics_gain = i64::from(if color < 12888 { color + 4096 } else { 16384 });
        let noise_mode_gain = i64::from(((color - 16384).max(0) * 12888) >> 14);
        let fade_increment = 65536 / buffer.len() as i32;

        let mut fade = 0i32;
        let mut previous = additive.previous_sample;
        for pair in buffer.chunks_mut(2) {
            fade += fade_increment;

            // Two-pole low-passed noise modulates the ring partials.
            let noise = i32::from(self.random.sample()).clamp(-16384, 16384);
            let lp = &mut additive.lp_noise;
            lp[0] += ((noise - lp[0]) * f) >> 15;
            lp[1] += ((lp[0] - lp[1]) * f) >> 15;
            lp[2] += ((lp[1] - lp[2]) * f) >> 15;

            let mut partials = [0i64; NUM_DRUM_PARTIALS];
            let mut harmonics = 0i64;
            for i in 0..NUM_DRUM_PARTIALS {
                additive.partial_phase[i] = additive.partial_phase[i].wrapping_add(increments[i]);
                let amplitude = additive.partial_amplitude[i]
                    + (((additive.target_partial_amplitude[i] - additive.partial_amplitude[i]) * fade) >> 15);
                let partial = i64::from((sine(additive.partial_phase[i]) * amplitude) >> 16);
                partials[i] = partial;
                harmonics += partial;
            }

            let noise_mode_1 = (partials[1] * i64::from(lp[2])) >> 8;
            let noise_mode_2 = (partials[3] * i64::from(lp[2])) >> 9;
            let mut sample = partials[0];
            sample += (noise_mode_1 * (12288 - noise_mode_gain)) >> 14;
            sample += (noise_mode_2 * noise_mode_gain) >> 14;
            sample += (harmonics * harmonics_gain) >> 14;
            let out = sample.clamp(-32768, 32767) as i32;
            write_pair(pair, previous, out);
            previous = out;
        }
        additive.previous_sample = previous;
        additive.partial_amplitude[..NUM_DRUM_PARTIALS]
            .copy_from_slice(&additive.target_partial_amplitude[..NUM_DRUM_PARTIALS]);
    }
}
