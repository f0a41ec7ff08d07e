//! Noise sources: filtered, resonated, clocked, granular and particle
//! noise.

use crate::dsp::math::{clip, constrain, interpolate824, interpolate824_u16, interpolate88};
use crate::dsp::resources::{
    LUT_GRANULAR_ENVELOPE, LUT_GRANULAR_ENVELOPE_RATE, LUT_RESONATOR_COEFFICIENT,
    LUT_RESONATOR_SCALE, LUT_SVF_CUTOFF, LUT_SVF_DAMP, LUT_SVF_SCALE, LUT_SIZE, WAV_SINE,
    WS_MODERATE_OVERDRIVE,
};
use crate::oscillator::{increment_for, synced, DigitalOscillator};

const PARTICLE_DECAY: u32 = 64763;
/// 0.996 and its square, in 1.15.
const PARTICLE_RESONANCE: i64 = 32636;
const PARTICLE_RESONANCE_SQUARED: i64 = 32506;

/// Coefficient and input scale of a two-pole resonator tuned to `pitch`.
fn resonator_tuning(pitch: i32) -> (i32, i32) {
    let phase = (constrain(pitch, 0, 16383) as u32) << 17;
    (
        i32::from(interpolate824_u16(&*LUT_RESONATOR_COEFFICIENT, phase)),
        i32::from(interpolate824_u16(&*LUT_RESONATOR_SCALE, phase)),
    )
}

/// One step of a two-pole resonator. `state` holds the last two outputs.
#[inline]
fn resonate(input: i32, scale: i32, coefficient: i32, q_squared: i64, state: &mut [i32; 2]) -> i32 {
    let scaled = if input > 0 {
        (input * scale) >> 16
    } else {
        -((-input * scale) >> 16)
    };
    let y = i64::from(scaled) + ((i64::from(state[0]) * i64::from(coefficient)) >> 15)
        - ((i64::from(state[1]) * q_squared) >> 15);
    let y = y.clamp(-32768, 32767) as i32;
    state[1] = state[0];
    state[0] = y;
    y
}

#[inline]
fn overdrive(sample: i32) -> i16 {
    interpolate88(&*WS_MODERATE_OVERDRIVE, (sample + 32768) as u16)
}

impl DigitalOscillator {
    /// White noise through a state-variable filter that morphs from low-pass
    /// through band-pass to high-pass as color increases.
    pub(crate) fn render_filtered_noise(&mut self, buffer: &mut [i16]) {
        let f = i64::from(interpolate824_u16(&*LUT_SVF_CUTOFF, (self.pitch as u32) << 17));
        let timbre = (self.parameter[0].max(0) as u32) << 17;
        let damp = i64::from(interpolate824_u16(&*LUT_SVF_DAMP, timbre));
        let scale = i64::from(interpolate824_u16(&*LUT_SVF_SCALE, timbre));

        let color = i64::from(self.parameter[1]);
        let (lp_gain, bp_gain, hp_gain) = if color < 16384 {
            (16384 - color, color, 0)
        } else {
            (0, 32767 - color, color - 16384)
        };
        let gain_correction = if f > scale { scale * 32767 / f } else { 32767 };

        let filter = &mut self.state.noise_filter;
        let mut lp = i64::from(filter.lp);
        let mut bp = i64::from(filter.bp);
        for out in buffer.iter_mut() {
            let input = i64::from(self.random.sample() >> 1);
            let notch = input - ((bp * damp) >> 15);
            lp = (lp + ((f * bp) >> 15)).clamp(-32768, 32767);
            let hp = notch - lp;
            bp += (f * hp) >> 15;

            let result = ((lp_gain * lp) >> 14) + ((bp_gain * bp) >> 14) + ((hp_gain * hp) >> 14);
            let result = (result.clamp(-32768, 32767) * gain_correction) >> 15;
            *out = overdrive(result as i32);
        }
        filter.lp = lp as i32;
        filter.bp = bp as i32;
    }

    /// Noise through two resonators, one at the pitch and one offset by
    /// color. Timbre sets the resonance. Rendered at half rate.
    pub(crate) fn render_twin_peaks_noise(&mut self, buffer: &mut [i16]) {
        let q = 65240 + (self.parameter[0].max(0) as u32 >> 7);
        let q_squared = i64::from((q * q) >> 17);
        let pitch = i32::from(self.pitch);
        let (c1, s1) = resonator_tuning(pitch);
        let (c2, s2) = resonator_tuning(pitch + ((i32::from(self.parameter[1]) - 16384) >> 1));
        let c1 = ((i64::from(c1) * i64::from(q)) >> 16) as i32;
        let c2 = ((i64::from(c2) * i64::from(q)) >> 16) as i32;
        let makeup_gain = 8191 - (i32::from(self.parameter[0]) >> 2);

        let [first, second, _] = &mut self.state.resonators.filter_state;
        for pair in buffer.chunks_mut(2) {
            let input = i32::from(self.random.sample() >> 1);
            let y1 = resonate(input, s1, c1, q_squared, first);
            let y2 = resonate(input, s2, c2, q_squared, second);
            let sum = y1 + y2;
            let sample = clip(sum + ((sum * makeup_gain) >> 13));
            pair.fill(overdrive(sample));
        }
    }

    /// Sample and hold noise. Pitch sets the clock, timbre the length of the
    /// repeating cycle, color the number of quantization levels.
    pub(crate) fn render_clocked_noise(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let [timbre, color] = self.parameter.map(i32::from);
        if (color - i32::from(self.previous_parameter[1])).abs() > 64 {
            self.previous_parameter[1] = self.parameter[1];
        }
        if (timbre - i32::from(self.previous_parameter[0])).abs() > 16 {
            self.previous_parameter[0] = self.parameter[0];
        }

        let clocked = &mut self.state.clocked;
        if self.strike {
            self.strike = false;
            clocked.seed = self.random.word();
        }

        // Shift the range up to reach clock rates close to the sample rate.
        let mut increment = self.phase_increment;
        for _ in 0..3 {
            if increment < (1 << 31) {
                increment <<= 1;
            }
        }

        clocked.cycle_phase_increment =
            increment_for(i32::from(self.previous_parameter[0]) - 16384) << 1;
        let num_steps = (1 + (self.previous_parameter[1].max(0) as u32 >> 10)).max(2);
        let divider = 65536 / num_steps;

        let mut phase = self.phase;
        for (i, out) in buffer.iter_mut().enumerate() {
            phase = phase.wrapping_add(increment);
            if synced(sync, i) {
                phase = 0;
            }
            if phase < increment {
                clocked.rng_state = clocked
                    .rng_state
                    .wrapping_mul(1_664_525)
                    .wrapping_add(1_013_904_223);
                clocked.cycle_phase = clocked.cycle_phase.wrapping_add(clocked.cycle_phase_increment);
                if clocked.cycle_phase < clocked.cycle_phase_increment {
                    clocked.rng_state = clocked.seed;
                    clocked.cycle_phase = clocked.cycle_phase_increment;
                }
                let sample = clocked.rng_state & 0xffff;
                let sample = sample - sample % divider + (divider >> 1);
                clocked.sample = sample as u16 as i16;
                // Lock the clock to a whole number of samples.
                phase = increment;
            }
            *out = clocked.sample;
        }
        self.phase = phase;
    }

    /// Four sine grains with randomized onsets. Timbre sets grain length,
    /// color the pitch scatter.
    pub(crate) fn render_granular_cloud(&mut self, buffer: &mut [i16]) {
        let increment = self.phase_increment;
        let color = i32::from(self.parameter[1]);
        let rate = u32::from(LUT_GRANULAR_ENVELOPE_RATE[(self.parameter[0].max(0) >> 7) as usize]);
        for grain in self.state.grains.iter_mut() {
            if grain.envelope_phase <= (1 << 24) && grain.envelope_phase_increment != 0 {
                continue;
            }
            grain.envelope_phase_increment = 0;
            if (self.random.word() & 0xffff) < 0x4000 {
                grain.envelope_phase_increment = rate << 3;
                grain.envelope_phase = 0;
                let pitch_mod = (i32::from(self.random.sample()) * color) >> 16;
                let phi = i64::from(increment >> 8);
                let offset = if pitch_mod < 0 {
                    phi * i64::from(pitch_mod >> 8)
                } else {
                    phi * i64::from(pitch_mod >> 7)
                };
                grain.phase_increment = increment.wrapping_add_signed(offset as i32);
            }
        }

        for out in buffer.iter_mut() {
            let mut sample = 0;
            for grain in self.state.grains.iter_mut() {
                grain.phase = grain.phase.wrapping_add(grain.phase_increment);
                grain.envelope_phase = grain.envelope_phase.wrapping_add(grain.envelope_phase_increment);
                let envelope_index = ((grain.envelope_phase >> 16) as usize).min(LUT_SIZE - 1);
                let envelope = i64::from(LUT_GRANULAR_ENVELOPE[envelope_index]);
                sample += (i64::from(interpolate824(&*WAV_SINE, grain.phase)) * envelope) >> 17;
            }
            *out = sample.clamp(-32768, 32767) as i16;
        }
    }

    /// Sparse clicks ringing three resonators whose tuning is re-rolled on
    /// every click. Timbre sets the density, color the spread. Rendered at
    /// half rate.
    pub(crate) fn render_particle_noise(&mut self, buffer: &mut [i16]) {
        let density = 1024 + self.parameter[0].max(0) as u32;
        let pitch = i32::from(self.pitch);
        let color = i32::from(self.parameter[1]);

        let resonators = &mut self.state.resonators;
        let mut amplitude = resonators.amplitude;
        for pair in buffer.chunks_mut(2) {
            let noise = self.random.word();
            if (noise & 0x7f_ffff) < density {
                amplitude = 65535;
                let noise_a = (noise & 0x0fff) as i32 - 0x800;
                let noise_b = ((noise >> 15) & 0x1fff) as i32 - 0x1000;
                let pitches = [
                    pitch + ((3 * noise_a * color) >> 17) + 0x600,
                    pitch + ((noise_a * color) >> 15) + 0x980,
                    pitch + ((noise_b * color) >> 16) + 0x790,
                ];
                for (k, p) in pitches.into_iter().enumerate() {
                    let (coefficient, scale) = resonator_tuning(p);
                    resonators.filter_coefficient[k] =
                        ((i64::from(coefficient) * PARTICLE_RESONANCE) >> 15) as i32;
                    resonators.filter_scale[k] = scale;
                }
            }
            let sample = (i32::from(noise as u16 as i16) * amplitude as i32) >> 16;
            amplitude = (amplitude * PARTICLE_DECAY) >> 16;

            let mut sum = 0;
            for k in 0..3 {
                sum += resonate(
                    sample,
                    resonators.filter_scale[k],
                    resonators.filter_coefficient[k],
                    PARTICLE_RESONANCE_SQUARED,
                    &mut resonators.filter_state[k],
                );
            }
            pair.fill(clip(sum) as i16);
        }
        resonators.amplitude = amplitude;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oscillator::DigitalOscillatorShape;

    fn render(shape: DigitalOscillatorShape, timbre: u16, color: u16, blocks: usize) -> Vec<i16> {
        let mut oscillator = DigitalOscillator::new();
        oscillator.set_shape(shape);
        oscillator.set_parameters(timbre, color);
        let mut out = Vec::new();
        for _ in 0..blocks {
            let mut buffer = [0i16; 24];
            oscillator.render(&[], &mut buffer);
            out.extend_from_slice(&buffer);
        }
        out
    }

    #[test]
    fn resonator_rings_down_without_input() {
        let (coefficient, scale) = resonator_tuning(60 << 7);
        let mut state = [0; 2];
        let first = resonate(20000, scale, coefficient, 32000, &mut state);
        assert_ne!(first, 0);
        let mut peak = 0;
        for _ in 0..20000 {
            peak = resonate(0, scale, coefficient, 32000, &mut state).abs();
        }
        assert!(peak < 100);
    }

    #[test]
    fn clocked_noise_holds_between_clock_ticks() {
        // A low clock holds each value for many samples.
        let mut oscillator = DigitalOscillator::new();
        oscillator.set_shape(DigitalOscillatorShape::ClockedNoise);
        oscillator.set_pitch(0);
        oscillator.set_parameters(65535, 65535);
        let mut buffer = [0i16; 64];
        oscillator.render(&[], &mut buffer);
        let changes = buffer.windows(2).filter(|w| w[0] != w[1]).count();
        assert!(changes < 8, "{changes} changes");
    }

    #[test]
    fn clocked_noise_quantizes_to_few_levels() {
        let out = render(DigitalOscillatorShape::ClockedNoise, 65535, 0, 50);
        // Skip the silence before the first clock tick.
        let mut levels: Vec<i16> = out[240..].to_vec();
        levels.sort_unstable();
        levels.dedup();
        assert!(levels.len() <= 2, "{levels:?}");
    }

    #[test]
    fn noise_shapes_are_not_silent() {
        for shape in [
            DigitalOscillatorShape::FilteredNoise,
            DigitalOscillatorShape::TwinPeaksNoise,
            DigitalOscillatorShape::GranularCloud,
            DigitalOscillatorShape::ParticleNoise,
        ] {
            let out = render(shape, 40000, 40000, 400);
            assert!(out.iter().any(|&s| s.abs() > 64), "{shape}");
        }
    }
}
