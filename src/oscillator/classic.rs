//! Ring modulation, detuned saws, the comb filter, the lo-fi toy and the
//! "digital filter" shapes that fake a resonant filter sweep by windowing a
//! sine at the resonant frequency.

use crate::dsp::math::{clip, interpolate824_u16, interpolate88, mix};
use crate::dsp::pitch::compute_delay;
use crate::dsp::resources::{LUT_SVF_CUTOFF, LUT_SVF_DAMP, WS_MODERATE_OVERDRIVE};
use crate::oscillator::state::COMB_LENGTH;
use crate::oscillator::{increment_for, sine, synced, DigitalOscillator};

/// Decimation filter taps and their sum.
const TOY_FIR: [i32; 4] = [10530, 14751, 16384, 14751];
const TOY_FIR_GAIN: i32 = 28208;

/// Where the resonance carrier restarts for each filter response, on the
/// master phase wrap (first pair) and on its half-period (second pair).
const PHASE_RESET: [u32; 4] = [0, 0x8000_0000, 0x4000_0000, 0x8000_0000];

impl DigitalOscillator {
    pub(crate) fn render_triple_ring_mod(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let increment = self.phase_increment;
        let pitch = i32::from(self.pitch);
        let increment_1 = increment_for(pitch + ((i32::from(self.parameter[0]) - 16384) >> 2));
        let increment_2 = increment_for(pitch + ((i32::from(self.parameter[1]) - 16384) >> 2));

        let mut phase = self.phase.wrapping_add(1 << 30);
        let [mut modulator_1, mut modulator_2] = self.state.ring.modulator_phase;
        for (i, out) in buffer.iter_mut().enumerate() {
            phase = phase.wrapping_add(increment);
            if synced(sync, i) {
                phase = 0;
                modulator_1 = 0;
                modulator_2 = 0;
            }
            modulator_1 = modulator_1.wrapping_add(increment_1);
            modulator_2 = modulator_2.wrapping_add(increment_2);
            let mut result = sine(phase);
            result = (result * sine(modulator_1)) >> 16;
            result = (result * sine(modulator_2)) >> 16;
            *out = interpolate88(&*WS_MODERATE_OVERDRIVE, (result + 32768) as u16);
        }
        self.phase = phase.wrapping_sub(1 << 30);
        self.state.ring.modulator_phase = [modulator_1, modulator_2];
    }

    pub(crate) fn render_saw_swarm(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let detune = i32::from(self.parameter[0]) + 1024;
        let detune = (detune * detune) >> 9;
        let pitch = i32::from(self.pitch);

        let mut increments = [0u32; 7];
        for (i, increment) in increments.iter_mut().enumerate() {
            let saw_detune = i64::from(detune) * (i as i64 - 3);
            let integral = (saw_detune >> 16) as i32;
            let fractional = (saw_detune & 0xffff) as i64;
            let a = i64::from(increment_for(pitch + integral));
            let b = i64::from(increment_for(pitch + integral + 1));
            *increment = (a + (((b - a) * fractional) >> 16)) as u32;
        }

        if self.strike {
            for phase in self.state.swarm.phase.iter_mut() {
                *phase = self.random.word();
            }
            self.strike = false;
        }

        let color = i32::from(self.parameter[1]);
        let hp_cutoff = if color < 10922 {
            pitch + (((color - 10922) * 24) >> 5)
        } else {
            pitch + (((color - 10922) * 12) >> 5)
        };
        let hp_cutoff = hp_cutoff.clamp(0, 32767) as u32;
        let f = i64::from(interpolate824_u16(&*LUT_SVF_CUTOFF, hp_cutoff << 17));
        let damp = i64::from(LUT_SVF_DAMP[0]);
        let [mut bp, mut lp] = self.state.swarm.filter_state;

        let mut phase = self.phase;
        for (i, out) in buffer.iter_mut().enumerate() {
            if synced(sync, i) {
                phase = 0;
                self.state.swarm.phase = [0; 6];
            }
            phase = phase.wrapping_add(increments[0]);
            let mut sample = -28672 + (phase >> 19) as i32;
            for (saw, increment) in self.state.swarm.phase.iter_mut().zip(&increments[1..]) {
                *saw = saw.wrapping_add(*increment);
                sample += (*saw >> 19) as i32;
            }
            let sample = i64::from(interpolate88(&*WS_MODERATE_OVERDRIVE, (sample + 32768) as u16));

            let notch = sample - ((i64::from(bp) * damp) >> 15);
            lp = clip(lp + ((f * i64::from(bp)) >> 15) as i32);
            let hp = notch - i64::from(lp);
            bp = clip(bp + ((f * hp) >> 15) as i32);
            *out = clip(hp as i32) as i16;
        }
        self.phase = phase;
        self.state.swarm.filter_state = [bp, lp];
    }

    /// Feedback comb over whatever is already in `buffer`.
    pub(crate) fn render_comb_filter(&mut self, buffer: &mut [i16]) {
        let pitch = i32::from(self.pitch) + ((i32::from(self.parameter[0]) - 16384) >> 1);
        let filtered_pitch = &mut self.state.fm.previous_sample;
        *filtered_pitch = (15 * *filtered_pitch + pitch) >> 4;
        let delay = compute_delay(*filtered_pitch as i16).min((COMB_LENGTH as u32) << 16);
        let integral = (delay >> 16) as usize;
        let fractional = ((delay & 0xffff) >> 1) as i32;

        let resonance = ((i32::from(self.parameter[1]) << 1) - 32768) as i16;
        let resonance = i32::from(interpolate88(
            &*WS_MODERATE_OVERDRIVE,
            (i32::from(resonance) + 32768) as u16,
        ));

        let line = &mut self.delay_lines.comb;
        let mut ptr = self.phase as usize % COMB_LENGTH;
        for sample in buffer.iter_mut() {
            let input = i32::from(*sample);
            let offset = ptr + 2 * COMB_LENGTH - integral;
            let a = i32::from(line[offset % COMB_LENGTH]);
            let b = i32::from(line[(offset - 1) % COMB_LENGTH]);
            let delayed = a + (((b - a) * fractional) >> 15);
            let feedback = clip(((delayed * resonance) >> 15) + (input >> 1));
            line[ptr] = feedback as i16;
            *sample = clip((input + (delayed << 1)) >> 1) as i16;
            ptr = (ptr + 1) % COMB_LENGTH;
        }
        self.phase = ptr as u32;
    }

    /// Sample-rate reduction and bit mangling through a four-tap decimator.
    pub(crate) fn render_toy(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let increment = self.phase_increment >> 2;
        let decimation = 512 - (self.parameter[0] >> 6) as u16;
        let x = (self.parameter[1] >> 8) as u32;
        let mut held = self.state.toy.held_sample;
        let mut counter = self.state.toy.decimation_counter;

        let mut phase = self.phase;
        for (i, out) in buffer.iter_mut().enumerate() {
            if synced(sync, i) {
                phase = 0;
            }
            let mut filtered = 0;
            for tap in TOY_FIR {
                phase = phase.wrapping_add(increment);
                if counter >= decimation {
                    held = ((((phase >> 24) ^ (x << 1)) & !x).wrapping_add(x >> 1)) as u8;
                    counter = 0;
                }
                filtered += tap * i32::from(held);
                counter += 1;
            }
            *out = ((filtered >> 8) - TOY_FIR_GAIN) as i16;
        }
        self.phase = phase;
        self.state.toy.held_sample = held;
        self.state.toy.decimation_counter = counter;
    }

    /// Resonant filter imitation: a sine at the resonant frequency, hard
    /// synced and windowed by the master phase. `response` picks low-pass,
    /// peaking, band-pass or high-pass.
    pub(crate) fn render_digital_filter(&mut self, response: usize, sync: &[u8], buffer: &mut [i16]) {
        let shifted_pitch = (i32::from(self.pitch) + ((i32::from(self.parameter[0]) - 2048) >> 1)).min(16383);
        let size = buffer.len() as u32;
        let target = increment_for(shifted_pitch);

        let filter = &mut self.state.filter;
        let mut modulator_increment = filter.modulator_phase_increment;
        let increment_increment = if modulator_increment < target {
            (target - modulator_increment) / size
        } else {
            !((modulator_increment - target) / size)
        };

        let color = i32::from(self.parameter[1]);
        let balance = (if color < 16384 { color << 2 } else { (32767 - color) << 2 }) as u16;

        let increment = self.phase_increment;
        let mut phase = self.phase;
        for (i, out) in buffer.iter_mut().enumerate() {
            phase = phase.wrapping_add(increment);
            modulator_increment = modulator_increment.wrapping_add(increment_increment);
            filter.modulator_phase = filter.modulator_phase.wrapping_add(modulator_increment);
            let integrator_gain = (modulator_increment >> 14) as u16 as i32;

            if synced(sync, i) {
                filter.polarity = true;
                phase = 0;
                filter.modulator_phase = 0;
                filter.square_modulator_phase = 0;
                filter.integrator = 0;
            }

            filter.square_modulator_phase =
                filter.square_modulator_phase.wrapping_add(modulator_increment);
            if phase < increment {
                filter.modulator_phase = PHASE_RESET[response];
            }
            if (phase << 1) < (increment << 1) {
                filter.polarity = !filter.polarity;
                filter.square_modulator_phase = PHASE_RESET[(response & 1) + 2];
            }

            let carrier = sine(filter.modulator_phase);
            let square_carrier = sine(filter.square_modulator_phase);

            let saw = i64::from(!(phase >> 16) as u16);
            let double_saw = i64::from(!(phase >> 15) as u16);
            let triangle = i64::from(((phase >> 15) as u16) ^ if phase & 0x8000_0000 != 0 { 0xffff } else { 0 });
            let window = if color < 16384 { saw } else { triangle };

            let mut pulse = ((i64::from(square_carrier) * double_saw) >> 16) as i32;
            if filter.polarity {
                pulse = -pulse;
            }
            filter.integrator = clip(filter.integrator + ((pulse * integrator_gain) >> 16));

            let (saw_tri, square) = if response & 2 != 0 {
                (((i64::from(carrier) * window) >> 16) as i32, pulse)
            } else {
                let saw_tri = ((window * (i64::from(carrier) + 32768)) >> 16) as i32 - 32768;
                let square = if response == 1 {
                    (pulse + filter.integrator) >> 1
                } else {
                    filter.integrator
                };
                (saw_tri, square)
            };
            *out = mix(saw_tri as i16, square as i16, balance);
        }
        filter.modulator_phase_increment = modulator_increment;
        self.phase = phase;
    }
}
