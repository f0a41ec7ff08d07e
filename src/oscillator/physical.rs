//! Waveguide models: Karplus-Strong strings, a bowed string, a reed and a
//! flute.
//!
//! Delay lines live in `DelayLines`. The bowed string and the flute store
//! 8-bit samples and scale them back up on read.

use crate::dsp::math::{clip, interpolate1022, mix};
use crate::dsp::resources::{
    LUT_BLOWING_ENVELOPE, LUT_BLOWING_ENVELOPE_SIZE, LUT_BLOWING_JET, LUT_BOWING_ENVELOPE,
    LUT_BOWING_ENVELOPE_SIZE, LUT_BOWING_FRICTION, LUT_FLUTE_BODY_FILTER,
    LUT_FLUTE_BODY_FILTER_SIZE,
};
use crate::oscillator::state::{
    PhysicalModelState, BORE_LENGTH, BRIDGE_LENGTH, FLUTE_BORE_LENGTH, JET_LENGTH, NECK_LENGTH,
    NUM_PLUCK_VOICES, STRING_LENGTH,
};
use crate::oscillator::{write_pair, DigitalOscillator};

const BRIDGE_LP_GAIN: i64 = 14008;
const BRIDGE_LP_POLE: i64 = 18022;
const BIQUAD_GAIN: i64 = 6553;
const BIQUAD_POLE_1: i64 = 6948;
const BIQUAD_POLE_2: i64 = -2959;

const BREATH_PRESSURE: i32 = 26214;
const REFLECTION_COEFFICIENT: i32 = -3891;
const REED_SLOPE: i32 = -1229;
const REED_OFFSET: i32 = 22938;

const DC_BLOCKING_POLE: i64 = 4055;

/// Interpolated read `integral` samples behind `write`, with a 16-bit
/// fractional crossfade towards the sample before.
#[inline]
fn tap<T: Copy + Into<i16>>(line: &[T], write: usize, integral: usize, fractional: u16) -> i32 {
    let len = line.len();
    let ptr = (write + 2 * len - integral) % len;
    let a = line[ptr].into();
    let b = line[(ptr + len - 1) % len].into();
    i32::from(mix(a, b, fractional))
}

impl DigitalOscillator {
    /// Three round-robin strings. Timbre trades decay time for stretching,
    /// color sets the width of the noise burst.
    pub(crate) fn render_plucked(&mut self, buffer: &mut [i16]) {
        let phase_increment = self.phase_increment.saturating_mul(2);
        if self.strike {
            self.strike = false;
            self.active_voice = (self.active_voice + 1) % NUM_PLUCK_VOICES;
            let string = &mut self.state.pluck[self.active_voice];
            let mut increment = phase_increment;
            string.shift = 0;
            while increment > (2 << 22) {
                increment >>= 1;
                string.shift += 1;
            }
            string.size = 1024 >> string.shift;
            string.mask = string.size - 1;
            string.write_ptr = 0;
            string.max_phase_increment = phase_increment.saturating_mul(2);
            string.phase_increment = phase_increment;
            let width = (3 * i32::from(self.parameter[1])) >> 1;
            string.initialization_ptr = (string.size * (8192 + width) as usize) >> 16;
        }

        let latest = &mut self.state.pluck[self.active_voice];
        latest.phase_increment = phase_increment.min(latest.max_phase_increment);

        let timbre = i32::from(self.parameter[0]);
        let update_probability: u32 = if timbre < 16384 {
            65535
        } else {
            (131072 - (timbre >> 3) * 31) as u32
        };
        let loss = if timbre < 16384 {
            let loss = (4096 - (phase_increment >> 14).min(4096) as i32).max(256);
            (loss * (16384 - timbre)) >> 14
        } else {
            0
        };

        let mut previous = self.state.pluck[0].previous_sample;
        for pair in buffer.chunks_mut(2) {
            let mut sample = 0;
            for (voice, string) in self.state.pluck.iter_mut().enumerate() {
                if string.size == 0 {
                    continue;
                }
                let line = &mut self.delay_lines.strings
                    [voice * STRING_LENGTH..(voice + 1) * STRING_LENGTH];
                if string.initialization_ptr > 0 {
                    string.initialization_ptr -= 1;
                    let ptr = string.initialization_ptr;
                    let excitation =
                        (i32::from(line[ptr]) + 3 * i32::from(self.random.sample())) >> 2;
                    line[ptr] = excitation as i16;
                    sample += excitation;
                    continue;
                }

                string.phase = string.phase.wrapping_add(string.phase_increment);
                let read_ptr = ((string.phase >> (22 + string.shift)) as usize + 2) & string.mask;
                let mut write_ptr = string.write_ptr;
                while write_ptr != read_ptr {
                    let next = (write_ptr + 1) & string.mask;
                    if (self.random.word() & 0xffff) <= update_probability {
                        let mut sum = (i32::from(line[write_ptr]) + i32::from(line[next])) / 2;
                        if loss != 0 {
                            sum = (sum * (32768 - loss)) >> 15;
                        }
                        line[write_ptr] = sum as i16;
                    }
                    if write_ptr == 0 {
                        line[string.size] = line[0];
                    }
                    write_ptr = next;
                }
                string.write_ptr = write_ptr;
                sample += i32::from(interpolate1022(line, string.phase >> string.shift));
            }
            let sample = clip(sample);
            write_pair(pair, previous, sample);
            previous = sample;
        }
        self.state.pluck[0].previous_sample = previous;
    }

    /// Bowed string: two delay lines meet at the bow, where a friction
    /// curve decides how much of the bow's velocity sticks. Rendered at
    /// half rate.
    pub(crate) fn render_bowed(&mut self, buffer: &mut [i16]) {
        if self.strike {
            self.strike = false;
            self.delay_lines.bridge.fill(0);
            self.delay_lines.neck.fill(0);
            self.state.physical = PhysicalModelState::default();
        }
        let pressure = i64::from(172 - (i32::from(self.parameter[0]) >> 8));
        let position = 6 + (self.parameter[1] as u32 >> 9);

        // The one-pole filter in the loop adds about two samples.
        let mut delay = (self.delay >> 1).saturating_sub(2 << 16);
        let mut bridge_delay = (delay >> 8) * position;
        while delay - bridge_delay.min(delay) > ((NECK_LENGTH as u32 - 1) << 16)
            || bridge_delay > ((BRIDGE_LENGTH as u32 - 1) << 16)
        {
            delay >>= 1;
            bridge_delay >>= 1;
        }
        let neck_delay = delay.saturating_sub(bridge_delay);
        let bridge_integral = (bridge_delay >> 16) as usize;
        let bridge_fractional = (bridge_delay & 0xffff) as u16;
        let neck_integral = (neck_delay >> 16) as usize;
        let neck_fractional = (neck_delay & 0xffff) as u16;

        let PhysicalModelState {
            mut delay_ptr,
            mut excitation_ptr,
            lp_state,
            filter_state: [y0, y1],
            mut previous_sample,
        } = self.state.physical;
        let mut lp_state = i64::from(lp_state);
        let mut y0 = i64::from(y0);
        let mut y1 = i64::from(y1);

        let bridge: &mut [i8] = &mut self.delay_lines.bridge;
        let neck: &mut [i8] = &mut self.delay_lines.neck;
        let envelope = |index: usize| {
            i64::from(LUT_BOWING_ENVELOPE[index.min(LUT_BOWING_ENVELOPE_SIZE - 1)])
        };

        for pair in buffer.chunks_mut(2) {
            self.phase = self.phase.wrapping_add(self.phase_increment);

            let bridge_value =
                i64::from(tap(bridge, delay_ptr, bridge_integral, bridge_fractional)) << 8;
            let nut_value = i64::from(tap(neck, delay_ptr, neck_integral, neck_fractional)) << 8;
            lp_state = (bridge_value * BRIDGE_LP_GAIN + lp_state * BRIDGE_LP_POLE) >> 15;
            let bridge_reflection = -lp_state;
            let nut_reflection = -nut_value;
            let string_velocity = bridge_reflection + nut_reflection;

            let bow_velocity = (envelope(excitation_ptr >> 1) + envelope((excitation_ptr + 1) >> 1)) >> 1;
            let velocity_delta = bow_velocity - string_velocity;
            let friction = ((velocity_delta * pressure) >> 5).abs().min((1 << 17) - 1);
            let friction = i64::from(LUT_BOWING_FRICTION[(friction >> 9) as usize]);
            let new_velocity = (friction * velocity_delta) >> 15;

            neck[delay_ptr % NECK_LENGTH] = ((bridge_reflection + new_velocity) >> 8) as i8;
            bridge[delay_ptr % BRIDGE_LENGTH] = ((nut_reflection + new_velocity) >> 8) as i8;
            delay_ptr = (delay_ptr + 1) % NECK_LENGTH;

            let body = ((bridge_value * BIQUAD_GAIN) >> 15)
                + ((y0 * BIQUAD_POLE_1) >> 12)
                + ((y1 * BIQUAD_POLE_2) >> 12);
            let out = (body - y1).clamp(-32768, 32767) as i32;
            y1 = y0;
            y0 = body;

            write_pair(pair, previous_sample, out);
            previous_sample = out;
            excitation_ptr += 1;
        }
        // Hold the bow at the end of its attack.
        let sustain = (LUT_BOWING_ENVELOPE_SIZE - 32) << 1;
        self.state.physical = PhysicalModelState {
            delay_ptr,
            excitation_ptr: excitation_ptr.min(sustain),
            lp_state: lp_state as i32,
            filter_state: [y0 as i32, y1 as i32],
            previous_sample,
        };
    }

    /// Single reed on a cylindrical bore. Timbre adds breath noise, color
    /// darkens the body filter.
    pub(crate) fn render_blown(&mut self, buffer: &mut [i16]) {
        if self.strike {
            self.strike = false;
            self.delay_lines.bore.fill(0);
        }

        let mut delay = (self.delay >> 1).saturating_sub(1 << 16);
        while delay > ((BORE_LENGTH as u32 - 1) << 16) {
            delay >>= 1;
        }
        let integral = (delay >> 16) as usize;
        let fractional = (delay & 0xffff) as u16;
        let noise = 28000 - (i32::from(self.parameter[0]) >> 1);

        let normalized_pitch =
            (i32::from(self.pitch) - 8192 + (i32::from(self.parameter[1]) >> 1)) >> 7;
        let coefficient =
            i32::from(LUT_FLUTE_BODY_FILTER[normalized_pitch.clamp(0, 127) as usize]);

        let bore: &mut [i16] = &mut self.delay_lines.bore;
        let physical = &mut self.state.physical;
        let mut filter_state = physical.filter_state[0];
        let mut lp_state = physical.lp_state;
        let mut delay_ptr = physical.delay_ptr;
        for out in buffer.iter_mut() {
            self.phase = self.phase.wrapping_add(self.phase_increment);

            let breath = (i32::from(self.random.sample()) * noise) >> 15;
            let breath = ((breath * BREATH_PRESSURE) >> 15) + BREATH_PRESSURE;

            let bore_value = tap(bore, delay_ptr, integral, fractional);
            let pressure_delta = (bore_value >> 1) + lp_state;
            lp_state = bore_value >> 1;

            let pressure_delta = ((REFLECTION_COEFFICIENT * pressure_delta) >> 12) - breath;
            let reed = clip(((pressure_delta * REED_SLOPE) >> 12) + REED_OFFSET);
            let sample = clip(((pressure_delta * reed) >> 15) + breath);
            bore[delay_ptr] = sample as i16;
            delay_ptr = (delay_ptr + 1) % BORE_LENGTH;

            filter_state = (coefficient * sample + (4096 - coefficient) * filter_state) >> 12;
            *out = filter_state as i16;
        }
        physical.filter_state[0] = filter_state;
        physical.lp_state = lp_state;
        physical.delay_ptr = delay_ptr;
    }

    /// Jet-driven flute: the breath feeds a short jet delay whose output
    /// goes through a sigmoid into the bore.
    pub(crate) fn render_fluted(&mut self, buffer: &mut [i16]) {
        let physical = &mut self.state.physical;
        if self.strike {
            self.strike = false;
            physical.excitation_ptr = 0;
            physical.lp_state = 0;
            self.delay_lines.flute_bore.fill(0);
            self.delay_lines.jet.fill(0);
        }

        let mut bore_delay = (self.delay << 1).saturating_sub(2 << 16);
        let mut jet_delay = (bore_delay >> 8) * (48 + (self.parameter[1] as u32 >> 10));
        bore_delay = bore_delay.saturating_sub(jet_delay);
        while bore_delay > ((FLUTE_BORE_LENGTH as u32 - 1) << 16)
            || jet_delay > ((JET_LENGTH as u32 - 1) << 16)
        {
            bore_delay >>= 1;
            jet_delay >>= 1;
        }
        let bore_integral = (bore_delay >> 16) as usize;
        let bore_fractional = (bore_delay & 0xffff) as u16;
        let jet_integral = (jet_delay >> 16) as usize;
        let jet_fractional = (jet_delay & 0xffff) as u16;

        let breath_intensity = 2100 - (i32::from(self.parameter[0]) >> 4);
        let body = (self.pitch >> 7).clamp(0, LUT_FLUTE_BODY_FILTER_SIZE as i16 - 1) as usize;
        let coefficient = i64::from(LUT_FLUTE_BODY_FILTER[body]);

        let bore: &mut [i8] = &mut self.delay_lines.flute_bore;
        let jet: &mut [i8] = &mut self.delay_lines.jet;
        let mut delay_ptr = physical.delay_ptr;
        let mut excitation_ptr = physical.excitation_ptr;
        let mut lp_state = i64::from(physical.lp_state);
        let [mut dc_x0, mut dc_y0] = physical.filter_state.map(i64::from);

        let size = buffer.len();
        for (i, out) in buffer.iter_mut().enumerate() {
            self.phase = self.phase.wrapping_add(self.phase_increment);

            let bore_value = i64::from(tap(bore, delay_ptr, bore_integral, bore_fractional)) << 9;
            let jet_value = i64::from(tap(jet, delay_ptr, jet_integral, jet_fractional)) << 9;

            let envelope = LUT_BLOWING_ENVELOPE[excitation_ptr.min(LUT_BLOWING_ENVELOPE_SIZE - 1)];
            let breath = i64::from(envelope) << 1;
            let random = (i64::from(self.random.sample()) * i64::from(breath_intensity)) >> 12;
            let breath = breath + ((random * breath) >> 15);

            lp_state = (-coefficient * bore_value + (4096 - coefficient) * lp_state) >> 12;
            dc_y0 = ((DC_BLOCKING_POLE * dc_y0) >> 12) + lp_state - dc_x0;
            dc_x0 = lp_state;
            let reflection = dc_y0;

            jet[delay_ptr % JET_LENGTH] = ((breath - (reflection >> 1)) >> 9) as i8;

            let jet_index = (jet_value.clamp(0, 65535) >> 8) as usize;
            let pressure = i64::from(LUT_BLOWING_JET[jet_index]) + (reflection >> 1);
            bore[delay_ptr % FLUTE_BORE_LENGTH] = (pressure >> 9) as i8;
            delay_ptr = (delay_ptr + 1) % FLUTE_BORE_LENGTH;

            *out = (bore_value >> 1).clamp(-32768, 32767) as i16;
            // The breath envelope advances three samples out of four.
            if (size - 1 - i) & 3 != 0 {
                excitation_ptr += 1;
            }
        }
        physical.delay_ptr = delay_ptr;
        physical.excitation_ptr = excitation_ptr.min(LUT_BLOWING_ENVELOPE_SIZE - 32);
        physical.lp_state = lp_state as i32;
        physical.filter_state = [dc_x0 as i32, dc_y0 as i32];
    }
}

#[cfg(test)]
mod tests {
    use crate::oscillator::{DigitalOscillator, DigitalOscillatorShape};

    fn render(oscillator: &mut DigitalOscillator, blocks: usize) -> Vec<i16> {
        let mut out = Vec::new();
        for _ in 0..blocks {
            let mut buffer = [0i16; 24];
            oscillator.render(&[], &mut buffer);
            out.extend_from_slice(&buffer);
        }
        out
    }

    #[test]
    fn pluck_rings_and_decays() {
        let mut string = DigitalOscillator::new();
        string.set_shape(DigitalOscillatorShape::Plucked);
        string.set_pitch(48 << 7);
        string.set_parameters(8192, 32768);
        let attack = render(&mut string, 40);
        assert!(attack.iter().any(|&s| s.abs() > 1000));
        render(&mut string, 4000);
        let tail = render(&mut string, 40);
        let peak = |v: &[i16]| v.iter().map(|s| i32::from(*s).abs()).max().unwrap_or(0);
        assert!(peak(&tail) < peak(&attack));
    }

    #[test]
    fn strikes_rotate_through_the_strings() {
        let mut string = DigitalOscillator::new();
        string.set_shape(DigitalOscillatorShape::Plucked);
        render(&mut string, 1);
        assert_eq!(string.active_voice, 1);
        string.strike();
        render(&mut string, 1);
        string.strike();
        render(&mut string, 1);
        assert_eq!(string.active_voice, 0);
    }

    #[test]
    fn wind_and_bowed_models_speak() {
        for shape in [
            DigitalOscillatorShape::Bowed,
            DigitalOscillatorShape::Blown,
            DigitalOscillatorShape::Fluted,
        ] {
            let mut model = DigitalOscillator::new();
            model.set_shape(shape);
            model.set_pitch(60 << 7);
            model.set_parameters(32768, 32768);
            let out = render(&mut model, 400);
            assert!(out.iter().any(|&s| s != 0), "{shape} stayed silent");
        }
    }

    #[test]
    fn extreme_pitches_stay_in_bounds() {
        for shape in [
            DigitalOscillatorShape::Plucked,
            DigitalOscillatorShape::Bowed,
            DigitalOscillatorShape::Blown,
            DigitalOscillatorShape::Fluted,
        ] {
            for pitch in [0, 24 << 7, 127 << 7, 140 << 7] {
                let mut model = DigitalOscillator::new();
                model.set_shape(shape);
                model.set_pitch(pitch);
                model.set_parameters(65535, 0);
                render(&mut model, 20);
            }
        }
    }
}
