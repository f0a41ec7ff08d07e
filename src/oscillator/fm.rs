//! Two-operator phase modulation. Timbre is the modulation index, color the
//! modulator ratio (snapped to musical ratios before these run).

use crate::oscillator::{increment_for, sine, synced, DigitalOscillator};

/// Linear ramp of a parameter across one block, so index changes don't
/// click.
struct Ramp {
    start: i32,
    delta: i32,
    xfade: i32,
    step: i32,
}

impl Ramp {
    fn new(from: i16, to: i16, size: usize) -> Self {
        Self {
            start: i32::from(from),
            delta: i32::from(to) - i32::from(from),
            xfade: 0,
            step: 32767 / size.max(1) as i32,
        }
    }

    #[inline]
    fn next(&mut self) -> i32 {
        self.xfade += self.step;
        self.start + ((self.delta * self.xfade) >> 15)
    }
}

impl DigitalOscillator {
    fn modulator_increment(&self) -> u32 {
        let pitch = (12 << 7) + i32::from(self.pitch) + ((i32::from(self.parameter[1]) - 16384) >> 1);
        increment_for(pitch)
    }

    fn ramp_index(&mut self, size: usize) -> Ramp {
        let ramp = Ramp::new(self.previous_parameter[0], self.parameter[0], size);
        self.previous_parameter[0] = self.parameter[0];
        ramp
    }

    pub(crate) fn render_fm(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let modulator_increment = self.modulator_increment() >> 1;
        let mut index = self.ramp_index(buffer.len());
        let increment = self.phase_increment;
        let mut phase = self.phase;
        let mut modulator_phase = self.state.fm.modulator_phase;
        for (i, out) in buffer.iter_mut().enumerate() {
            let amount = index.next();
            phase = phase.wrapping_add(increment);
            if synced(sync, i) {
                phase = 0;
                modulator_phase = 0;
            }
            modulator_phase = modulator_phase.wrapping_add(modulator_increment);
            let modulation = ((i64::from(sine(modulator_phase)) * i64::from(amount)) << 2) as u32;
            *out = sine(phase.wrapping_add(modulation)) as i16;
        }
        self.phase = phase;
        self.state.fm.modulator_phase = modulator_phase;
    }

    /// The carrier's last sample feeds back into the modulator phase. The
    /// feedback is attenuated at high pitches to keep aliasing in check.
    pub(crate) fn render_feedback_fm(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let modulator_increment = self.modulator_increment();
        let attenuation = i32::from(self.pitch) - (72 << 7)
            + ((i32::from(self.parameter[1]) - 16384) >> 1);
        let attenuation = (32767 - attenuation * 4).clamp(0, 32767);
        let mut index = self.ramp_index(buffer.len());

        let increment = self.phase_increment;
        let mut phase = self.phase;
        let mut modulator_phase = self.state.fm.modulator_phase;
        let mut previous = self.state.fm.previous_sample;
        for (i, out) in buffer.iter_mut().enumerate() {
            let amount = (index.next() * attenuation) >> 15;
            phase = phase.wrapping_add(increment);
            if synced(sync, i) {
                phase = 0;
                modulator_phase = 0;
            }
            modulator_phase = modulator_phase.wrapping_add(modulator_increment);
            let feedback = (previous << 14) as u32;
            let modulation = sine(modulator_phase.wrapping_add(feedback));
            let modulation = ((i64::from(modulation) * i64::from(amount)) << 1) as u32;
            previous = sine(phase.wrapping_add(modulation));
            *out = previous as i16;
        }
        self.phase = phase;
        self.state.fm.modulator_phase = modulator_phase;
        self.state.fm.previous_sample = previous;
    }

    /// The carrier output bends the modulator's frequency instead of its
    /// phase, which quickly turns chaotic.
    pub(crate) fn render_chaotic_feedback_fm(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let modulator_increment = self.modulator_increment() >> 8;
        let mut index = self.ramp_index(buffer.len());

        let increment = self.phase_increment;
        let mut phase = self.phase;
        let mut modulator_phase = self.state.fm.modulator_phase;
        let mut previous = self.state.fm.previous_sample;
        for (i, out) in buffer.iter_mut().enumerate() {
            let amount = index.next();
            phase = phase.wrapping_add(increment);
            if synced(sync, i) {
                phase = 0;
                modulator_phase = 0;
            }
            let modulation = ((i64::from(sine(modulator_phase)) * i64::from(amount)) << 1) as u32;
            previous = sine(phase.wrapping_add(modulation));
            modulator_phase = modulator_phase
                .wrapping_add(modulator_increment.wrapping_mul((129 + (previous >> 9)) as u32));
            *out = previous as i16;
        }
        self.phase = phase;
        self.state.fm.modulator_phase = modulator_phase;
        self.state.fm.previous_sample = previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oscillator::DigitalOscillatorShape;

    #[test]
    fn ramp_lands_on_the_target() {
        let mut ramp = Ramp::new(0, 16000, 24);
        let values: Vec<i32> = (0..24).map(|_| ramp.next()).collect();
        assert!(values.windows(2).all(|w| w[1] >= w[0]));
        assert!((values[23] - 16000).abs() < 16);
    }

    #[test]
    fn zero_index_fm_is_a_sine() {
        let mut modulated = DigitalOscillator::new();
        modulated.set_shape(DigitalOscillatorShape::Fm);
        modulated.set_parameters(0, 32768);
        let mut plain = DigitalOscillator::new();
        plain.set_shape(DigitalOscillatorShape::Fm);
        plain.set_parameters(0, 0);
        let mut a = [0i16; 48];
        let mut b = [0i16; 48];
        modulated.render(&[], &mut a);
        plain.render(&[], &mut b);
        assert_eq!(a, b);
    }
}
