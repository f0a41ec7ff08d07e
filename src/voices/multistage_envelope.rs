use crate::dsp::math::interpolate824_u16;
use crate::dsp::resources::{LUT_ENV_EXPO, LUT_ENV_INCREMENTS, LUT_ENV_LINEAR, LUT_ENV_QUARTIC};
use crate::processors::gate::Control;
use crate::voices::{BlockVoice, ControlMode, Parameters, Voice};

const MAX_SEGMENTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    Linear,
    Exponential,
    Quartic,
}

impl EnvelopeShape {
    fn table(self) -> &'static [u16] {
        match self {
            EnvelopeShape::Linear => &*LUT_ENV_LINEAR,
            EnvelopeShape::Exponential => &*LUT_ENV_EXPO,
            EnvelopeShape::Quartic => &*LUT_ENV_QUARTIC,
        }
    }
}

/// Chain of curved segments between levels, with an optional sustain
/// point and loop.
///
/// A rising gate restarts from the first segment (from the current level,
/// unless the envelope had finished or `hard_reset` is set). A falling gate
/// jumps to the segment after the sustain point.
#[derive(Debug, Clone)]
pub struct MultistageEnvelope {
    level: [i16; MAX_SEGMENTS + 1],
    time: [u16; MAX_SEGMENTS],
    shape: [EnvelopeShape; MAX_SEGMENTS],

    segment: usize,
    start_value: i16,
    value: i16,

    phase: u32,
    phase_increment: u32,

    num_segments: usize,
    sustain_point: usize,
    loop_start: usize,
    loop_end: usize,

    hard_reset: bool,
}

impl MultistageEnvelope {
    pub fn new() -> Self {
        let mut envelope = Self {
            level: [0; MAX_SEGMENTS + 1],
            time: [0; MAX_SEGMENTS],
            shape: [EnvelopeShape::Linear; MAX_SEGMENTS],
            segment: 0,
            start_value: 0,
            value: 0,
            phase: 0,
            phase_increment: 0,
            num_segments: 0,
            sustain_point: 0,
            loop_start: 0,
            loop_end: 0,
            hard_reset: false,
        };
        envelope.init();
        envelope
    }

    pub fn set_ad(&mut self, attack: u16, decay: u16) {
        self.num_segments = 2;
        self.sustain_point = 0;

        self.level[0] = 0;
        self.level[1] = 32767;
        self.level[2] = 0;

        self.time[0] = attack;
        self.time[1] = decay;

        self.shape[0] = EnvelopeShape::Linear;
        self.shape[1] = EnvelopeShape::Exponential;

        self.loop_start = 0;
        self.loop_end = 0;
    }

    pub fn set_adsr(&mut self, attack: u16, decay: u16, sustain: u16, release: u16) {
        self.num_segments = 3;
        self.sustain_point = 2;

        self.level[0] = 0;
        self.level[1] = 32767;
        self.level[2] = sustain.min(32767) as i16;
        self.level[3] = 0;

        self.time[0] = attack;
        self.time[1] = decay;
        self.time[2] = release;

        self.shape[0] = EnvelopeShape::Quartic;
        self.shape[1] = EnvelopeShape::Exponential;
        self.shape[2] = EnvelopeShape::Exponential;

        self.loop_start = 0;
        self.loop_end = 0;
    }

    /// Attack/decay pair repeating while the gate is held.
    pub fn set_ad_loop(&mut self, attack: u16, decay: u16) {
        self.set_ad(attack, decay);
        self.loop_start = 0;
        self.loop_end = 2;
    }

    pub fn set_hard_reset(&mut self, hard_reset: bool) {
        self.hard_reset = hard_reset;
    }

    pub fn value(&self) -> i16 {
        self.value
    }

    fn process_one(&mut self, control: Control) -> i16 {
        if control.rising() {
            self.start_value = if self.segment == self.num_segments || self.hard_reset {
                self.level[0]
            } else {
                self.value
            };
            self.segment = 0;
            self.phase = 0;
        } else if control.falling() && self.sustain_point != 0 {
            self.start_value = self.value;
            self.segment = self.sustain_point;
            self.phase = 0;
        } else if self.phase < self.phase_increment {
            // The phase wrapped: move on to the next segment.
            self.start_value = self.level[self.segment + 1];
            self.segment += 1;
            self.phase = 0;
            if self.loop_end != 0 && self.segment == self.loop_end && control.high() {
                self.segment = self.loop_start;
            }
        }

        let done = self.segment >= self.num_segments;
        let sustained =
            self.sustain_point != 0 && self.segment == self.sustain_point && control.high();

        self.phase_increment = if sustained || done {
            0
        } else {
            LUT_ENV_INCREMENTS[usize::from(self.time[self.segment] >> 8)]
        };

        if done {
            self.segment = self.num_segments;
            self.value = self.level[self.num_segments];
            return self.value;
        }

        let a = i32::from(self.start_value);
        let b = i32::from(self.level[self.segment + 1]);
        let t = i32::from(interpolate824_u16(self.shape[self.segment].table(), self.phase));
        self.value = (a + (((b - a) * (t >> 1)) >> 15)) as i16;
        self.phase = self.phase.wrapping_add(self.phase_increment);
        self.value
    }
}

impl Default for MultistageEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for MultistageEnvelope {
    fn init(&mut self) {
        self.set_adsr(0, 8192, 16384, 32767);
        self.segment = self.num_segments;
        self.phase = 0;
        self.phase_increment = 0;
        self.start_value = 0;
        self.value = 0;
        self.hard_reset = false;
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        match mode {
            ControlMode::Half => self.set_ad(parameters[0], parameters[1]),
            ControlMode::Full => {
                self.set_adsr(parameters[0], parameters[1], parameters[2] >> 1, parameters[3])
            }
        }
    }
}

impl BlockVoice for MultistageEnvelope {
    fn render(&mut self, control: &[Control], out: &mut [i16]) {
        for (control, out) in control.iter().zip(out.iter_mut()) {
            *out = self.process_one(*control);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(envelope: &mut MultistageEnvelope, gate: &[bool]) -> Vec<i16> {
        let mut previous = false;
        gate.iter()
            .map(|&high| {
                let mut control = Control::NONE;
                if high {
                    control |= Control::GATE;
                    if !previous {
                        control |= Control::GATE_RISING;
                    }
                } else if previous {
                    control |= Control::GATE_FALLING;
                }
                previous = high;
                let mut out = [0i16];
                envelope.render(&[control], &mut out);
                out[0]
            })
            .collect()
    }

    #[test]
    fn adsr_reaches_sustain_and_releases() {
        let mut envelope = MultistageEnvelope::new();
        envelope.set_adsr(0, 0, 16384, 0);
        let mut gate = vec![true; 4000];
        gate.extend(vec![false; 4000]);
        let out = run(&mut envelope, &gate);
        let peak = out[..200].iter().copied().max().unwrap_or(0);
        assert!(peak > 30000, "peak {peak}");
        assert!((i32::from(out[3999]) - 16384).abs() < 64, "sustain {}", out[3999]);
        assert!(out[7999].abs() < 64, "release {}", out[7999]);
    }

    #[test]
    fn idle_envelope_stays_at_zero() {
        let mut envelope = MultistageEnvelope::new();
        let out = run(&mut envelope, &[false; 256]);
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn ad_ignores_gate_length() {
        let mut envelope = MultistageEnvelope::new();
        envelope.set_ad(0, 0);
        let mut gate = vec![true; 10];
        gate.extend(vec![false; 2000]);
        let short = run(&mut envelope, &gate);

        let mut envelope = MultistageEnvelope::new();
        envelope.set_ad(0, 0);
        let long = run(&mut envelope, &vec![true; 2010]);
        assert_eq!(short[1500], long[1500]);
    }
}
