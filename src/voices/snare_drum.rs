use crate::dsp::math::clip16;
use crate::dsp::{Excitation, Random, Svf, SvfMode};
use crate::processors::gate::Control;
use crate::voices::{bipolar, ControlMode, Parameters, SampleVoice, Voice};

/// Two struck body resonators an octave apart plus band-passed noise.
///
/// "Tone" balances the two bodies, "snappy" sets the noise level.
#[derive(Debug, Clone)]
pub struct SnareDrum {
    excitation_1_up: Excitation,
    excitation_1_down: Excitation,
    excitation_2: Excitation,
    excitation_noise: Excitation,
    body_1: Svf,
    body_2: Svf,
    noise: Svf,
    random: Random,
    gain_1: i32,
    gain_2: i32,
    snappy: i32,
}

impl SnareDrum {
    pub fn new() -> Self {
        let mut drum = Self {
            excitation_1_up: Excitation::new(),
            excitation_1_down: Excitation::new(),
            excitation_2: Excitation::new(),
            excitation_noise: Excitation::new(),
            body_1: Svf::new(),
            body_2: Svf::new(),
            noise: Svf::new(),
            random: Random::new(),
            gain_1: 0,
            gain_2: 0,
            snappy: 0,
        };
        drum.init();
        drum
    }

    pub fn set_tone(&mut self, tone: u16) {
        self.gain_1 = 22000 - i32::from(tone >> 2);
        self.gain_2 = 22000 + i32::from(tone >> 2);
    }

    pub fn set_snappy(&mut self, snappy: u16) {
        self.snappy = 512 + i32::from((snappy >> 1).min(28672));
    }

    pub fn set_decay(&mut self, decay: u16) {
        let offset = (decay >> 5) as i16;
        self.body_1.set_resonance(29000 + offset);
        self.body_2.set_resonance(26500 + offset);
        self.excitation_noise.set_decay(4092 + u32::from(decay >> 14));
    }

    pub fn set_frequency(&mut self, frequency: i16) {
        let base_note = (52 << 7) + ((i32::from(frequency) * 896) >> 15) as i16;
        self.body_1.set_frequency(base_note);
        self.body_2.set_frequency(base_note + (12 << 7));
        self.noise.set_frequency(base_note + (48 << 7));
    }
}

impl Default for SnareDrum {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for SnareDrum {
    fn init(&mut self) {
        self.excitation_1_up.init();
        self.excitation_1_up.set_delay(0);
        self.excitation_1_up.set_decay(1536);

        self.excitation_1_down.init();
        self.excitation_1_down.set_delay(48);
        self.excitation_1_down.set_decay(3072);

        self.excitation_2.init();
        self.excitation_2.set_delay(48);
        self.excitation_2.set_decay(1200);

        self.excitation_noise.init();
        self.excitation_noise.set_delay(0);

        self.body_1.init();
        self.body_2.init();

        self.noise.init();
        self.noise.set_resonance(2000);
        self.noise.set_mode(SvfMode::BandPass);

        self.set_tone(0);
        self.set_snappy(32768);
        self.set_decay(32768);
        self.set_frequency(0);
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        match mode {
            ControlMode::Half => {
                self.set_frequency(0);
                self.set_decay(32768);
                self.set_tone(parameters[0]);
                self.set_snappy(parameters[1]);
            }
            ControlMode::Full => {
                self.set_frequency(bipolar(parameters[0]));
                self.set_tone(parameters[1]);
                self.set_snappy(parameters[2]);
                self.set_decay(parameters[3]);
            }
        }
    }
}

impl SampleVoice for SnareDrum {
    fn process(&mut self, control: Control) -> i16 {
        if control.rising() {
            self.excitation_1_up.trigger(15 * 32768);
            self.excitation_1_down.trigger(-32768);
            self.excitation_2.trigger(13107);
            self.excitation_noise.trigger(self.snappy);
        }

        let mut excitation_1 = self.excitation_1_up.process();
        excitation_1 += self.excitation_1_down.process();
        if !self.excitation_1_down.done() {
            excitation_1 += 2621;
        }
        let body_1 = self.body_1.process(excitation_1) + (excitation_1 >> 4);

        let mut excitation_2 = self.excitation_2.process();
        if !self.excitation_2.done() {
            excitation_2 += 13107;
        }
        let body_2 = self.body_2.process(excitation_2) + (excitation_2 >> 4);

        let noise = self.noise.process(i32::from(self.random.sample()));
        let noise_envelope = self.excitation_noise.process();

        let mut sd = (i64::from(body_1) * i64::from(self.gain_1)) >> 15;
        sd += (i64::from(body_2) * i64::from(self.gain_2)) >> 15;
        sd += (i64::from(noise_envelope) * i64::from(noise)) >> 15;
        clip16(sd.clamp(-32768, 32767) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_until_struck() {
        let mut drum = SnareDrum::new();
        for _ in 0..100 {
            assert_eq!(drum.process(Control::NONE), 0);
        }
        drum.process(Control::GATE_RISING);
        let peak = (0..2000)
            .map(|_| i32::from(drum.process(Control::NONE)).abs())
            .max()
            .unwrap_or(0);
        assert!(peak > 4000, "peak {peak}");
    }

    #[test]
    fn snappy_adds_noise_tail() {
        let tail = |snappy: u16| {
            let mut drum = SnareDrum::new();
            drum.set_snappy(snappy);
            drum.process(Control::GATE_RISING);
            let body: Vec<i64> = (0..6000).map(|_| i64::from(drum.process(Control::NONE))).collect();
            body[1000..].iter().map(|s| s.abs()).sum::<i64>()
        };
        assert!(tail(65535) > tail(0));
    }
}
