use crate::dsp::math::clip;
use crate::dsp::{Excitation, Svf, SvfMode};
use crate::processors::gate::Control;
use crate::voices::{bipolar, ControlMode, Parameters, SampleVoice, Voice};

/*
808-style bass drum
===================

Three excitations strike a band-pass resonator:

    pulse_up    big positive click, fast decay
    pulse_down  negative pulse 1 ms later, plus a DC step while it waits
    attack_fm   no audio; while it is pending the resonator is tuned 17
                semitones up, giving the pitch drop at the start of the hit

The resonator output plus a bit of dry excitation goes through a one-pole
low-pass whose coefficient is the "tone" control.
*/

#[derive(Debug, Clone)]
pub struct BassDrum {
    pulse_up: Excitation,
    pulse_down: Excitation,
    attack_fm: Excitation,
    resonator: Svf,
    frequency: i16,
    lp_coefficient: i32,
    lp_state: i32,
}

impl BassDrum {
    pub fn new() -> Self {
        let mut drum = Self {
            pulse_up: Excitation::new(),
            pulse_down: Excitation::new(),
            attack_fm: Excitation::new(),
            resonator: Svf::new(),
            frequency: 0,
            lp_coefficient: 0,
            lp_state: 0,
        };
        drum.init();
        drum
    }

    /// Signed transposition around the base note, about +-7 semitones.
    pub fn set_frequency(&mut self, frequency: i16) {
        self.frequency = (31 << 7) + ((i32::from(frequency) * 896) >> 15) as i16;
    }

    pub fn set_decay(&mut self, decay: u16) {
        let scaled = 65535 - u32::from(decay);
        let squared = (scaled * scaled) >> 16;
        let scaled = (squared * scaled) >> 18;
        self.resonator.set_resonance((32768 - 128 - scaled as i32) as i16);
    }

    pub fn set_tone(&mut self, tone: u16) {
        let coefficient = u32::from(tone);
        let coefficient = (coefficient * coefficient) >> 16;
        self.lp_coefficient = 512 + ((coefficient >> 2) * 3) as i32;
    }

    pub fn set_punch(&mut self, punch: u16) {
        self.resonator
            .set_punch(((u32::from(punch) * u32::from(punch)) >> 16) as u16);
    }
}

impl Default for BassDrum {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for BassDrum {
    fn init(&mut self) {
        self.pulse_up.init();
        self.pulse_down.init();
        self.attack_fm.init();
        self.resonator.init();

        self.pulse_up.set_delay(0);
        self.pulse_up.set_decay(3340);

        self.pulse_down.set_delay(48);
        self.pulse_down.set_decay(3072);

        self.attack_fm.set_delay(192);
        self.attack_fm.set_decay(4093);

        self.resonator.set_punch(32768);
        self.resonator.set_mode(SvfMode::BandPass);

        self.set_frequency(0);
        self.set_decay(32768);
        self.set_tone(32768);
        self.set_punch(65535);

        self.lp_state = 0;
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        match mode {
            ControlMode::Half => {
                self.set_frequency(0);
                self.set_punch(40000);
                self.set_tone(8192 + (parameters[0] >> 1));
                self.set_decay(parameters[1]);
            }
            ControlMode::Full => {
                self.set_frequency(bipolar(parameters[0]));
                self.set_punch(parameters[1]);
                self.set_tone(parameters[2]);
                self.set_decay(parameters[3]);
            }
        }
    }
}

impl SampleVoice for BassDrum {
    fn process(&mut self, control: Control) -> i16 {
        if control.rising() {
            self.pulse_up.trigger(275_251);
            self.pulse_down.trigger(-13_763);
            self.attack_fm.trigger(18_000);
        }

        let mut excitation = self.pulse_up.process();
        if !self.pulse_down.done() {
            excitation += 16384;
        }
        excitation += self.pulse_down.process();
        self.attack_fm.process();

        let shift = if self.attack_fm.done() { 0 } else { 17 << 7 };
        self.resonator.set_frequency(self.frequency + shift);

        let resonator_output = (excitation >> 4) + self.resonator.process(excitation);
        self.lp_state = clip(
            self.lp_state
                + ((i64::from(resonator_output - self.lp_state) * i64::from(self.lp_coefficient))
                    >> 15) as i32,
        );
        self.lp_state as i16
    }
}
