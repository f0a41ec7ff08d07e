use crate::dsp::math::clip;
use crate::dsp::{Excitation, Svf, SvfMode};
use crate::processors::gate::Control;
use crate::voices::{bipolar, ControlMode, Parameters, SampleVoice, Voice};

const OSCILLATOR_INCREMENTS: [u32; 6] = [
    48_318_382, 71_582_788, 37_044_092, 54_313_440, 66_214_079, 93_952_409,
];

/// Six square waves at inharmonic ratios, band-passed, sent through a
/// one-sided VCA and high-passed, the way the 808 cymbal circuit does it.
///
/// Reached from the snare when both its tone and snappy knobs are maxed, so
/// only the frequency and decay knobs have a say here.
#[derive(Debug, Clone)]
pub struct HighHat {
    noise: Svf,
    vca_coloration: Svf,
    vca_envelope: Excitation,
    phase: [u32; 6],
}

impl HighHat {
    pub fn new() -> Self {
        let mut hat = Self {
            noise: Svf::new(),
            vca_coloration: Svf::new(),
            vca_envelope: Excitation::new(),
            phase: [0; 6],
        };
        hat.init();
        hat
    }

    /// Signed transposition of the metallic band, about +-7 semitones.
    pub fn set_frequency(&mut self, frequency: i16) {
        let shift = ((i32::from(frequency) * 896) >> 15) as i16;
        self.noise.set_frequency((105 << 7) + shift);
        self.vca_coloration.set_frequency((110 << 7) + shift);
    }

    pub fn set_decay(&mut self, decay: u16) {
        self.vca_envelope.set_decay(4090 + u32::from(decay >> 13).min(5));
    }
}

impl Default for HighHat {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for HighHat {
    fn init(&mut self) {
        self.noise.init();
        self.noise.set_frequency(105 << 7);
        self.noise.set_resonance(24000);
        self.noise.set_mode(SvfMode::BandPass);

        self.vca_coloration.init();
        self.vca_coloration.set_frequency(110 << 7);
        self.vca_coloration.set_resonance(0);
        self.vca_coloration.set_mode(SvfMode::HighPass);

        self.vca_envelope.init();
        self.vca_envelope.set_delay(0);
        self.vca_envelope.set_decay(4093);

        self.phase = [0; 6];
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        match mode {
            ControlMode::Half => {
                self.set_frequency(0);
                self.vca_envelope.set_decay(4093);
            }
            ControlMode::Full => {
                self.set_frequency(bipolar(parameters[0]));
                self.set_decay(parameters[3]);
            }
        }
    }
}

impl SampleVoice for HighHat {
    fn process(&mut self, control: Control) -> i16 {
        if control.rising() {
            self.vca_envelope.trigger(32768 * 15);
        }

        let mut noise = 0i32;
        for (phase, increment) in self.phase.iter_mut().zip(OSCILLATOR_INCREMENTS) {
            *phase = phase.wrapping_add(increment);
            noise += (*phase >> 31) as i32;
        }
        noise <<= 12;

        // Two passes per sample keep the resonant band-pass stable.
        let mut filtered_noise = self.noise.process(noise);
        filtered_noise += self.noise.process(noise);

        // The VCA only lets the positive half through.
        let filtered_noise = filtered_noise.clamp(0, 32767);

        let envelope = self.vca_envelope.process() >> 4;
        let vca_noise = clip(((i64::from(envelope) * i64::from(filtered_noise)) >> 14) as i32);

        let mut hh = self.vca_coloration.process(vca_noise);
        hh += self.vca_coloration.process(vca_noise);
        clip(hh << 1) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_hat_is_short() {
        let mut hat = HighHat::new();
        hat.process(Control::GATE_RISING);
        let out: Vec<i32> = (0..24_000).map(|_| i32::from(hat.process(Control::NONE))).collect();
        let early = out[..2000].iter().map(|s| s.abs()).max().unwrap_or(0);
        let late = out[20_000..].iter().map(|s| s.abs()).max().unwrap_or(0);
        assert!(early > 1000, "early {early}");
        assert!(late < early / 10, "late {late}");
    }
}
