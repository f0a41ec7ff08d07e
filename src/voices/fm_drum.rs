use crate::dsp::math::{clip, interpolate824, interpolate824_u16, interpolate88};
use crate::dsp::pitch::compute_phase_increment;
use crate::dsp::resources::{LUT_ENV_EXPO, LUT_ENV_INCREMENTS, WAV_SINE, WS_VIOLENT_OVERDRIVE};
use crate::dsp::Random;
use crate::processors::gate::Control;
use crate::voices::{BlockVoice, ControlMode, Parameters, Voice};

/// Index into the envelope time table for the fixed pitch chirp (~20 ms).
const AUX_ENVELOPE_TIME: usize = 83;

/// Phase increment of a decay segment lasting `time` (0..65535 scale).
fn envelope_increment(time: u16) -> u32 {
    let index = usize::from(time >> 8);
    let a = i64::from(LUT_ENV_INCREMENTS[index]);
    let b = i64::from(LUT_ENV_INCREMENTS[index + 1]);
    (a + (((b - a) * i64::from(time & 0xff)) >> 8)) as u32
}

/// `65535 - expo(phase)`: starts at full scale, decays to zero.
#[inline]
fn decaying(phase: u32) -> i32 {
    65535 - i32::from(interpolate824_u16(&*LUT_ENV_EXPO, phase))
}

/// Sine drum whose pitch is swept by a decaying modulation envelope.
///
/// Three envelopes restart on every hit: amplitude, pitch sweep ("FM") and
/// a short fixed chirp that only low-pitched drums get. The last output
/// sample feeds back into the pitch. Pitch is recomputed every fourth
/// sample.
#[derive(Debug, Clone)]
pub struct FmDrum {
    frequency: i16,
    fm_amount: u16,
    am_decay: u16,
    fm_decay: u16,
    noise: i32,
    overdrive: i32,
    aux_envelope_strength: i32,

    phase: u32,
    phase_increment: u32,
    fm_envelope_phase: u32,
    am_envelope_phase: u32,
    aux_envelope_phase: u32,
    previous_sample: i16,
    random: Random,
}

impl FmDrum {
    pub fn new() -> Self {
        let mut drum = Self {
            frequency: 0,
            fm_amount: 0,
            am_decay: 0,
            fm_decay: 0,
            noise: 0,
            overdrive: 0,
            aux_envelope_strength: 0,
            phase: 0,
            phase_increment: 0,
            fm_envelope_phase: u32::MAX,
            am_envelope_phase: u32::MAX,
            aux_envelope_phase: u32::MAX,
            previous_sample: 0,
            random: Random::new(),
        };
        drum.init();
        drum
    }

    pub fn set_frequency(&mut self, frequency: u16) {
        let frequency = u32::from(frequency);
        self.aux_envelope_strength = if frequency <= 16384 {
            1024
        } else if frequency <= 32768 {
            2048 - (frequency >> 4) as i32
        } else {
            0
        };
        self.frequency = ((24 << 7) + (((72 << 7) * frequency) >> 16)) as i16;
    }

    pub fn set_fm_amount(&mut self, fm_amount: u16) {
        self.fm_amount = fm_amount >> 2;
    }

    pub fn set_decay(&mut self, decay: u16) {
        self.am_decay = 16384 + (decay >> 1);
        self.fm_decay = 8192 + (decay >> 2);
    }

    /// Below the middle the knob adds overdrive, above it adds noise.
    pub fn set_noise(&mut self, noise: u16) {
        let n = i32::from(noise);
        self.noise = if n >= 32768 {
            (((n - 32768) * (n - 32768)) >> 15 >> 2) * 5
        } else {
            0
        };
        self.overdrive = if n <= 32767 {
            ((32767 - n) * (32767 - n)) >> 14
        } else {
            0
        };
    }

    fn advance(phase: u32, increment: u32) -> u32 {
        phase.saturating_add(increment)
    }
}

impl Default for FmDrum {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for FmDrum {
    fn init(&mut self) {
        self.phase = 0;
        self.phase_increment = 0;
        self.fm_envelope_phase = u32::MAX;
        self.am_envelope_phase = u32::MAX;
        self.aux_envelope_phase = u32::MAX;
        self.previous_sample = 0;
        self.set_frequency(16384);
        self.set_fm_amount(16384);
        self.set_decay(32768);
        self.set_noise(32768);
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        match mode {
            ControlMode::Half => {
                self.set_frequency(parameters[0]);
                self.set_fm_amount(parameters[1]);
                self.set_decay(16384 + (parameters[1] >> 1));
                self.set_noise(32768);
            }
            ControlMode::Full => {
                self.set_frequency(parameters[0]);
                self.set_fm_amount(parameters[1]);
                self.set_decay(parameters[2]);
                self.set_noise(parameters[3]);
            }
        }
    }
}

impl BlockVoice for FmDrum {
    fn render(&mut self, control: &[Control], out: &mut [i16]) {
        let am_increment = envelope_increment(self.am_decay);
        let fm_increment = envelope_increment(self.fm_decay).saturating_mul(4);
        let aux_increment = LUT_ENV_INCREMENTS[AUX_ENVELOPE_TIME].saturating_mul(4);

        for (i, (control, out)) in control.iter().zip(out.iter_mut()).enumerate() {
            if control.rising() {
                self.phase = 0;
                self.fm_envelope_phase = 0;
                self.am_envelope_phase = 0;
                self.aux_envelope_phase = 0;
            }

            if i & 3 == 0 {
                let aux_envelope = decaying(self.aux_envelope_phase);
                let fm_envelope = decaying(self.fm_envelope_phase);
                let mut pitch = i32::from(self.frequency);
                pitch += (fm_envelope * i32::from(self.fm_amount)) >> 16;
                pitch += (aux_envelope * self.aux_envelope_strength) >> 15;
                pitch += i32::from(self.previous_sample) >> 6;
                self.phase_increment = compute_phase_increment(pitch.clamp(0, 16383) as i16);
                self.fm_envelope_phase = Self::advance(self.fm_envelope_phase, fm_increment);
                self.aux_envelope_phase = Self::advance(self.aux_envelope_phase, aux_increment);
            }

            self.phase = self.phase.wrapping_add(self.phase_increment);
            let mut mix = i32::from(interpolate824(&*WAV_SINE, self.phase));
            if self.noise != 0 {
                let noise = i32::from(self.random.sample());
                mix += ((i64::from(noise - mix) * i64::from(self.noise)) >> 16) as i32;
            }

            let am = decaying(self.am_envelope_phase);
            self.am_envelope_phase = Self::advance(self.am_envelope_phase, am_increment);
            mix = ((i64::from(mix) * i64::from(am)) >> 16) as i32;

            if self.overdrive != 0 {
                let driven = i32::from(interpolate88(&*WS_VIOLENT_OVERDRIVE, (mix + 32768) as u16));
                mix += ((i64::from(driven - mix) * i64::from(self.overdrive)) >> 16) as i32;
            }

            let sample = clip(mix) as i16;
            self.previous_sample = sample;
            *out = sample;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BLOCK_SIZE;

    fn render(drum: &mut FmDrum, blocks: usize, trigger: bool) -> Vec<i16> {
        let mut out = Vec::with_capacity(blocks * BLOCK_SIZE);
        for block in 0..blocks {
            let mut control = [Control::NONE; BLOCK_SIZE];
            if trigger && block == 0 {
                control[0] = Control::GATE | Control::GATE_RISING;
            }
            let mut buffer = [0i16; BLOCK_SIZE];
            drum.render(&control, &mut buffer);
            out.extend_from_slice(&buffer);
        }
        out
    }

    #[test]
    fn silent_before_first_hit() {
        let mut drum = FmDrum::new();
        let out = render(&mut drum, 32, false);
        assert!(out.iter().all(|s| s.abs() < 4));
    }

    #[test]
    fn hit_decays() {
        let mut drum = FmDrum::new();
        let out = render(&mut drum, 3000, true);
        let head = out[..2000].iter().map(|s| i32::from(*s).abs()).max().unwrap_or(0);
        let tail = out[40_000..].iter().map(|s| i32::from(*s).abs()).max().unwrap_or(0);
        assert!(head > 10_000, "head {head}");
        assert!(tail < head / 20, "tail {tail}");
    }

    #[test]
    fn noise_knob_splits_in_two() {
        let mut drum = FmDrum::new();
        drum.set_noise(0);
        assert!(drum.overdrive > 0 && drum.noise == 0);
        drum.set_noise(65535);
        assert!(drum.overdrive == 0 && drum.noise > 0);
        drum.set_noise(32768);
        assert!(drum.overdrive == 0 && drum.noise == 0);
    }
}
