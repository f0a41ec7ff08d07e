use crate::dsp::math::{clip, interpolate824};
use crate::dsp::pitch::compute_phase_increment;
use crate::dsp::resources::WAV_SINE;
use crate::dsp::{Random, Svf, SvfMode};
use crate::processors::gate::Control;
use crate::voices::{BlockVoice, ControlMode, Parameters, Voice};

/// How long a digit's tone sounds after each trigger (150 ms).
const TONE_DURATION: u32 = 7200;
/// Semitone offsets of the ten digit tones from the base pitch.
const DIGIT_INTERVALS: [i16; 10] = [0, 2, 4, 5, 7, 9, 11, 12, 14, 16];
const ALWAYS: u32 = 0xffff_0000;

/// Shortwave numbers-station pastiche.
///
/// Each trigger may pick a new random digit, then sounds that digit's tone
/// for a moment. The tone is ring modulated by a drifting interference
/// whistle, buried in band-passed static, folded, and band-limited by a
/// low-pass/high-pass pair like a cheap receiver.
#[derive(Debug, Clone)]
pub struct NumberStation {
    transition_probability: u32,
    pitch: i16,
    noise_amount: i32,
    distortion: i32,

    digit: u8,
    tone_countdown: u32,
    tone_envelope: i32,
    tone_phase: u32,
    interference_phase: u32,
    drift_phase: u32,

    noise_filter: Svf,
    lp: Svf,
    hp: Svf,
    random: Random,
}

fn fold(x: i32) -> i32 {
    let mut x = x;
    for _ in 0..4 {
        if x > 32767 {
            x = 65534 - x;
        } else if x < -32767 {
            x = -65534 - x;
        } else {
            break;
        }
    }
    clip(x)
}

impl NumberStation {
    pub fn new() -> Self {
        let mut station = Self {
            transition_probability: 0,
            pitch: 0,
            noise_amount: 0,
            distortion: 0,
            digit: 0,
            tone_countdown: 0,
            tone_envelope: 0,
            tone_phase: 0,
            interference_phase: 0,
            drift_phase: 0,
            noise_filter: Svf::new(),
            lp: Svf::new(),
            hp: Svf::new(),
            random: Random::new(),
        };
        station.init();
        station
    }

    pub fn set_transition_probability(&mut self, probability: u16) {
        self.transition_probability = u32::from(probability) << 16;
    }

    /// Base pitch of the digit tones, from two to five octaves above C0.
    pub fn set_pitch(&mut self, pitch: u16) {
        self.pitch = (60 << 7) + ((i32::from(pitch) * (36 << 7)) >> 16) as i16 - (18 << 7);
    }

    pub fn set_noise_amount(&mut self, amount: u16) {
        self.noise_amount = i32::from(amount >> 1);
    }

    pub fn set_distortion(&mut self, distortion: u16) {
        self.distortion = i32::from(distortion >> 2);
    }

    /// Digit currently being sent.
    pub fn digit(&self) -> u8 {
        self.digit
    }

    /// True while a digit tone is sounding.
    pub fn gate(&self) -> bool {
        self.tone_countdown > 0
    }

    fn process_one(&mut self, control: Control) -> i16 {
        if control.rising() {
            if self.transition_probability >= ALWAYS
                || self.random.word() < self.transition_probability
            {
                self.digit = ((u64::from(self.random.word()) * 10) >> 32) as u8;
            }
            self.tone_countdown = TONE_DURATION;
        }

        let target = if self.tone_countdown > 0 {
            self.tone_countdown -= 1;
            32767
        } else {
            0
        };
        self.tone_envelope += (target - self.tone_envelope) >> 6;

        let pitch = self.pitch + (DIGIT_INTERVALS[usize::from(self.digit)] << 7);
        self.tone_phase = self
            .tone_phase
            .wrapping_add(compute_phase_increment(pitch));
        let tone = i32::from(interpolate824(&*WAV_SINE, self.tone_phase));
        let tone = (tone * self.tone_envelope) >> 15;

        // Whistle drifting by a few semitones over a couple of seconds.
        self.drift_phase = self.drift_phase.wrapping_add(1 << 20);
        let drift = i32::from(interpolate824(&*WAV_SINE, self.drift_phase)) >> 5;
        let whistle_pitch = (i32::from(self.pitch) + (19 << 7) + drift).clamp(0, 16383) as i16;
        self.interference_phase = self
            .interference_phase
            .wrapping_add(compute_phase_increment(whistle_pitch));
        let interference = i32::from(interpolate824(&*WAV_SINE, self.interference_phase));

        let ring = (tone * interference) >> 15;
        let mut signal = (tone >> 1) + (ring >> 2) + (interference >> 5);

        let noise = self.noise_filter.process(i32::from(self.random.sample()));
        signal += (noise * self.noise_amount) >> 15;

        let drive = 32768 + self.distortion * 3;
        let signal = fold(((i64::from(signal) * i64::from(drive)) >> 15) as i32);

        let signal = self.lp.process(signal);
        clip(self.hp.process(signal)) as i16
    }
}

impl Default for NumberStation {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for NumberStation {
    fn init(&mut self) {
        self.noise_filter.init();
        self.noise_filter.set_mode(SvfMode::BandPass);
        self.noise_filter.set_frequency(84 << 7);
        self.noise_filter.set_resonance(26000);

        self.lp.init();
        self.lp.set_mode(SvfMode::LowPass);
        self.lp.set_frequency(100 << 7);
        self.lp.set_resonance(4000);

        self.hp.init();
        self.hp.set_mode(SvfMode::HighPass);
        self.hp.set_frequency(45 << 7);
        self.hp.set_resonance(4000);

        self.digit = 0;
        self.tone_countdown = 0;
        self.tone_envelope = 0;
        self.tone_phase = 0;
        self.interference_phase = 0;
        self.drift_phase = 0;

        self.set_transition_probability(32768);
        self.set_pitch(32768);
        self.set_noise_amount(16384);
        self.set_distortion(0);
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        match mode {
            ControlMode::Half => {
                self.set_transition_probability(parameters[0]);
                self.set_noise_amount(parameters[1]);
                self.set_pitch(32768);
                self.set_distortion(0);
            }
            ControlMode::Full => {
                self.set_pitch(parameters[0]);
                self.set_transition_probability(parameters[1]);
                self.set_noise_amount(parameters[2]);
                self.set_distortion(parameters[3]);
            }
        }
    }
}

impl BlockVoice for NumberStation {
    fn render(&mut self, control: &[Control], out: &mut [i16]) {
        for (control, out) in control.iter().zip(out.iter_mut()) {
            *out = self.process_one(*control);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clocked(station: &mut NumberStation, edges: usize) -> Vec<u8> {
        let mut digits = Vec::new();
        let mut out = [0i16; 1000];
        for _ in 0..edges {
            let mut control = [Control::NONE; 1000];
            control[0] = Control::GATE_RISING;
            station.render(&control, &mut out);
            digits.push(station.digit());
        }
        digits
    }

    #[test]
    fn certain_transitions_change_digits() {
        let mut station = NumberStation::new();
        station.set_transition_probability(65535);
        let digits = clocked(&mut station, 64);
        let mut distinct = digits.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert!(distinct.len() >= 5, "{distinct:?}");
    }

    #[test]
    fn zero_probability_holds_the_digit() {
        let mut station = NumberStation::new();
        station.set_transition_probability(0);
        let digits = clocked(&mut station, 32);
        assert!(digits.iter().all(|&d| d == digits[0]));
    }

    #[test]
    fn tone_gate_follows_trigger() {
        let mut station = NumberStation::new();
        assert!(!station.gate());
        let mut out = [0i16; 16];
        let mut control = [Control::NONE; 16];
        control[0] = Control::GATE_RISING;
        station.render(&control, &mut out);
        assert!(station.gate());
        let mut tail = vec![0i16; TONE_DURATION as usize];
        station.render(&vec![Control::NONE; TONE_DURATION as usize], &mut tail);
        assert!(!station.gate());
    }
}
