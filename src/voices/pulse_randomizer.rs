use crate::dsp::resources::LUT_PULSE_TIMES;
use crate::dsp::Random;
use crate::processors::gate::Control;
use crate::voices::pulse_shaper::GATE_HIGH;
use crate::voices::{ControlMode, Parameters, SampleVoice, Voice};

const NUM_DELAY_LINES: usize = 32;
/// Length of every emitted trigger (2 ms).
const TRIGGER_DURATION: u32 = 96;
/// Repetitions never come closer than this, so each one is a separate edge.
const MIN_DELAY: u32 = 2 * TRIGGER_DURATION;
const ALWAYS: u32 = 0xffff_0000;

/// Probabilistic trigger gate and echo.
///
/// An incoming edge passes with the acceptance probability. A passed edge
/// schedules a repetition with the repetition probability, after a delay
/// drawn around the mean delay with some jitter, and each repetition rolls
/// the dice again.
#[derive(Debug, Clone)]
pub struct PulseRandomizer {
    // Samples until each pending repetition fires; 0 is a free slot.
    delay_lines: [u32; NUM_DELAY_LINES],
    acceptance_probability: u32,
    repetition_probability: u32,
    delay_average: u32,
    delay_randomness: u32,
    trigger_countdown: u32,
    random: Random,
}

impl PulseRandomizer {
    pub fn new() -> Self {
        let mut randomizer = Self {
            delay_lines: [0; NUM_DELAY_LINES],
            acceptance_probability: 0,
            repetition_probability: 0,
            delay_average: 0,
            delay_randomness: 0,
            trigger_countdown: 0,
            random: Random::new(),
        };
        randomizer.init();
        randomizer
    }

    /// 0 never lets anything through, 65535 always does.
    pub fn set_acceptance_probability(&mut self, probability: u16) {
        self.acceptance_probability = u32::from(probability) << 16;
    }

    pub fn set_repetition_probability(&mut self, probability: u16) {
        self.repetition_probability = u32::from(probability) << 16;
    }

    pub fn set_delay_average(&mut self, delay: u16) {
        let index = usize::from(delay >> 8);
        self.delay_average = LUT_PULSE_TIMES[index].max(MIN_DELAY);
    }

    /// Spread of the delay, as a fraction of the mean.
    pub fn set_delay_randomness(&mut self, randomness: u16) {
        self.delay_randomness = u32::from(randomness);
    }

    fn chance(&mut self, probability: u32) -> bool {
        probability >= ALWAYS || self.random.word() < probability
    }

    fn schedule_repetition(&mut self) {
        if !self.chance(self.repetition_probability) {
            return;
        }
        let spread = ((u64::from(self.delay_average) * u64::from(self.delay_randomness)) >> 16) as i64;
        let jitter = if spread > 0 {
            (i64::from(self.random.word()) % (2 * spread + 1)) - spread
        } else {
            0
        };
        let delay = (i64::from(self.delay_average) + jitter).max(i64::from(MIN_DELAY)) as u32;
        if let Some(slot) = self.delay_lines.iter_mut().find(|d| **d == 0) {
            *slot = delay;
        }
    }

    fn fire(&mut self) {
        self.trigger_countdown = TRIGGER_DURATION;
        self.schedule_repetition();
    }
}

impl Default for PulseRandomizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for PulseRandomizer {
    fn init(&mut self) {
        self.delay_lines = [0; NUM_DELAY_LINES];
        self.set_acceptance_probability(65535);
        self.set_repetition_probability(0);
        self.set_delay_average(32768);
        self.set_delay_randomness(0);
        self.trigger_countdown = 0;
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        self.set_acceptance_probability(parameters[0]);
        self.set_repetition_probability(parameters[1]);
        match mode {
            ControlMode::Half => {
                self.set_delay_average(32768);
                self.set_delay_randomness(8192);
            }
            ControlMode::Full => {
                self.set_delay_average(parameters[2]);
                self.set_delay_randomness(parameters[3]);
            }
        }
    }
}

impl SampleVoice for PulseRandomizer {
    fn process(&mut self, control: Control) -> i16 {
        if control.rising() && self.chance(self.acceptance_probability) {
            self.fire();
        }

        let mut due = 0;
        for delay in self.delay_lines.iter_mut() {
            if *delay > 0 {
                *delay -= 1;
                if *delay == 0 {
                    due += 1;
                }
            }
        }
        for _ in 0..due {
            self.fire();
        }

        if self.trigger_countdown > 0 {
            self.trigger_countdown -= 1;
            GATE_HIGH
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_triggers(randomizer: &mut PulseRandomizer, edges: usize, spacing: usize) -> usize {
        let mut count = 0;
        let mut previous = 0;
        for n in 0..edges * spacing {
            let control = if n % spacing == 0 {
                Control::GATE | Control::GATE_RISING
            } else {
                Control::NONE
            };
            let out = randomizer.process(control);
            if out > 0 && previous == 0 {
                count += 1;
            }
            previous = out;
        }
        count
    }

    #[test]
    fn full_acceptance_passes_everything() {
        let mut randomizer = PulseRandomizer::new();
        assert_eq!(count_triggers(&mut randomizer, 50, 1000), 50);
    }

    #[test]
    fn zero_acceptance_blocks_everything() {
        let mut randomizer = PulseRandomizer::new();
        randomizer.set_acceptance_probability(0);
        assert_eq!(count_triggers(&mut randomizer, 50, 1000), 0);
    }

    #[test]
    fn half_acceptance_passes_about_half() {
        let mut randomizer = PulseRandomizer::new();
        randomizer.set_acceptance_probability(32768);
        let count = count_triggers(&mut randomizer, 400, 500);
        assert!((120..280).contains(&count), "{count}");
    }

    #[test]
    fn repetitions_echo_the_trigger() {
        let mut randomizer = PulseRandomizer::new();
        randomizer.set_repetition_probability(65535);
        randomizer.set_delay_average(0);
        // One edge, then a long silence: the echo keeps going.
        let mut edges = 0;
        let mut previous = 0;
        for n in 0..20_000 {
            let control = if n == 0 { Control::GATE_RISING } else { Control::NONE };
            let out = randomizer.process(control);
            if out > 0 && previous == 0 {
                edges += 1;
            }
            previous = out;
        }
        assert!(edges > 10, "{edges}");
    }
}
