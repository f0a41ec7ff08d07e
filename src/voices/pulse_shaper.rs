use crate::dsp::resources::LUT_PULSE_TIMES;
use crate::processors::gate::Control;
use crate::voices::{ControlMode, Parameters, SampleVoice, Voice};

const NUM_PULSES: usize = 32;
/// Forced low time (1 ms) when a pulse starts while the output is high.
const RETRIGGER_NOTCH: u32 = 48;
/// Output level of a high gate, about +5 V.
pub(crate) const GATE_HIGH: i16 = 20480;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PulseState {
    Idle,
    Waiting,
    On,
}

#[derive(Debug, Clone, Copy)]
struct Pulse {
    state: PulseState,
    counter: u32,
    remaining_repetitions: u32,
}

impl Pulse {
    const IDLE: Pulse = Pulse {
        state: PulseState::Idle,
        counter: 0,
        remaining_repetitions: 0,
    };
}

/// Turns each trigger into a delayed, stretched and optionally repeated
/// gate.
///
/// Up to 32 pulses are tracked at once so triggers arriving faster than the
/// delay are not lost. Overlapping pulses merge into one gate; when a new
/// pulse begins on an already high output, a short notch is cut so the next
/// module still sees an edge.
#[derive(Debug, Clone)]
pub struct PulseShaper {
    pulses: [Pulse; NUM_PULSES],
    next_pulse: usize,
    delay: u32,
    duration: u32,
    repetition_delay: u32,
    num_repetitions: u32,
    notch: u32,
    previous_high: bool,
}

fn pulse_time(value: u16) -> u32 {
    let index = usize::from(value >> 8);
    let a = i64::from(LUT_PULSE_TIMES[index]);
    let b = i64::from(LUT_PULSE_TIMES[index + 1]);
    ((a + (((b - a) * i64::from(value & 0xff)) >> 8)) as u32).max(1)
}

impl PulseShaper {
    pub fn new() -> Self {
        let mut shaper = Self {
            pulses: [Pulse::IDLE; NUM_PULSES],
            next_pulse: 0,
            delay: 0,
            duration: 0,
            repetition_delay: 0,
            num_repetitions: 0,
            notch: 0,
            previous_high: false,
        };
        shaper.init();
        shaper
    }

    /// Initial delay in samples.
    pub fn set_delay_samples(&mut self, delay: u32) {
        self.delay = delay;
    }

    /// Gate length in samples, at least one.
    pub fn set_duration_samples(&mut self, duration: u32) {
        self.duration = duration.max(1);
    }

    /// Gap between the end of one repetition and the start of the next.
    pub fn set_repetition_delay_samples(&mut self, delay: u32) {
        self.repetition_delay = delay;
    }

    pub fn set_num_repetitions(&mut self, num_repetitions: u32) {
        self.num_repetitions = num_repetitions;
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    fn trigger(&mut self) {
        let slot = (0..NUM_PULSES)
            .map(|offset| (self.next_pulse + offset) % NUM_PULSES)
            .find(|&i| self.pulses[i].state == PulseState::Idle)
            .unwrap_or(self.next_pulse);
        self.pulses[slot] = Pulse {
            state: PulseState::Waiting,
            counter: self.delay,
            remaining_repetitions: self.num_repetitions,
        };
        self.next_pulse = (slot + 1) % NUM_PULSES;
    }
}

impl Default for PulseShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for PulseShaper {
    fn init(&mut self) {
        self.pulses = [Pulse::IDLE; NUM_PULSES];
        self.next_pulse = 0;
        self.delay = 0;
        self.duration = pulse_time(32768);
        self.repetition_delay = pulse_time(32768);
        self.num_repetitions = 0;
        self.notch = 0;
        self.previous_high = false;
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        match mode {
            ControlMode::Half => {
                self.set_delay_samples(pulse_time(parameters[0]) - 1);
                self.set_duration_samples(pulse_time(parameters[1]));
                self.set_num_repetitions(0);
            }
            ControlMode::Full => {
                self.set_delay_samples(pulse_time(parameters[0]) - 1);
                self.set_duration_samples(pulse_time(parameters[1]));
                self.set_repetition_delay_samples(pulse_time(parameters[2]));
                self.set_num_repetitions(u32::from(parameters[3] >> 12));
            }
        }
    }
}

impl SampleVoice for PulseShaper {
    fn process(&mut self, control: Control) -> i16 {
        if control.rising() {
            self.trigger();
        }

        let mut high = false;
        let mut started = false;
        for pulse in self.pulses.iter_mut() {
            if pulse.state == PulseState::Waiting {
                if pulse.counter == 0 {
                    pulse.state = PulseState::On;
                    pulse.counter = self.duration;
                    started = true;
                } else {
                    pulse.counter -= 1;
                }
            }
            if pulse.state == PulseState::On {
                high = true;
                pulse.counter -= 1;
                if pulse.counter == 0 {
                    if pulse.remaining_repetitions > 0 {
                        pulse.remaining_repetitions -= 1;
                        pulse.state = PulseState::Waiting;
                        pulse.counter = self.repetition_delay;
                    } else {
                        pulse.state = PulseState::Idle;
                    }
                }
            }
        }

        if started && self.previous_high {
            self.notch = RETRIGGER_NOTCH;
        }
        self.previous_high = high;

        if self.notch > 0 {
            self.notch -= 1;
            return 0;
        }
        if high {
            GATE_HIGH
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(shaper: &mut PulseShaper, triggers: &[usize], length: usize) -> Vec<i16> {
        (0..length)
            .map(|n| {
                let control = if triggers.contains(&n) {
                    Control::GATE | Control::GATE_RISING
                } else {
                    Control::NONE
                };
                shaper.process(control)
            })
            .collect()
    }

    fn windows(out: &[i16]) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        let mut start = None;
        for (n, &s) in out.iter().enumerate() {
            match (start, s > 0) {
                (None, true) => start = Some(n),
                (Some(begin), false) => {
                    found.push((begin, n - begin));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(begin) = start {
            found.push((begin, out.len() - begin));
        }
        found
    }

    #[test]
    fn single_trigger_gives_one_window() {
        let mut shaper = PulseShaper::new();
        shaper.set_delay_samples(100);
        shaper.set_duration_samples(480);
        shaper.set_num_repetitions(0);
        let out = run(&mut shaper, &[10], 4000);
        assert_eq!(windows(&out), vec![(110, 480)]);
    }

    #[test]
    fn repetitions_follow_the_first_pulse() {
        let mut shaper = PulseShaper::new();
        shaper.set_delay_samples(0);
        shaper.set_duration_samples(100);
        shaper.set_repetition_delay_samples(200);
        shaper.set_num_repetitions(2);
        let out = run(&mut shaper, &[0], 2000);
        assert_eq!(windows(&out), vec![(0, 100), (300, 100), (600, 100)]);
    }

    #[test]
    fn overlapping_pulse_cuts_a_notch() {
        let mut shaper = PulseShaper::new();
        shaper.set_delay_samples(0);
        shaper.set_duration_samples(1000);
        let out = run(&mut shaper, &[0, 500], 3000);
        let found = windows(&out);
        assert_eq!(found.len(), 2, "{found:?}");
        assert_eq!(found[0], (0, 500));
        assert_eq!(found[1].0, 500 + RETRIGGER_NOTCH as usize);
    }
}
