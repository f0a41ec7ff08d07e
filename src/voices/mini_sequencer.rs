use crate::processors::gate::Control;
use crate::voices::{bipolar, ControlMode, Parameters, SampleVoice, Voice};

const MAX_STEPS: usize = 4;

/// Knob-per-step CV sequencer. Each gate advances, the other channel's gate
/// resets to the first step.
#[derive(Debug, Clone)]
pub struct MiniSequencer {
    steps: [i16; MAX_STEPS],
    num_steps: usize,
    step: usize,
}

impl MiniSequencer {
    pub fn new() -> Self {
        let mut sequencer = Self {
            steps: [0; MAX_STEPS],
            num_steps: MAX_STEPS,
            step: 0,
        };
        sequencer.init();
        sequencer
    }

    pub fn set_num_steps(&mut self, num_steps: usize) {
        self.num_steps = num_steps.clamp(1, MAX_STEPS);
    }

    pub fn set_step(&mut self, index: usize, value: u16) {
        if let Some(step) = self.steps.get_mut(index) {
            *step = bipolar(value);
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }
}

impl Default for MiniSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for MiniSequencer {
    fn init(&mut self) {
        self.num_steps = MAX_STEPS;
        self.step = 0;
        self.steps = [0; MAX_STEPS];
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        match mode {
            ControlMode::Half => {
                self.set_num_steps(2);
                self.set_step(0, parameters[0]);
                self.set_step(1, parameters[1]);
            }
            ControlMode::Full => {
                self.set_num_steps(4);
                for (index, &value) in parameters.iter().enumerate() {
                    self.set_step(index, value);
                }
            }
        }
    }
}

impl SampleVoice for MiniSequencer {
    fn process(&mut self, control: Control) -> i16 {
        if control.rising() {
            self.step += 1;
        }
        if control.auxiliary_rising() {
            self.step = 0;
        }
        if self.step >= self.num_steps {
            self.step = 0;
        }
        // +-5 V full scale.
        ((i32::from(self.steps[self.step]) * 40960) >> 16) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_advances_and_wraps() {
        let mut sequencer = MiniSequencer::new();
        sequencer.configure(&[0, 32768, 49152, 65535], ControlMode::Full);
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(sequencer.process(Control::GATE_RISING));
            sequencer.process(Control::NONE);
        }
        assert_eq!(seen[0], ((i32::from(bipolar(32768)) * 40960) >> 16) as i16);
        assert_eq!(seen[3], ((-32768i32 * 40960) >> 16) as i16);
        assert_eq!(seen[4], seen[0]);
    }

    #[test]
    fn auxiliary_gate_resets() {
        let mut sequencer = MiniSequencer::new();
        sequencer.configure(&[1000, 2000, 3000, 4000], ControlMode::Full);
        sequencer.process(Control::GATE_RISING);
        sequencer.process(Control::GATE_RISING);
        assert_eq!(sequencer.step(), 2);
        sequencer.process(Control::GATE_RISING_AUXILIARY);
        assert_eq!(sequencer.step(), 0);
    }

    #[test]
    fn half_mode_has_two_steps() {
        let mut sequencer = MiniSequencer::new();
        sequencer.configure(&[0, 65535, 0, 0], ControlMode::Half);
        let a = sequencer.process(Control::NONE);
        let b = sequencer.process(Control::GATE_RISING);
        let c = sequencer.process(Control::GATE_RISING);
        assert!(a < 0 && b > 0);
        assert_eq!(a, c);
    }
}
