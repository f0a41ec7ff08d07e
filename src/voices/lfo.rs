use crate::dsp::math::{interpolate824, interpolate824_u16};
use crate::dsp::resources::{LUT_LFO_INCREMENTS, LUT_RAISED_COSINE, WAV_SINE};
use crate::dsp::{PatternPredictor, Random};
use crate::processors::gate::Control;
use crate::voices::{bipolar, BlockVoice, ControlMode, Parameters, Voice};

/// Taps further apart than this (8 s) are treated as a fresh start.
const SYNC_COUNTER_MAX_TIME: u32 = 8 * crate::SAMPLE_RATE;
/// Taps closer than this (40 ms) are an audio-rate clock: smooth the period
/// instead of predicting it, and never reset the phase.
const FAST_CLOCK_PERIOD: u32 = 1920;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoShape {
    Sine,
    Triangle,
    Square,
    Steps,
    Noise,
}

impl LfoShape {
    pub const ALL: [LfoShape; 5] = [
        LfoShape::Sine,
        LfoShape::Triangle,
        LfoShape::Square,
        LfoShape::Steps,
        LfoShape::Noise,
    ];
}

/// Shape/parameter pairs reachable from a single knob in half mode.
const PRESETS: [(LfoShape, i16); 8] = [
    (LfoShape::Sine, 0),
    (LfoShape::Triangle, 0),
    (LfoShape::Triangle, -32767),
    (LfoShape::Triangle, 32767),
    (LfoShape::Square, 0),
    (LfoShape::Square, -24576),
    (LfoShape::Steps, 0),
    (LfoShape::Noise, 32767),
];

/// Low frequency oscillator, free running or locked to tapped clocks.
///
/// `parameter` reshapes each waveform: skew for the triangle, pulse width
/// for the square, step count for the staircase and smoothness for the
/// noise. In sync mode the period comes from the spacing of gate edges,
/// extrapolated by a [`PatternPredictor`] so irregular rhythms are followed.
#[derive(Debug, Clone)]
pub struct Lfo {
    rate: u16,
    shape: LfoShape,
    parameter: i16,
    reset_phase: u32,
    level: i32,
    sync: bool,

    phase: u32,
    phase_increment: u32,
    period: u32,
    sync_counter: u32,
    pattern_predictor: PatternPredictor,

    // Triangle slopes, recomputed when the parameter changes.
    previous_parameter: i32,
    attack_factor: u64,
    decay_factor: u64,

    random: Random,
    value: i16,
    next_value: i16,
}

impl Lfo {
    pub fn new() -> Self {
        let mut lfo = Self {
            rate: 0,
            shape: LfoShape::Sine,
            parameter: 0,
            reset_phase: 0,
            level: 32767,
            sync: false,
            phase: 0,
            phase_increment: 0,
            period: 0,
            sync_counter: SYNC_COUNTER_MAX_TIME,
            pattern_predictor: PatternPredictor::new(),
            previous_parameter: i32::MIN,
            attack_factor: 0,
            decay_factor: 0,
            random: Random::new(),
            value: 0,
            next_value: 0,
        };
        lfo.init();
        lfo
    }

    pub fn set_rate(&mut self, rate: u16) {
        self.rate = rate;
    }

    pub fn set_shape(&mut self, shape: LfoShape) {
        self.shape = shape;
    }

    /// Pick a shape from a knob sweeping all of them.
    pub fn set_shape_integer(&mut self, value: u16) {
        let index = (usize::from(value) * LfoShape::ALL.len()) >> 16;
        self.shape = LfoShape::ALL[index];
    }

    pub fn set_shape_parameter_preset(&mut self, value: u16) {
        let (shape, parameter) = PRESETS[usize::from(value >> 13)];
        self.shape = shape;
        self.parameter = parameter;
    }

    pub fn set_parameter(&mut self, parameter: i16) {
        self.parameter = parameter;
    }

    pub fn set_reset_phase(&mut self, reset_phase: i16) {
        self.reset_phase = (i32::from(reset_phase) << 16) as u32;
    }

    pub fn set_level(&mut self, level: u16) {
        self.level = i32::from(level >> 1);
    }

    pub fn set_sync(&mut self, sync: bool) {
        if sync && !self.sync {
            self.pattern_predictor.init();
        }
        self.sync = sync;
    }

    pub fn sync(&self) -> bool {
        self.sync
    }

    pub fn shape(&self) -> LfoShape {
        self.shape
    }

    fn sine(&self) -> i32 {
        i32::from(interpolate824(&*WAV_SINE, self.phase))
    }

    fn triangle(&mut self) -> i32 {
        let break_point = (i32::from(self.parameter) + 32768).clamp(1, 65535);
        if break_point != self.previous_parameter {
            let break_point = break_point as u64;
            self.attack_factor = (65535 << 16) / break_point;
            self.decay_factor = (65535 << 16) / (65536 - break_point);
            self.previous_parameter = break_point as i32;
        }
        let break_point = break_point as u64;
        let phase = u64::from(self.phase >> 16);
        let value = if phase < break_point {
            (phase * self.attack_factor) >> 16
        } else {
            65535u64.saturating_sub(((phase - break_point) * self.decay_factor) >> 16)
        };
        value.min(65535) as i32 - 32768
    }

    fn square(&self) -> i32 {
        let threshold = ((i32::from(self.parameter) + 32768).clamp(1024, 64511) as u32) << 16;
        if self.phase < threshold {
            32767
        } else {
            -32767
        }
    }

    fn steps(&self) -> i32 {
        let num_steps = 2 + ((i32::from(self.parameter) + 32768) >> 12) as u32;
        let step = ((self.phase >> 16) * num_steps) >> 16;
        (step * 65535 / (num_steps - 1)) as i32 - 32768
    }

    fn noise(&mut self, wrapped: bool) -> i32 {
        if wrapped {
            self.value = self.next_value;
            self.next_value = self.random.sample();
        }
        let linear = i64::from(self.phase >> 16);
        let smooth = i64::from(interpolate824_u16(&*LUT_RAISED_COSINE, self.phase));
        let smoothness = i64::from(self.parameter) + 32768;
        let t = linear + (((smooth - linear) * smoothness) >> 16);
        let a = i64::from(self.value);
        let b = i64::from(self.next_value);
        (a + (((b - a) * t) >> 16)) as i32
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for Lfo {
    fn init(&mut self) {
        self.rate = 0;
        self.shape = LfoShape::Square;
        self.parameter = 0;
        self.reset_phase = 0;
        self.level = 32767;
        self.sync = false;
        self.phase = 0;
        self.phase_increment = 0;
        self.period = 0;
        self.sync_counter = SYNC_COUNTER_MAX_TIME;
        self.pattern_predictor.init();
        self.previous_parameter = i32::MIN;
        self.value = 0;
        self.next_value = 0;
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        if self.sync {
            self.set_level(parameters[0]);
        } else {
            self.set_rate(parameters[0]);
        }
        match mode {
            ControlMode::Half => {
                self.set_shape_parameter_preset(parameters[1]);
                self.set_reset_phase(0);
            }
            ControlMode::Full => {
                self.set_shape_integer(parameters[1]);
                self.set_parameter(bipolar(parameters[2]));
                self.set_reset_phase(bipolar(parameters[3]));
            }
        }
    }
}

impl BlockVoice for Lfo {
    fn render(&mut self, control: &[Control], out: &mut [i16]) {
        if !self.sync {
            let index = usize::from(self.rate >> 8);
            let a = i64::from(LUT_LFO_INCREMENTS[index]);
            let b = i64::from(LUT_LFO_INCREMENTS[index + 1]);
            self.phase_increment = (a + (((b - a) * i64::from(self.rate & 0xff)) >> 8)) as u32;
        }

        for (control, out) in control.iter().zip(out.iter_mut()) {
            self.sync_counter = self.sync_counter.saturating_add(1);
            if control.rising() {
                let mut reset_phase = true;
                if self.sync {
                    if self.sync_counter < SYNC_COUNTER_MAX_TIME {
                        let period = if self.sync_counter < FAST_CLOCK_PERIOD {
                            reset_phase = false;
                            (3 * self.period + self.sync_counter) >> 2
                        } else {
                            self.pattern_predictor.predict(self.sync_counter)
                        };
                        if period != self.period {
                            self.period = period;
                            self.phase_increment = u32::MAX / period.max(1);
                        }
                    }
                    self.sync_counter = 0;
                }
                if reset_phase {
                    self.phase = self.reset_phase;
                }
            }

            let previous_phase = self.phase;
            self.phase = self.phase.wrapping_add(self.phase_increment);
            let wrapped = self.phase < previous_phase;
            let sample = match self.shape {
                LfoShape::Sine => self.sine(),
                LfoShape::Triangle => self.triangle(),
                LfoShape::Square => self.square(),
                LfoShape::Steps => self.steps(),
                LfoShape::Noise => self.noise(wrapped),
            };
            *out = ((sample * self.level) >> 15) as i16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lfo: &mut Lfo, controls: &[Control]) -> Vec<i16> {
        let mut out = vec![0i16; controls.len()];
        lfo.render(controls, &mut out);
        out
    }

    fn rising_edges(out: &[i16]) -> usize {
        out.windows(2).filter(|w| w[0] < 0 && w[1] >= 0).count()
    }

    #[test]
    fn free_running_rate_sets_frequency() {
        let mut slow = Lfo::new();
        slow.set_shape(LfoShape::Sine);
        slow.set_rate(32768);
        let mut fast = Lfo::new();
        fast.set_shape(LfoShape::Sine);
        fast.set_rate(60000);
        let controls = vec![Control::NONE; 96_000];
        assert!(rising_edges(&run(&mut fast, &controls)) > rising_edges(&run(&mut slow, &controls)));
    }

    #[test]
    fn tap_tempo_locks_to_clock() {
        let mut lfo = Lfo::new();
        lfo.set_sync(true);
        let mut controls = vec![Control::NONE; 4800 * 12];
        for tap in controls.iter_mut().step_by(4800) {
            *tap = Control::GATE | Control::GATE_RISING;
        }
        run(&mut lfo, &controls);
        let expected = u32::MAX / 4800;
        let error = lfo.phase_increment.abs_diff(expected);
        assert!(error < expected / 100, "increment {}", lfo.phase_increment);
    }

    #[test]
    fn every_shape_moves() {
        for shape in LfoShape::ALL {
            for parameter in [-32768, -1000, 0, 20000, 32767] {
                let mut lfo = Lfo::new();
                lfo.set_shape(shape);
                lfo.set_parameter(parameter);
                lfo.set_rate(65535);
                let out = run(&mut lfo, &vec![Control::NONE; 4000]);
                assert!(out.iter().any(|&s| s != out[0]), "{shape:?} {parameter}");
            }
        }
    }

    #[test]
    fn half_mode_presets_cover_the_knob() {
        let mut lfo = Lfo::new();
        lfo.set_shape_parameter_preset(0);
        assert_eq!(lfo.shape(), LfoShape::Sine);
        lfo.set_shape_parameter_preset(65535);
        assert_eq!(lfo.shape(), LfoShape::Noise);
    }
}
