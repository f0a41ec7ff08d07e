/*
Excitation
==========

A decaying impulse used to strike resonators. `trigger` arms it with a level
and `process` (called once per sample) injects the magnitude of that level
after `delay` samples, then lets it fade:

    state
      │   ╲
      │    ╲__
      │       ‾‾‾──────___
      └──┬────────────────────→ samples
         delay

The decay multiplier is a 12-bit fraction (4096 = no decay). The sign of the
trigger level only flips the output, so several excitations with different
polarities can be stacked without their decays interfering.
*/

#[derive(Debug, Clone, Copy)]
pub struct Excitation {
    delay: u32,
    decay: u32,
    counter: u32,
    state: i32,
    level: i32,
}

impl Excitation {
    pub const DEFAULT_DECAY: u32 = 4093;

    pub fn new() -> Self {
        Self {
            delay: 0,
            decay: Self::DEFAULT_DECAY,
            counter: 0,
            state: 0,
            level: 0,
        }
    }

    pub fn init(&mut self) {
        *self = Self::new();
    }

    pub fn set_delay(&mut self, delay: u32) {
        self.delay = delay;
    }

    /// Per-sample multiplier out of 4096.
    pub fn set_decay(&mut self, decay: u32) {
        self.decay = decay.min(4096);
    }

    pub fn trigger(&mut self, level: i32) {
        self.level = level;
        self.counter = self.delay + 1;
    }

    /// True once the pre-delay since the last trigger has elapsed.
    #[inline]
    pub fn done(&self) -> bool {
        self.counter == 0
    }

    #[inline]
    pub fn process(&mut self) -> i32 {
        self.state = ((i64::from(self.state) * i64::from(self.decay)) >> 12) as i32;
        if self.counter > 0 {
            self.counter -= 1;
            if self.counter == 0 {
                self.state = self.state.saturating_add(self.level.saturating_abs());
            }
        }
        if self.level < 0 {
            -self.state
        } else {
            self.state
        }
    }

    #[inline]
    pub fn state(&self) -> i32 {
        self.state
    }
}

impl Default for Excitation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_never_grows_or_flips_sign() {
        for decay in [0, 1, 2048, 4000, 4093, 4095] {
            let mut excitation = Excitation::new();
            excitation.set_decay(decay);
            excitation.trigger(30000);
            let mut previous = i32::MAX;
            excitation.process();
            for _ in 0..2000 {
                let value = excitation.process();
                assert!(value >= 0, "sign flip with decay {decay}");
                assert!(value <= previous, "growth with decay {decay}");
                previous = value;
            }
        }
    }

    #[test]
    fn done_after_delay_plus_one_calls() {
        let mut excitation = Excitation::new();
        excitation.set_delay(5);
        excitation.trigger(1000);
        for _ in 0..6 {
            assert!(!excitation.done());
            excitation.process();
        }
        assert!(excitation.done());
        excitation.process();
        assert!(excitation.done());
    }

    #[test]
    fn impulse_lands_after_delay() {
        let mut excitation = Excitation::new();
        excitation.set_delay(3);
        excitation.trigger(1000);
        let out: Vec<i32> = (0..5).map(|_| excitation.process()).collect();
        assert_eq!(&out[..3], &[0, 0, 0]);
        assert_eq!(out[3], 1000);
        assert!(out[4] < 1000 && out[4] > 990);
    }

    #[test]
    fn negative_level_inverts_output() {
        let mut excitation = Excitation::new();
        excitation.trigger(-2000);
        assert_eq!(excitation.process(), -2000);
        assert!(excitation.state() > 0);
    }
}
