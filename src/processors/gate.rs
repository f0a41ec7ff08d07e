use std::ops::{BitOr, BitOrAssign};

/// Per-sample control byte handed to every voice.
///
/// The low nibble describes the channel's own gate, the high nibble the
/// other channel's (auxiliary) gate. Edge bits are set only on the sample
/// where the level changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Control(pub u8);

impl Control {
    pub const NONE: Control = Control(0);
    pub const GATE: Control = Control(0x01);
    pub const GATE_RISING: Control = Control(0x02);
    pub const GATE_FALLING: Control = Control(0x04);
    /// The edge came from a front panel button rather than a jack.
    pub const FROM_BUTTON: Control = Control(0x08);
    pub const GATE_AUXILIARY: Control = Control(0x10);
    pub const GATE_RISING_AUXILIARY: Control = Control(0x20);
    pub const GATE_FALLING_AUXILIARY: Control = Control(0x40);

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn contains(self, other: Control) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn high(self) -> bool {
        self.contains(Self::GATE)
    }

    #[inline]
    pub fn rising(self) -> bool {
        self.contains(Self::GATE_RISING)
    }

    #[inline]
    pub fn falling(self) -> bool {
        self.contains(Self::GATE_FALLING)
    }

    #[inline]
    pub fn auxiliary_rising(self) -> bool {
        self.contains(Self::GATE_RISING_AUXILIARY)
    }

    /// Move this channel's gate bits into the auxiliary nibble.
    #[inline]
    pub fn as_auxiliary(self) -> Control {
        Control((self.0 & 0x07) << 4)
    }
}

impl BitOr for Control {
    type Output = Control;

    fn bitor(self, rhs: Control) -> Control {
        Control(self.0 | rhs.0)
    }
}

impl BitOrAssign for Control {
    fn bitor_assign(&mut self, rhs: Control) {
        self.0 |= rhs.0;
    }
}

/// Turns a sampled gate level into level and edge flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateDetector {
    previous: bool,
}

impl GateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, high: bool) -> Control {
        let mut flags = Control::NONE;
        if high {
            flags |= Control::GATE;
            if !self.previous {
                flags |= Control::GATE_RISING;
            }
        } else if self.previous {
            flags |= Control::GATE_FALLING;
        }
        self.previous = high;
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_reported_once() {
        let mut detector = GateDetector::new();
        let levels = [false, true, true, true, false, false, true];
        let flags: Vec<Control> = levels.iter().map(|&l| detector.process(l)).collect();
        let rising = flags.iter().filter(|f| f.rising()).count();
        let falling = flags.iter().filter(|f| f.falling()).count();
        assert_eq!(rising, 2);
        assert_eq!(falling, 1);
        assert!(flags[1].rising() && flags[1].high());
        assert!(flags[2].high() && !flags[2].rising());
        assert!(flags[4].falling() && !flags[4].high());
    }

    #[test]
    fn auxiliary_nibble() {
        let flags = Control::GATE | Control::GATE_RISING;
        let aux = flags.as_auxiliary();
        assert!(aux.auxiliary_rising());
        assert!(aux.contains(Control::GATE_AUXILIARY));
        assert!(!aux.rising());
    }
}
