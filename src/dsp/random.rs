/// Linear congruential noise source.
///
/// Each algorithm owns its own generator so channels stay independent and
/// runs are reproducible from the seed.
#[derive(Debug, Clone, Copy)]
pub struct Random {
    state: u32,
}

impl Random {
    pub const DEFAULT_SEED: u32 = 0x21;

    pub fn new() -> Self {
        Self::with_seed(Self::DEFAULT_SEED)
    }

    pub fn with_seed(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn seed(&mut self, seed: u32) {
        self.state = seed;
    }

    #[inline]
    pub fn state(&self) -> u32 {
        self.state
    }

    #[inline]
    pub fn word(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.state
    }

    /// Signed 16-bit white noise sample.
    #[inline]
    pub fn sample(&mut self) -> i16 {
        (self.word() >> 16) as i16
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}
