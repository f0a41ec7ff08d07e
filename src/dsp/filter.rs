use crate::dsp::math::{clip, interpolate824_u16};
use crate::dsp::resources::{LUT_SVF_CUTOFF, LUT_SVF_DAMP};

/*
Fixed-point state variable filter
=================================

Chamberlin topology: two integrators, both saturated to 16 bits after every
update, with the four responses taken from the same pass.

    notch = in - damp * bp
    lp   += f * bp
    hp    = notch - lp
    bp   += f * hp

`frequency` is a pitch in 7.7 fixed point (MIDI note << 7), `resonance` a
0..32767 amount. Both are turned into coefficients through lookup tables the
first time `process` runs after a change.

Punch modulates the coefficients with the low-pass output: loud transients
get a brighter, more damped filter, which makes struck resonators snap.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvfMode {
    LowPass,
    BandPass,
    HighPass,
    Peak,
}

#[derive(Debug, Clone, Copy)]
pub struct Svf {
    dirty: bool,
    frequency: i16,
    resonance: i16,
    punch: i32,
    f: i32,
    damp: i32,
    lp: i32,
    bp: i32,
    mode: SvfMode,
}

impl Svf {
    pub fn new() -> Self {
        Self {
            dirty: true,
            frequency: 33 << 7,
            resonance: 16384,
            punch: 0,
            f: 0,
            damp: 0,
            lp: 0,
            bp: 0,
            mode: SvfMode::BandPass,
        }
    }

    pub fn init(&mut self) {
        *self = Self::new();
    }

    pub fn set_frequency(&mut self, frequency: i16) {
        self.dirty = self.dirty || self.frequency != frequency;
        self.frequency = frequency;
    }

    pub fn set_resonance(&mut self, resonance: i16) {
        self.resonance = resonance;
        self.dirty = true;
    }

    pub fn set_punch(&mut self, punch: u16) {
        self.punch = ((u32::from(punch) * u32::from(punch)) >> 24) as i32;
    }

    pub fn set_mode(&mut self, mode: SvfMode) {
        self.mode = mode;
    }

    pub fn lp(&self) -> i32 {
        self.lp
    }

    pub fn bp(&self) -> i32 {
        self.bp
    }

    fn update_coefficients(&mut self) {
        let frequency = (self.frequency.max(0) as u32) << 17;
        let resonance = (self.resonance.max(0) as u32) << 17;
        self.f = i32::from(interpolate824_u16(&*LUT_SVF_CUTOFF, frequency));
        self.damp = i32::from(interpolate824_u16(&*LUT_SVF_DAMP, resonance));
        self.dirty = false;
    }

    #[inline]
    pub fn process(&mut self, input: i32) -> i32 {
        if self.dirty {
            self.update_coefficients();
        }
        let mut f = self.f;
        let mut damp = self.damp;
        if self.punch != 0 {
            let punch_signal = if self.lp > 4096 { self.lp } else { 2048 };
            f += ((punch_signal >> 4) * self.punch) >> 9;
            damp += (punch_signal - 2048) >> 3;
        }
        let notch = input - ((i64::from(self.bp) * i64::from(damp)) >> 15) as i32;
        self.lp = clip(self.lp + ((i64::from(f) * i64::from(self.bp)) >> 15) as i32);
        let hp = clip(notch - self.lp);
        self.bp = clip(self.bp + ((i64::from(f) * i64::from(hp)) >> 15) as i32);
        match self.mode {
            SvfMode::LowPass => self.lp,
            SvfMode::BandPass => self.bp,
            SvfMode::HighPass => hp,
            SvfMode::Peak => clip(self.lp - hp),
        }
    }
}

impl Default for Svf {
    fn default() -> Self {
        Self::new()
    }
}
