/*
Digital Oscillator
==================

One audio-rate voice with 35 selectable shapes: ring modulators, formant and
vowel synthesis, FM, additive bells and drums, physical models (strings,
bowed and blown pipes), wavetables and a handful of noise generators.

Every shape reads the same inputs:

  pitch        MIDI note in 7.7 fixed point (60 << 7 is middle C)
  parameter 0  timbre, 0..65535
  parameter 1  color, 0..65535
  sync         one byte per output sample, non-zero resets the phase

and writes signed 16-bit samples. Parameters are halved on the way in: every
algorithm works on 15-bit values.

Shapes keep their scratch state in `State`, reset in full whenever the shape
changes. The comb filter and the physical models share delay memory that is
allocated once with the oscillator and cleared on every shape change.

Some shapes render at half rate and write the average of two consecutive
samples in between, which halves their cost and tames aliasing.
*/

mod additive;
mod classic;
mod digital;
mod fm;
mod formant;
mod noise;
mod percussion;
mod physical;
mod state;
mod wavetable;

use std::fmt;

use log::debug;

use crate::dsp::math::interpolate824;
use crate::dsp::pitch::{compute_delay, compute_phase_increment, HIGHEST_NOTE};
use crate::dsp::resources::{LUT_FM_FREQUENCY_QUANTIZER, WAV_SINE};
use crate::dsp::{Excitation, Random, Svf};
use crate::error::{Error, Result};

use state::{DelayLines, State};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DigitalOscillatorShape {
    #[default]
    TripleRingMod = 0,
    SawSwarm,
    CombFilter,
    Toy,
    DigitalFilterLp,
    DigitalFilterPk,
    DigitalFilterBp,
    DigitalFilterHp,
    Vosim,
    Vowel,
    VowelFof,
    Harmonics,
    Fm,
    FeedbackFm,
    ChaoticFeedbackFm,
    StruckBell,
    StruckDrum,
    Kick,
    Cymbal,
    Snare,
    Plucked,
    Bowed,
    Blown,
    Fluted,
    Wavetables,
    WaveMap,
    WaveLine,
    WaveParaphonic,
    FilteredNoise,
    TwinPeaksNoise,
    ClockedNoise,
    GranularCloud,
    ParticleNoise,
    DigitalModulation,
    QuestionMark,
}

impl DigitalOscillatorShape {
    pub const ALL: [DigitalOscillatorShape; 35] = [
        Self::TripleRingMod,
        Self::SawSwarm,
        Self::CombFilter,
        Self::Toy,
        Self::DigitalFilterLp,
        Self::DigitalFilterPk,
        Self::DigitalFilterBp,
        Self::DigitalFilterHp,
        Self::Vosim,
        Self::Vowel,
        Self::VowelFof,
        Self::Harmonics,
        Self::Fm,
        Self::FeedbackFm,
        Self::ChaoticFeedbackFm,
        Self::StruckBell,
        Self::StruckDrum,
        Self::Kick,
        Self::Cymbal,
        Self::Snare,
        Self::Plucked,
        Self::Bowed,
        Self::Blown,
        Self::Fluted,
        Self::Wavetables,
        Self::WaveMap,
        Self::WaveLine,
        Self::WaveParaphonic,
        Self::FilteredNoise,
        Self::TwinPeaksNoise,
        Self::ClockedNoise,
        Self::GranularCloud,
        Self::ParticleNoise,
        Self::DigitalModulation,
        Self::QuestionMark,
    ];

    /// Short display name, as printed on a module panel.
    pub fn name(self) -> &'static str {
        match self {
            Self::TripleRingMod => "RING",
            Self::SawSwarm => "SWRM",
            Self::CombFilter => "COMB",
            Self::Toy => "TOY*",
            Self::DigitalFilterLp => "ZLPF",
            Self::DigitalFilterPk => "ZPKF",
            Self::DigitalFilterBp => "ZBPF",
            Self::DigitalFilterHp => "ZHPF",
            Self::Vosim => "VOSM",
            Self::Vowel => "VOWL",
            Self::VowelFof => "VFOF",
            Self::Harmonics => "HARM",
            Self::Fm => "FM  ",
            Self::FeedbackFm => "FBFM",
            Self::ChaoticFeedbackFm => "WTFM",
            Self::StruckBell => "BELL",
            Self::StruckDrum => "DRUM",
            Self::Kick => "KICK",
            Self::Cymbal => "CYMB",
            Self::Snare => "SNAR",
            Self::Plucked => "PLUK",
            Self::Bowed => "BOWD",
            Self::Blown => "BLOW",
            Self::Fluted => "FLUT",
            Self::Wavetables => "WTBL",
            Self::WaveMap => "WMAP",
            Self::WaveLine => "WLIN",
            Self::WaveParaphonic => "WTX4",
            Self::FilteredNoise => "NOIS",
            Self::TwinPeaksNoise => "TWNQ",
            Self::ClockedNoise => "CLKN",
            Self::GranularCloud => "CLOU",
            Self::ParticleNoise => "PRTC",
            Self::DigitalModulation => "QPSK",
            Self::QuestionMark => "????",
        }
    }

    /// Shapes whose second parameter snaps to musical frequency ratios.
    fn quantizes_ratio(self) -> bool {
        matches!(self, Self::Fm | Self::FeedbackFm | Self::ChaoticFeedbackFm)
    }
}

impl fmt::Display for DigitalOscillatorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().trim_end())
    }
}

impl TryFrom<u8> for DigitalOscillatorShape {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(Error::InvalidShape(value))
    }
}

pub struct DigitalOscillator {
    shape: DigitalOscillatorShape,
    /// Shape the state was last initialized for.
    active_shape: Option<DigitalOscillatorShape>,
    pitch: i16,
    parameter: [i16; 2],
    previous_parameter: [i16; 2],

    phase: u32,
    phase_increment: u32,
    delay: u32,
    strike: bool,
    needs_init: bool,
    active_voice: usize,

    pulse: [Excitation; 4],
    svf: [Svf; 3],
    random: Random,
    state: State,
    delay_lines: DelayLines,
}

impl DigitalOscillator {
    pub fn new() -> Self {
        let mut oscillator = Self {
            shape: DigitalOscillatorShape::default(),
            active_shape: None,
            pitch: 60 << 7,
            parameter: [0; 2],
            previous_parameter: [0; 2],
            phase: 0,
            phase_increment: 0,
            delay: 0,
            strike: false,
            needs_init: false,
            active_voice: 0,
            pulse: [Excitation::new(); 4],
            svf: [Svf::new(); 3],
            random: Random::new(),
            state: State::default(),
            delay_lines: DelayLines::new(),
        };
        oscillator.init();
        oscillator
    }

    /// Reset every shape's state, as on power-on. Parameters and pitch are
    /// kept.
    pub fn init(&mut self) {
        self.state = State::default();
        self.delay_lines.clear();
        for pulse in self.pulse.iter_mut() {
            pulse.init();
        }
        for svf in self.svf.iter_mut() {
            svf.init();
        }
        self.phase = 0;
        self.active_voice = 0;
        self.strike = true;
        self.needs_init = true;
    }

    pub fn shape(&self) -> DigitalOscillatorShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: DigitalOscillatorShape) {
        self.shape = shape;
    }

    pub fn pitch(&self) -> i16 {
        self.pitch
    }

    /// Above note 90 the new pitch is averaged with the previous one, which
    /// smooths out jitter where it is most audible.
    pub fn set_pitch(&mut self, pitch: i16) {
        if pitch > (90 << 7) && self.pitch > (90 << 7) {
            self.pitch = ((i32::from(self.pitch) + i32::from(pitch)) >> 1) as i16;
        } else {
            self.pitch = pitch;
        }
    }

    pub fn set_parameters(&mut self, timbre: u16, color: u16) {
        self.parameter = [(timbre >> 1) as i16, (color >> 1) as i16];
    }

    pub fn set_parameter(&mut self, index: usize, value: u16) -> Result<()> {
        let slot = self
            .parameter
            .get_mut(index)
            .ok_or(Error::ParameterIndex(index))?;
        *slot = (value >> 1) as i16;
        Ok(())
    }

    /// Excite the struck and plucked shapes on the next render.
    pub fn strike(&mut self) {
        self.strike = true;
    }

    pub fn phase_increment(&self) -> u32 {
        self.phase_increment
    }

    /// Render `buffer.len()` samples. `sync` carries one byte per sample;
    /// missing bytes count as no sync. The comb filter processes what is
    /// already in `buffer`, every other shape overwrites it.
    pub fn render(&mut self, sync: &[u8], buffer: &mut [i16]) {
        if buffer.is_empty() {
            return;
        }
        if self.active_shape != Some(self.shape) {
            debug!("oscillator shape -> {}", self.shape);
            self.init();
            self.active_shape = Some(self.shape);
        }

        let saved_color = self.parameter[1];
        if self.shape.quantizes_ratio() {
            let index = (self.parameter[1].max(0) >> 8) as usize;
            self.parameter[1] = LUT_FM_FREQUENCY_QUANTIZER[index];
        }

        self.phase_increment = compute_phase_increment(self.pitch);
        self.delay = compute_delay(self.pitch);
        self.pitch = self.pitch.clamp(0, HIGHEST_NOTE as i16);

        use DigitalOscillatorShape as S;
        match self.shape {
            S::TripleRingMod => self.render_triple_ring_mod(sync, buffer),
            S::SawSwarm => self.render_saw_swarm(sync, buffer),
            S::CombFilter => self.render_comb_filter(buffer),
            S::Toy => self.render_toy(sync, buffer),
            S::DigitalFilterLp => self.render_digital_filter(0, sync, buffer),
            S::DigitalFilterPk => self.render_digital_filter(1, sync, buffer),
            S::DigitalFilterBp => self.render_digital_filter(2, sync, buffer),
            S::DigitalFilterHp => self.render_digital_filter(3, sync, buffer),
            S::Vosim => self.render_vosim(sync, buffer),
            S::Vowel => self.render_vowel(buffer),
            S::VowelFof => self.render_vowel_fof(sync, buffer),
            S::Harmonics => self.render_harmonics(sync, buffer),
            S::Fm => self.render_fm(sync, buffer),
            S::FeedbackFm => self.render_feedback_fm(sync, buffer),
            S::ChaoticFeedbackFm => self.render_chaotic_feedback_fm(sync, buffer),
            S::StruckBell => self.render_struck_bell(buffer),
            S::StruckDrum => self.render_struck_drum(buffer),
            S::Kick => self.render_kick(buffer),
            S::Cymbal => self.render_cymbal(buffer),
            S::Snare => self.render_snare(buffer),
            S::Plucked => self.render_plucked(buffer),
            S::Bowed => self.render_bowed(buffer),
            S::Blown => self.render_blown(buffer),
            S::Fluted => self.render_fluted(buffer),
            S::Wavetables => self.render_wavetables(sync, buffer),
            S::WaveMap => self.render_wave_map(sync, buffer),
            S::WaveLine => self.render_wave_line(sync, buffer),
            S::WaveParaphonic => self.render_wave_paraphonic(buffer),
            S::FilteredNoise => self.render_filtered_noise(buffer),
            S::TwinPeaksNoise => self.render_twin_peaks_noise(buffer),
            S::ClockedNoise => self.render_clocked_noise(sync, buffer),
            S::GranularCloud => self.render_granular_cloud(buffer),
            S::ParticleNoise => self.render_particle_noise(buffer),
            S::DigitalModulation => self.render_digital_modulation(buffer),
            S::QuestionMark => self.render_question_mark(buffer),
        }

        self.parameter[1] = saved_color;
    }
}

impl Default for DigitalOscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DigitalOscillator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigitalOscillator")
            .field("shape", &self.shape)
            .field("pitch", &self.pitch)
            .field("parameter", &self.parameter)
            .finish_non_exhaustive()
    }
}

#[inline]
pub(crate) fn sine(phase: u32) -> i32 {
    i32::from(interpolate824(&*WAV_SINE, phase))
}

#[inline]
pub(crate) fn synced(sync: &[u8], index: usize) -> bool {
    sync.get(index).is_some_and(|&s| s != 0)
}

/// Phase increment for a pitch computed in 32-bit arithmetic.
#[inline]
pub(crate) fn increment_for(pitch: i32) -> u32 {
    compute_phase_increment(pitch.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16)
}

/// Write a half-rate sample: the first slot gets the midpoint with the
/// previous sample, the second the sample itself.
#[inline]
pub(crate) fn write_pair(pair: &mut [i16], previous: i32, sample: i32) {
    pair[0] = ((previous + sample) >> 1) as i16;
    if let Some(second) = pair.get_mut(1) {
        *second = sample as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_blocks(oscillator: &mut DigitalOscillator, blocks: usize) -> Vec<i16> {
        let sync = [0u8; 24];
        let mut out = Vec::with_capacity(blocks * 24);
        for _ in 0..blocks {
            let mut buffer = [0i16; 24];
            oscillator.render(&sync, &mut buffer);
            out.extend_from_slice(&buffer);
        }
        out
    }

    #[test]
    fn shape_from_byte() {
        assert_eq!(
            DigitalOscillatorShape::try_from(0).ok(),
            Some(DigitalOscillatorShape::TripleRingMod)
        );
        assert_eq!(
            DigitalOscillatorShape::try_from(34).ok(),
            Some(DigitalOscillatorShape::QuestionMark)
        );
        assert!(matches!(
            DigitalOscillatorShape::try_from(35),
            Err(Error::InvalidShape(35))
        ));
        for (i, shape) in DigitalOscillatorShape::ALL.iter().enumerate() {
            assert_eq!(*shape as usize, i);
        }
    }

    #[test]
    fn pitch_is_smoothed_only_in_the_top_range() {
        let mut oscillator = DigitalOscillator::new();
        oscillator.set_pitch(60 << 7);
        oscillator.set_pitch(48 << 7);
        assert_eq!(oscillator.pitch(), 48 << 7);
        oscillator.set_pitch(100 << 7);
        oscillator.set_pitch(110 << 7);
        assert_eq!(oscillator.pitch(), 105 << 7);
    }

    #[test]
    fn pitch_is_clamped_on_render() {
        let mut oscillator = DigitalOscillator::new();
        oscillator.set_pitch(i16::MAX);
        oscillator.set_pitch(i16::MAX);
        render_blocks(&mut oscillator, 1);
        assert_eq!(i32::from(oscillator.pitch()), HIGHEST_NOTE);
        oscillator.set_pitch(-200);
        render_blocks(&mut oscillator, 1);
        assert_eq!(oscillator.pitch(), 0);
    }

    #[test]
    fn parameter_index_is_checked() {
        let mut oscillator = DigitalOscillator::new();
        assert!(oscillator.set_parameter(1, 1000).is_ok());
        assert!(matches!(
            oscillator.set_parameter(2, 1000),
            Err(Error::ParameterIndex(2))
        ));
    }

    #[test]
    fn fm_ratio_quantization_does_not_stick() {
        let mut oscillator = DigitalOscillator::new();
        oscillator.set_shape(DigitalOscillatorShape::Fm);
        oscillator.set_parameters(32768, 12345);
        render_blocks(&mut oscillator, 1);
        assert_eq!(oscillator.parameter[1], 12345 >> 1);
    }

    #[test]
    fn triple_ring_mod_is_periodic_and_synced() {
        let mut oscillator = DigitalOscillator::new();
        oscillator.set_parameters(32768, 32768);
        let mut sync = [0u8; 24];
        sync[10] = 1;
        let mut a = [0i16; 24];
        oscillator.render(&[0u8; 24], &mut a);
        let mut b = [0i16; 24];
        oscillator.render(&sync, &mut b);
        let mut fresh = DigitalOscillator::new();
        fresh.set_parameters(32768, 32768);
        let mut c = [0i16; 24];
        let mut sync_first = [0u8; 24];
        sync_first[0] = 1;
        fresh.render(&sync_first, &mut c);
        assert_eq!(b[10], c[0]);
    }
}
