/*
Formant Shapes
==============

VOSIM: two sine formants summed and windowed by a bell, restarted on every
cycle of the fundamental.

Vowel: three formants read from 16-phase x 16-amplitude tables, reset at
the fundamental, morphing through nine vowels. Each strike opens with a
short consonant burst.

FOF: a band-limited saw through five resonant band-pass filters tuned to
the formants of a singer. Timbre walks a-e-i-o-u, color goes from bass to
soprano.
*/

use crate::dsp::math::{clip, interpolate824_u16, interpolate88};
use crate::dsp::resources::{
    LUT_BELL, LUT_SVF_CUTOFF, WAV_FORMANT_SINE, WAV_FORMANT_SQUARE, WS_MODERATE_OVERDRIVE,
};
use crate::oscillator::state::NUM_FORMANTS;
use crate::oscillator::{increment_for, sine, synced, write_pair, DigitalOscillator};

#[derive(Debug, Clone, Copy)]
struct Phoneme {
    formant_frequency: [u8; 3],
    formant_amplitude: [u8; 3],
}

const fn phoneme(formant_frequency: [u8; 3], formant_amplitude: [u8; 3]) -> Phoneme {
    Phoneme {
        formant_frequency,
        formant_amplitude,
    }
}

const VOWELS: [Phoneme; 9] = [
    phoneme([27, 40, 89], [15, 13, 1]),
    phoneme([18, 51, 62], [13, 12, 6]),
    phoneme([15, 69, 93], [14, 12, 7]),
    phoneme([10, 84, 110], [13, 10, 8]),
    phoneme([23, 44, 87], [15, 12, 1]),
    phoneme([13, 29, 80], [13, 8, 0]),
    phoneme([6, 46, 81], [12, 3, 0]),
    phoneme([9, 51, 95], [15, 3, 0]),
    phoneme([6, 73, 99], [7, 3, 14]),
];

const CONSONANTS: [Phoneme; 8] = [
    phoneme([6, 54, 121], [9, 9, 0]),
    phoneme([18, 50, 51], [12, 10, 5]),
    phoneme([11, 24, 70], [13, 8, 0]),
    phoneme([15, 69, 74], [14, 12, 7]),
    phoneme([16, 37, 111], [14, 8, 1]),
    phoneme([18, 51, 62], [14, 12, 6]),
    phoneme([6, 26, 81], [5, 5, 5]),
    phoneme([6, 73, 99], [7, 10, 14]),
];

/// Frames of consonant noise after each strike.
const CONSONANT_FRAMES: u16 = 160;

type FormantTable = [[[i16; NUM_FORMANTS]; NUM_FORMANTS]; NUM_FORMANTS];

/// Formant pitches (7.7 notes), indexed by register, vowel and formant.
const FORMANT_FREQUENCY: FormantTable = [
    // bass
    [
        [9519, 10738, 12448, 12636, 12892],
        [8620, 11720, 12591, 12932, 13158],
        [7579, 11891, 12768, 13122, 13323],
        [8620, 10013, 12591, 12768, 13010],
        [8324, 9519, 12591, 12831, 13048],
    ],
    // tenor
    [
        [9696, 10821, 12810, 13010, 13263],
        [8620, 11827, 12768, 13228, 13477],
        [7908, 12038, 12932, 13263, 13452],
        [8620, 10156, 12768, 12932, 13085],
        [8324, 9519, 12852, 13010, 13296],
    ],
    // countertenor
    [
        [9730, 10902, 12892, 13085, 13330],
        [8832, 11953, 12852, 13085, 13296],
        [7749, 12014, 13010, 13330, 13483],
        [8781, 10211, 12852, 13085, 13296],
        [8448, 9627, 12892, 13085, 13363],
    ],
    // alto
    [
        [10156, 10960, 12932, 13427, 14195],
        [8620, 11692, 12852, 13296, 14195],
        [8324, 11827, 12852, 13550, 14195],
        [8881, 10156, 12956, 13427, 14195],
        [8160, 9860, 12708, 13427, 14195],
    ],
    // soprano
    [
        [10156, 10960, 13010, 13667, 14195],
        [8324, 12187, 12932, 13489, 14195],
        [7749, 12337, 13048, 13667, 14195],
        [8881, 10156, 12956, 13609, 14195],
        [8160, 9860, 12852, 13609, 14195],
    ],
];

const FORMANT_AMPLITUDE: FormantTable = [
    [
        [16384, 7318, 5813, 5813, 1638],
        [16384, 4115, 5813, 4115, 2062],
        [16384, 518, 2596, 1301, 652],
        [16384, 4617, 1460, 1638, 163],
        [16384, 1638, 411, 652, 259],
    ],
    [
        [16384, 8211, 7318, 6522, 1301],
        [16384, 3269, 4115, 3269, 1638],
        [16384, 2913, 2062, 1638, 518],
        [16384, 5181, 4115, 4115, 821],
        [16384, 1638, 2314, 3269, 821],
    ],
    [
        [16384, 8211, 1159, 1033, 206],
        [16384, 3269, 2062, 1638, 1638],
        [16384, 1033, 1033, 259, 259],
        [16384, 5181, 821, 1301, 326],
        [16384, 1638, 1159, 518, 326],
    ],
    [
        [16384, 10337, 1638, 259, 16],
        [16384, 1033, 518, 291, 16],
        [16384, 1638, 518, 259, 16],
        [16384, 5813, 2596, 652, 29],
        [16384, 4115, 518, 163, 10],
    ],
    [
        [16384, 8211, 411, 1638, 51],
        [16384, 1638, 2913, 163, 25],
        [16384, 4115, 821, 821, 103],
        [16384, 4617, 1301, 1301, 51],
        [16384, 2596, 291, 163, 16],
    ],
];

/// Bilinear read of a formant table: `x` selects the register, `y` the
/// vowel, both 0..32767.
fn interpolate_formant(table: &FormantTable, x: i32, y: i32, formant: usize) -> i32 {
    let x_index = (x >> 13) as usize;
    let x_mix = i32::from((x << 3) as u16);
    let y_index = (y >> 13) as usize;
    let y_mix = i32::from((y << 3) as u16);
    let a = i32::from(table[x_index][y_index][formant]);
    let b = i32::from(table[x_index + 1][y_index][formant]);
    let c = i32::from(table[x_index][y_index + 1][formant]);
    let d = i32::from(table[x_index + 1][y_index + 1][formant]);
    let a = a + (((b - a) * x_mix) >> 16);
    let c = c + (((d - c) * x_mix) >> 16);
    a + (((c - a) * y_mix) >> 16)
}

impl DigitalOscillator {
    pub(crate) fn render_vosim(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let increments = [
            increment_for(i32::from(self.parameter[0] >> 1)),
            increment_for(i32::from(self.parameter[1] >> 1)),
        ];
        let formants = &mut self.state.vosim.formant_phase;
        let increment = self.phase_increment;
        let mut phase = self.phase;
        for (i, out) in buffer.iter_mut().enumerate() {
            phase = phase.wrapping_add(increment);
            if synced(sync, i) {
                phase = 0;
            }
            let mut sample = 16384 + 8192;
            formants[0] = formants[0].wrapping_add(increments[0]);
            sample += sine(formants[0]) >> 1;
            formants[1] = formants[1].wrapping_add(increments[1]);
            sample += sine(formants[1]) >> 2;
            sample = (sample * i32::from(interpolate824_u16(&*LUT_BELL, phase) >> 1)) >> 15;
            if phase < increment {
                formants[0] = 0;
                formants[1] = 0;
                sample = 0;
            }
            *out = (sample - 16384 - 8192) as i16;
        }
        self.phase = phase;
    }

    pub(crate) fn render_vowel(&mut self, buffer: &mut [i16]) {
        let timbre = self.parameter[0] as usize;
        let vowel_index = timbre >> 12;
        let balance = (timbre & 0x0fff) as u32;
        let formant_shift = 200 + (self.parameter[1] as u32 >> 6);
        let vowel = &mut self.state.vowel;

        if self.strike {
            self.strike = false;
            vowel.consonant_frames = CONSONANT_FRAMES;
            let index = ((i32::from(self.random.sample()) + 1) & 7) as usize;
            let consonant = &CONSONANTS[index];
            for i in 0..3 {
                vowel.formant_increment[i] =
                    u32::from(consonant.formant_frequency[i]) * 0x1000 * formant_shift;
                vowel.formant_amplitude[i] = u32::from(consonant.formant_amplitude[i]);
            }
            vowel.noise = if index >= 6 { 4095 } else { 0 };
        }

        if vowel.consonant_frames > 0 {
            vowel.consonant_frames -= 1;
        } else {
            let (a, b) = (&VOWELS[vowel_index], &VOWELS[vowel_index + 1]);
            for i in 0..3 {
                let frequency = u32::from(a.formant_frequency[i]) * (0x1000 - balance)
                    + u32::from(b.formant_frequency[i]) * balance;
                vowel.formant_increment[i] = frequency * formant_shift;
                vowel.formant_amplitude[i] = (u32::from(a.formant_amplitude[i]) * (0x1000 - balance)
                    + u32::from(b.formant_amplitude[i]) * balance)
                    >> 12;
            }
            vowel.noise = 0;
        }

        let increment = self.phase_increment;
        let mut phase = self.phase;
        for out in buffer.iter_mut() {
            phase = phase.wrapping_add(increment);
            let mut sample = 0i32;
            for i in 0..3 {
                vowel.formant_phase[i] = vowel.formant_phase[i].wrapping_add(vowel.formant_increment[i]);
                let phaselet = ((vowel.formant_phase[i] >> 24) & 0xf0) as usize;
                let index = phaselet | vowel.formant_amplitude[i] as usize;
                sample += if i == 2 {
                    i32::from(WAV_FORMANT_SQUARE[index])
                } else {
                    i32::from(WAV_FORMANT_SINE[index])
                };
            }
            sample *= 255 - (phase >> 24) as i32;

            let noise = i32::from(self.random.sample()) * i32::from(vowel.noise);
            if phase.wrapping_add(noise as u32) < increment {
                vowel.formant_phase = [0; 3];
                sample = 0;
            }
            *out = interpolate88(&*WS_MODERATE_OVERDRIVE, (sample + 32768) as u16);
        }
        self.phase = phase;
    }

    pub(crate) fn render_vowel_fof(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let register = i32::from(self.parameter[1]);
        let vowel = i32::from(self.parameter[0]);
        let mut svf_f = [0i32; NUM_FORMANTS];
        let mut amplitude = [0i32; NUM_FORMANTS];
        for i in 0..NUM_FORMANTS {
            let frequency = interpolate_formant(&FORMANT_FREQUENCY, register, vowel, i) + (12 << 7);
            svf_f[i] = i32::from(interpolate824_u16(&*LUT_SVF_CUTOFF, (frequency.max(0) as u32) << 17));
            amplitude[i] = interpolate_formant(&FORMANT_AMPLITUDE, register, vowel, i);
        }

        let fof = &mut self.state.fof;
        if self.needs_init {
            fof.svf_lp = [0; NUM_FORMANTS];
            fof.svf_bp = [0; NUM_FORMANTS];
            self.needs_init = false;
        }

        let increment = self.phase_increment << 1;
        let mut phase = self.phase;
        let mut next_saw = fof.next_saw_sample;
        let mut previous = fof.previous_sample;
        for (n, pair) in buffer.chunks_mut(2).enumerate() {
            let mut this_saw = next_saw;
            next_saw = 0;
            phase = phase.wrapping_add(increment);
            if synced(sync, 2 * n) || synced(sync, 2 * n + 1) {
                phase = 0;
            }
            // Band-limited step where the saw wraps.
            if phase < increment {
                let t = (phase / (increment >> 16).max(1)).min(65535);
                this_saw -= ((t * t) >> 18) as i32;
                let t = 65535 - t;
                next_saw += ((t * t) >> 18) as i32;
            }
            next_saw += (phase >> 17) as i32;

            let input = this_saw;
            let mut out = 0i32;
            for i in 0..NUM_FORMANTS {
                let notch = input - (fof.svf_bp[i] >> 6);
                let f = i64::from(svf_f[i]);
                fof.svf_lp[i] = clip(fof.svf_lp[i] + ((f * i64::from(fof.svf_bp[i])) >> 15) as i32);
                let hp = i64::from(notch - fof.svf_lp[i]);
                fof.svf_bp[i] = clip(fof.svf_bp[i] + ((f * hp) >> 15) as i32);
                out += (fof.svf_bp[i] * amplitude[i]) >> 17;
            }
            let out = clip(out);
            write_pair(pair, previous, out);
            previous = out;
        }
        fof.next_saw_sample = next_saw;
        fof.previous_sample = previous;
        self.phase = phase;
    }
}
