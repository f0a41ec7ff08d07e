//! Shapes reading the 256-wave bank: scanned wavetables, a 2D wave map, a
//! wave line with stepped/smooth blends and a four-voice paraphonic mode.

use crate::dsp::math::{crossfade_u8, mix};
use crate::dsp::resources::{wave, WT_MAP};
use crate::oscillator::{increment_for, synced, DigitalOscillator};

struct Wavetable {
    steps: u32,
    /// One more entry than `steps` so the last step has a neighbour.
    waves: &'static [u8],
}

const fn family(first: u8) -> [u8; 17] {
    let mut waves = [0u8; 17];
    let mut i = 0;
    while i < 16 {
        waves[i] = first + i as u8;
        i += 1;
    }
    waves[16] = first + 15;
    waves
}

const SAW: [u8; 17] = family(0);
const PULSE: [u8; 17] = family(16);
const FORMANT: [u8; 17] = family(32);
const ODD: [u8; 17] = family(48);
const BELL: [u8; 17] = family(64);
const FOLD: [u8; 17] = family(80);
const DRAWBAR: [u8; 17] = family(96);
const SYNC: [u8; 17] = family(112);
const TRIANGLE: [u8; 17] = family(128);
const VOCAL: [u8; 17] = family(144);
const EVEN: [u8; 17] = family(160);
const METAL: [u8; 17] = family(176);
const STEPPED: [u8; 17] = family(192);
const PWM: [u8; 17] = family(208);
const PHASES: [u8; 17] = family(224);
const DYAD: [u8; 17] = family(240);

const WAVETABLES: [Wavetable; 20] = [
    Wavetable { steps: 16, waves: &SAW },
    Wavetable { steps: 16, waves: &PULSE },
    Wavetable { steps: 16, waves: &FORMANT },
    Wavetable { steps: 16, waves: &ODD },
    Wavetable { steps: 16, waves: &BELL },
    Wavetable { steps: 16, waves: &FOLD },
    Wavetable { steps: 16, waves: &DRAWBAR },
    Wavetable { steps: 16, waves: &SYNC },
    Wavetable { steps: 8, waves: &[128, 130, 132, 134, 136, 138, 140, 142, 143] },
    Wavetable { steps: 16, waves: &TRIANGLE },
    Wavetable { steps: 16, waves: &VOCAL },
    Wavetable { steps: 8, waves: &[0, 3, 6, 9, 128, 131, 134, 137, 140] },
    Wavetable { steps: 16, waves: &EVEN },
    Wavetable { steps: 16, waves: &METAL },
    Wavetable { steps: 16, waves: &STEPPED },
    Wavetable { steps: 16, waves: &PWM },
    Wavetable { steps: 8, waves: &[240, 241, 243, 245, 247, 249, 251, 253, 255] },
    Wavetable { steps: 16, waves: &PHASES },
    Wavetable { steps: 16, waves: &DYAD },
    Wavetable { steps: 4, waves: &[64, 69, 74, 79, 74] },
];

/// Path through the bank for the wave line. Neighbours are close in timbre,
/// with a few jumps between families.
const WAVE_LINE: [u8; 64] = [
    0, 5, 10, 15, 31, 26, 21, 16, 32, 37, 42, 47, 63, 58, 53, 48, 64, 69, 74, 79, 95, 90, 85, 80,
    96, 101, 106, 111, 127, 122, 117, 112, 128, 133, 138, 143, 159, 154, 149, 144, 160, 165, 170,
    175, 191, 186, 181, 176, 192, 197, 202, 207, 223, 218, 213, 208, 224, 229, 234, 239, 255, 250,
    245, 240,
];

const MINI_WAVE_LINE: [u8; 33] = [
    3, 12, 28, 19, 35, 44, 60, 51, 67, 76, 92, 83, 99, 108, 124, 115, 131, 140, 156, 147, 163, 172,
    188, 179, 195, 204, 220, 211, 227, 236, 252, 243, 243,
];

const SEMI: i32 = 128;

/// Intervals above the root for the three upper voices of the paraphonic
/// shape, in 7-bit semitones. The first two rows are slight detunings.
const CHORDS: [[i32; 3]; 17] = [
    [2, 4, 6],
    [16, 32, 48],
    [2 * SEMI, 7 * SEMI, 12 * SEMI],
    [3 * SEMI, 7 * SEMI, 10 * SEMI],
    [3 * SEMI, 7 * SEMI, 12 * SEMI],
    [3 * SEMI, 7 * SEMI, 14 * SEMI],
    [3 * SEMI, 7 * SEMI, 17 * SEMI],
    [7 * SEMI, 12 * SEMI, 19 * SEMI],
    [7 * SEMI, 3 + 12 * SEMI, 5 + 19 * SEMI],
    [4 * SEMI, 7 * SEMI, 17 * SEMI],
    [4 * SEMI, 7 * SEMI, 14 * SEMI],
    [4 * SEMI, 7 * SEMI, 12 * SEMI],
    [4 * SEMI, 7 * SEMI, 11 * SEMI],
    [5 * SEMI, 7 * SEMI, 12 * SEMI],
    [4, 7 * SEMI, 12 * SEMI],
    [4, 4 + 12 * SEMI, 12 * SEMI],
    [4, 4 + 12 * SEMI, 12 * SEMI],
];

fn line_wave(line: &[u8], index: usize) -> &'static [u8] {
    wave(usize::from(line[index.min(line.len() - 1)]))
}

impl DigitalOscillator {
    /// Color picks one of twenty tables, timbre scans through it. Rendered
    /// with 2x naive oversampling.
    pub(crate) fn render_wavetables(&mut self, sync: &[u8], buffer: &mut [i16]) {
        // A single bit of jitter must not flip between tables.
        let color = i32::from(self.parameter[1]);
        if (color - i32::from(self.previous_parameter[1])).abs() > 64 {
            self.previous_parameter[1] = self.parameter[1];
        }
        let table_index = ((self.previous_parameter[1].max(0) as u32 * 20) >> 15) as usize;
        let table = &WAVETABLES[table_index.min(WAVETABLES.len() - 1)];

        let wave_pointer = ((self.parameter[0].max(0) as u32) << 1) * table.steps;
        let step = (wave_pointer >> 16) as usize;
        let wave_a = wave(usize::from(table.waves[step]));
        let wave_b = wave(usize::from(table.waves[step + 1]));
        let balance = wave_pointer as u16;

        let increment = self.phase_increment >> 1;
        let mut phase = self.phase;
        for (i, out) in buffer.iter_mut().enumerate() {
            phase = phase.wrapping_add(increment);
            if synced(sync, i) {
                phase = 0;
            }
            let mut sample = i32::from(crossfade_u8(wave_a, wave_b, phase >> 1, balance)) >> 1;
            phase = phase.wrapping_add(increment);
            sample += i32::from(crossfade_u8(wave_a, wave_b, phase >> 1, balance)) >> 1;
            *out = sample as i16;
        }
        self.phase = phase;
    }

    /// Bilinear interpolation across a 16x16 grid of waves.
    pub(crate) fn render_wave_map(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let p = [0, 1].map(|i| (self.parameter[i].max(0) as u32 * 15) >> 4);
        let xfade = p.map(|p| (p << 5) as u16);
        let coordinate = p.map(|p| (p >> 11) as usize);

        let cell = |i: usize, j: usize| {
            wave(usize::from(WT_MAP[(coordinate[0] + i) * 16 + coordinate[1] + j]))
        };
        let waves = [[cell(0, 0), cell(0, 1)], [cell(1, 0), cell(1, 1)]];
        let read = |phase: u32| {
            let row_0 = crossfade_u8(waves[0][0], waves[0][1], phase >> 1, xfade[1]);
            let row_1 = crossfade_u8(waves[1][0], waves[1][1], phase >> 1, xfade[1]);
            i32::from(mix(row_0, row_1, xfade[0])) >> 1
        };

        let increment = self.phase_increment >> 1;
        let mut phase = self.phase;
        for (i, out) in buffer.iter_mut().enumerate() {
            phase = phase.wrapping_add(increment);
            if synced(sync, i) {
                phase = 0;
            }
            let mut sample = read(phase);
            phase = phase.wrapping_add(increment);
            sample += read(phase);
            *out = sample as i16;
        }
        self.phase = phase;
    }

    /// Timbre scans a line of waves. The lower half of color blends the
    /// jump from the previous block's wave with a smooth scan, the upper half
    /// adds increasingly coarse phase quantization.
    pub(crate) fn render_wave_line(&mut self, sync: &[u8], buffer: &mut [i16]) {
        let fm = &mut self.state.fm;
        fm.smoothed_parameter =
            (3 * fm.smoothed_parameter + (i32::from(self.parameter[0]) << 1)) >> 2;
        let scan = fm.smoothed_parameter.clamp(0, 65535) as u32;

        let previous_index = (self.previous_parameter[0].max(0) >> 9) as usize;
        let wave_0 = line_wave(&WAVE_LINE, previous_index);
        let wave_1 = line_wave(&WAVE_LINE, (scan >> 10) as usize);
        let wave_2 = line_wave(&WAVE_LINE, (scan >> 10) as usize + 1);

        let smooth_xfade = (scan << 6) as u16;
        let mut rough_xfade: u16 = 0;
        let rough_xfade_increment = (32768 / buffer.len()) as u16;
        let color = self.parameter[1].max(0);
        let balance = ((color as u32) << 3) as u16;

        let increment = self.phase_increment >> 1;
        let mut phase = self.phase;
        for (i, out) in buffer.iter_mut().enumerate() {
            if synced(sync, i) {
                phase = 0;
            }
            let mut sample = 0;
            for _ in 0..2 {
                let smooth_phase = phase >> 1;
                let rough_phase = smooth_phase & 0xfe00_0000;
                let (a, b) = if color < 8192 {
                    let rough = crossfade_u8(wave_0, wave_1, rough_phase, rough_xfade);
                    let smooth = crossfade_u8(wave_0, wave_1, smooth_phase, rough_xfade);
                    (rough, smooth)
                } else if color < 16384 {
                    let rough = crossfade_u8(wave_0, wave_1, smooth_phase, rough_xfade);
                    let smooth = crossfade_u8(wave_1, wave_2, smooth_phase, smooth_xfade);
                    (rough, smooth)
                } else if color < 24576 {
                    let smooth = crossfade_u8(wave_1, wave_2, smooth_phase, smooth_xfade);
                    let rough = crossfade_u8(wave_1, wave_2, rough_phase, smooth_xfade);
                    (smooth, rough)
                } else {
                    let smooth = crossfade_u8(wave_1, wave_2, rough_phase, smooth_xfade);
                    let rough =
                        crossfade_u8(wave_1, wave_2, smooth_phase & 0xf800_0000, smooth_xfade);
                    (smooth, rough)
                };
                sample += i32::from(mix(a, b, balance));
                phase = phase.wrapping_add(increment);
                if color < 16384 {
                    rough_xfade = rough_xfade.wrapping_add(rough_xfade_increment);
                }
            }
            *out = (sample >> 1) as i16;
        }
        self.phase = phase;
        self.previous_parameter[0] = (self.state.fm.smoothed_parameter >> 1) as i16;
    }

    /// Four voices on the same morphing wave: the root plus a chord chosen
    /// by color.
    pub(crate) fn render_wave_paraphonic(&mut self, buffer: &mut [i16]) {
        let phases = &mut self.state.swarm.phase;
        if self.strike {
            self.strike = false;
            for phase in phases.iter_mut().take(4) {
                *phase = self.random.word();
            }
        }

        let color = self.parameter[1].max(0) as u32;
        let chord = (color >> 11) as usize;
        let fractional = (color << 5) as u16;
        let fractional = match fractional {
            0..=30719 => 0,
            34816.. => 65535,
            _ => i32::from(fractional - 30720) * 16,
        };

        let pitch = i32::from(self.pitch);
        let mut increments = [self.phase_increment; 4];
        for (i, increment) in increments.iter_mut().skip(1).enumerate() {
            let from = CHORDS[chord][i];
            let to = CHORDS[chord + 1][i];
            let detune = from + (((to - from) * fractional) >> 16);
            *increment = increment_for(pitch + detune);
        }

        let timbre = self.parameter[0].max(0) as u32;
        let wave_1 = line_wave(&MINI_WAVE_LINE, (timbre >> 10) as usize);
        let wave_2 = line_wave(&MINI_WAVE_LINE, (timbre >> 10) as usize + 1);
        let xfade = (timbre << 6) as u16;

        for out in buffer.iter_mut() {
            let mut sample = 0;
            for (phase, increment) in phases.iter_mut().zip(increments) {
                *phase = phase.wrapping_add(increment);
                sample += i32::from(crossfade_u8(wave_1, wave_2, *phase >> 1, xfade));
            }
            *out = (sample >> 2) as i16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::resources::NUM_WAVES;
    use crate::oscillator::DigitalOscillatorShape;

    #[test]
    fn tables_reference_valid_waves() {
        for table in WAVETABLES.iter() {
            assert_eq!(table.waves.len(), table.steps as usize + 1);
            assert!(table.waves.iter().all(|&w| usize::from(w) < NUM_WAVES));
        }
        assert!(WAVE_LINE.iter().chain(MINI_WAVE_LINE.iter()).all(|&w| usize::from(w) < NUM_WAVES));
    }

    #[test]
    fn small_color_changes_keep_the_table() {
        let mut oscillator = DigitalOscillator::new();
        oscillator.set_shape(DigitalOscillatorShape::Wavetables);
        oscillator.set_parameters(0, 20000);
        let mut buffer = [0i16; 16];
        oscillator.render(&[], &mut buffer);
        let held = oscillator.previous_parameter[1];
        oscillator.set_parameters(0, 20100);
        oscillator.render(&[], &mut buffer);
        assert_eq!(oscillator.previous_parameter[1], held);
        oscillator.set_parameters(0, 21000);
        oscillator.render(&[], &mut buffer);
        assert_eq!(oscillator.previous_parameter[1], 10500);
    }

    #[test]
    fn wave_shapes_cover_the_parameter_corners() {
        for shape in [
            DigitalOscillatorShape::Wavetables,
            DigitalOscillatorShape::WaveMap,
            DigitalOscillatorShape::WaveLine,
            DigitalOscillatorShape::WaveParaphonic,
        ] {
            for (timbre, color) in [(0, 0), (65535, 0), (0, 65535), (65535, 65535), (30000, 50000)] {
                let mut oscillator = DigitalOscillator::new();
                oscillator.set_shape(shape);
                oscillator.set_parameters(timbre, color);
                let mut buffer = [0i16; 24];
                for _ in 0..20 {
                    oscillator.render(&[], &mut buffer);
                }
                assert!(buffer.iter().any(|&s| s != buffer[0]), "{shape} {timbre} {color}");
            }
        }
    }
}
