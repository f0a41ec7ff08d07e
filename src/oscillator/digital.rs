//! Shapes that sound like data: a QPSK modem and a Morse beacon.

use crate::dsp::math::clip;
use crate::dsp::resources::{WAV_SINE, WT_CODE};
use crate::oscillator::state::MorseState;
use crate::oscillator::{increment_for, sine, DigitalOscillator};

const CONSTELLATION_Q: [i32; 4] = [23100, -23100, -23100, 23100];
const CONSTELLATION_I: [i32; 4] = [23100, 23100, -23100, -23100];

/// Symbols per frame: 64 of preamble followed by 256 data bytes.
const FRAME_SYMBOLS: u16 = 64 + 4 * 256;

impl DigitalOscillator {
    /// Quadrature phase-shift keying of a framed byte stream. The frame
    /// opens with a preamble, then repeats the smoothed color parameter as
    /// data. Timbre sets the symbol rate relative to the carrier.
    pub(crate) fn render_digital_modulation(&mut self, buffer: &mut [i16]) {
        let symbol_increment = increment_for(
            i32::from(self.pitch) - 1536 + ((i32::from(self.parameter[0]) - 32767) >> 3),
        );
        let modem = &mut self.state.modem;
        if self.strike {
            self.strike = false;
            modem.symbol_count = 0;
        }

        let increment = self.phase_increment;
        let mut phase = self.phase;
        let mut data_byte = modem.data_byte;
        for out in buffer.iter_mut() {
            phase = phase.wrapping_add(increment);
            modem.symbol_phase = modem.symbol_phase.wrapping_add(symbol_increment);
            if modem.symbol_phase < symbol_increment {
                modem.symbol_count += 1;
                if (modem.symbol_count & 3) == 0 {
                    if modem.symbol_count >= FRAME_SYMBOLS {
                        modem.symbol_count = 0;
                    }
                    data_byte = match modem.symbol_count {
                        0..=31 => 0x00,
                        32..=47 => 0x99,
                        48..=63 => 0xcc,
                        _ => {
                            modem.filter_state =
                                (modem.filter_state * 3 + i32::from(self.parameter[1])) >> 2;
                            (modem.filter_state >> 7) as u8
                        }
                    };
                } else {
                    data_byte >>= 2;
                }
            }
            let symbol = usize::from(data_byte & 3);
            let i = sine(phase);
            let q = sine(phase.wrapping_add(1 << 30));
            let sample = ((CONSTELLATION_Q[symbol] * q) >> 15) + ((CONSTELLATION_I[symbol] * i) >> 15);
            *out = clip(sample) as i16;
        }
        self.phase = phase;
        modem.data_byte = data_byte;
    }

    /// A Morse beacon drifting in and out of radio static. Timbre sets the
    /// keying speed, color the static floor and the amount of distortion.
    pub(crate) fn render_question_mark(&mut self, buffer: &mut [i16]) {
        let morse = &mut self.state.morse;
        if self.strike {
            self.strike = false;
            *morse = MorseState::default();
        }

        let increment = self.phase_increment;
        let mut phase = self.phase;
        let color = i32::from(self.parameter[1]);
        let dit_duration = (3600 + ((32767 - i32::from(self.parameter[0])) >> 2)) as u32;
        let noise_threshold = 1024 + (color >> 3);
        for out in buffer.iter_mut() {
            phase = phase.wrapping_add(increment);
            let mut sample = if morse.tone { (sine(phase) * 3) >> 2 } else { 0 };

            morse.dit_counter += 1;
            if morse.dit_counter > dit_duration {
                morse.remaining_dits = morse.remaining_dits.saturating_sub(1);
                if morse.remaining_dits == 0 {
                    morse.symbol += 1;
                    morse.tone = !morse.tone;
                    let index = morse.symbol.max(0) as usize;
                    let code = WT_CODE[(index >> 2) % WT_CODE.len()];
                    let length = (code >> ((index & 3) << 1)) & 3;
                    morse.remaining_dits = (2u32 << length) - 1;
                    if length == 3 {
                        // End of message: a long pause, then start over.
                        morse.remaining_dits = 100;
                        morse.tone = false;
                        morse.symbol = -1;
                    }
                    phase = 1 << 30;
                }
                morse.dit_counter = 0;
            }

            morse.noise_walk = morse
                .noise_walk
                .wrapping_add(i32::from(self.random.sample()) >> 2);
            let intensity = (morse.noise_walk >> 8).abs().clamp(noise_threshold, 16000);
            let noise = (i32::from(self.random.sample()) * intensity) >> 15;
            let noise = (noise * i32::from(WAV_SINE[((phase >> 22) & 0xff) as usize])) >> 15;
            sample = clip(sample + noise);

            let distorted = (sample * sample) >> 14;
            sample = clip(sample + ((distorted * color) >> 15));
            *out = sample as i16;
        }
        self.phase = phase;
    }
}
