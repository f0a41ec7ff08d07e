//! Analog-style drum models built from excitations and resonant filters.

use crate::dsp::math::clip;
use crate::dsp::SvfMode;
use crate::oscillator::{increment_for, DigitalOscillator};

/// One millisecond, in samples.
const MS: u32 = 48;

impl DigitalOscillator {
    /// A punchy band-pass resonator pinged by a click, a short body pulse
    /// and a pitch sweep during the first few milliseconds.
    pub(crate) fn render_kick(&mut self, buffer: &mut [i16]) {
        if self.needs_init {
            let [click, body, sweep, _] = &mut self.pulse;
            click.init();
            click.set_delay(0);
            click.set_decay(3340);
            body.init();
            body.set_delay(MS);
            body.set_decay(3072);
            sweep.init();
            sweep.set_delay(4 * MS);
            sweep.set_decay(4093);
            self.svf[0].init();
            self.svf[0].set_punch(32768);
            self.svf[0].set_mode(SvfMode::BandPass);
            self.needs_init = false;
        }

        if self.strike {
            self.strike = false;
            self.pulse[0].trigger(275_251);
            self.pulse[1].trigger(-13_763);
            self.pulse[2].trigger(18_000);
            self.svf[0].set_punch(24000);
        }

        let decay = self.parameter[0] as u32;
        let scaled = 65535 - (decay << 1);
        let squared = (scaled * scaled) >> 16;
        let scaled = (squared * scaled) >> 18;
        self.svf[0].set_resonance((32768 - 128 - scaled) as i16);

        let coefficient = self.parameter[1] as i32;
        let coefficient = (coefficient * coefficient) >> 15;
        let coefficient = (coefficient * coefficient) >> 15;
        let lp_coefficient = 128 + (coefficient >> 1) * 3;

        let pitch = i32::from(self.pitch);
        let mut lp_state = self.state.kick.lp_state;
        for pair in buffer.chunks_mut(2) {
            let mut excitation = self.pulse[0].process();
            excitation += if self.pulse[1].done() { 0 } else { 16384 };
            excitation += self.pulse[1].process();
            self.pulse[2].process();
            let sweep = if self.pulse[2].done() { 0 } else { 17 << 7 };
            self.svf[0].set_frequency((pitch + sweep) as i16);

            for out in pair.iter_mut() {
                let resonator = (excitation >> 4) + self.svf[0].process(excitation);
                lp_state = clip(
                    lp_state + ((i64::from(resonator - lp_state) * i64::from(lp_coefficient)) >> 15) as i32,
                );
                *out = lp_state as i16;
            }
        }
        self.state.kick.lp_state = lp_state;
    }

    /// Two tuned drum-head modes plus filtered noise for the snares. Color
    /// sets the snappiness, timbre the balance between the two modes.
    pub(crate) fn render_snare(&mut self, buffer: &mut [i16]) {
        if self.needs_init {
            let [head, rim, shell, snares] = &mut self.pulse;
            head.init();
            head.set_delay(0);
            head.set_decay(1536);
            rim.init();
            rim.set_delay(MS);
            rim.set_decay(3072);
            shell.init();
            shell.set_delay(MS);
            shell.set_decay(1200);
            snares.init();
            snares.set_delay(0);
            self.svf[0].init();
            self.svf[1].init();
            self.svf[2].init();
            self.svf[2].set_resonance(2000);
            self.svf[2].set_mode(SvfMode::BandPass);
            self.needs_init = false;
        }

        let pitch = i32::from(self.pitch);
        let color = i32::from(self.parameter[1]);
        if self.strike {
            let decay = (49152 - pitch + (color - 16384).max(0)).min(65535);
            self.svf[0].set_resonance((29000 + (decay >> 5)) as i16);
            self.svf[1].set_resonance((26500 + (decay >> 5)) as i16);
            self.pulse[3].set_decay(4092 + (decay >> 14) as u32);

            self.pulse[0].trigger(15 * 32768);
            self.pulse[1].trigger(-32768);
            self.pulse[2].trigger(13107);
            self.pulse[3].trigger(512 + (color.min(14336) << 1));
            self.strike = false;
        }

        self.svf[0].set_frequency(self.pitch.saturating_add(12 << 7));
        self.svf[1].set_frequency(self.pitch.saturating_add(24 << 7));
        self.svf[2].set_frequency(self.pitch.saturating_add(60 << 7));

        let g_1 = i64::from(22000 - (i32::from(self.parameter[0]) >> 1));
        let g_2 = i64::from(22000 + (i32::from(self.parameter[0]) >> 1));

        for pair in buffer.chunks_mut(2) {
            let mut excitation_1 = self.pulse[0].process();
            excitation_1 += self.pulse[1].process();
            excitation_1 += if self.pulse[1].done() { 0 } else { 2621 };

            let mut excitation_2 = self.pulse[2].process();
            excitation_2 += if self.pulse[2].done() { 0 } else { 13107 };

            // Rolled strikes pile the level up well past 16 bits.
            let noise = (i64::from(self.random.sample()) * i64::from(self.pulse[3].process())) >> 15;
            let noise = noise.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;

            let mode_1 = i64::from(self.svf[0].process(excitation_1) + (excitation_1 >> 4));
            let mode_2 = i64::from(self.svf[1].process(excitation_2) + (excitation_2 >> 4));
            let mut sd = (mode_1 * g_1) >> 15;
            sd += (mode_2 * g_2) >> 15;
            sd += i64::from(self.svf[2].process(noise));
            let sd = sd.clamp(-32768, 32767) as i16;
            pair.fill(sd);
        }
    }

    /// Six square waves at inharmonic ratios through a band-pass, crossfaded
    /// with high-passed noise.
    pub(crate) fn render_cymbal(&mut self, buffer: &mut [i16]) {
        if self.needs_init {
            self.svf[0].init();
            self.svf[0].set_mode(SvfMode::BandPass);
            self.svf[0].set_resonance(12000);
            self.svf[1].init();
            self.svf[1].set_mode(SvfMode::HighPass);
            self.svf[1].set_resonance(2000);
            self.needs_init = false;
        }

        let note = (40 << 7) + (i32::from(self.pitch) >> 1);
        let base = increment_for(note);
        let root = u64::from(base >> 10);
        let ratio = |r: u64| ((root * r) >> 4) as u32;
        let increments = [
            base,
            ratio(24273),
            ratio(12561),
            ratio(18417),
            ratio(22452),
            ratio(31858),
        ];
        let clock_increment = base.wrapping_mul(24);

        let xfade = i32::from(self.parameter[1]);
        let frequency = self.parameter[0] >> 1;
        self.svf[0].set_frequency(frequency);
        self.svf[1].set_frequency(frequency);

        let hat = &mut self.state.cymbal;
        let mut phase = self.phase;
        for out in buffer.iter_mut() {
            phase = phase.wrapping_add(clock_increment);
            if phase < clock_increment {
                hat.rng_state = hat.rng_state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            }
            let mut hat_noise = -3;
            for (square, increment) in hat.phase.iter_mut().zip(increments) {
                *square = square.wrapping_add(increment);
                hat_noise += (*square >> 31) as i32;
            }
            let hat_noise = clip(self.svf[0].process(hat_noise * 5461));

            let noise = (hat.rng_state >> 16) as i32 - 32768;
            let noise = clip(self.svf[1].process(noise >> 1));
            *out = (hat_noise + (((noise - hat_noise) * xfade) >> 15)) as i16;
        }
        self.phase = phase;
    }
}
