//! Fixed-point helpers shared by every algorithm.
//!
//! Table lookups come in three flavours, named after where the binary point
//! sits in the index: 8.24 for 32-bit phases over 257-entry tables, 8.8 for
//! 16-bit indices over 257-entry tables and 10.22 for the 1025-entry
//! wavetables. Products are widened to `i64` so extreme table slopes cannot
//! overflow.

/// Saturate to the signed 16-bit range.
#[inline]
pub fn clip(x: i32) -> i32 {
    x.clamp(-32768, 32767)
}

/// Saturate to the signed 16-bit range and narrow.
#[inline]
pub fn clip16(x: i32) -> i16 {
    clip(x) as i16
}

#[inline]
pub fn constrain(x: i32, min: i32, max: i32) -> i32 {
    x.clamp(min, max)
}

#[inline]
fn lerp(a: i32, b: i32, frac: i32, shift: u32) -> i32 {
    a + ((i64::from(b - a) * i64::from(frac)) >> shift) as i32
}

/// 8.24 lookup: the top byte of `phase` picks the entry, the next 16 bits
/// interpolate towards its neighbour.
#[inline]
pub fn interpolate824(table: &[i16], phase: u32) -> i16 {
    let index = (phase >> 24) as usize;
    let a = i32::from(table[index]);
    let b = i32::from(table[index + 1]);
    lerp(a, b, ((phase >> 8) & 0xffff) as i32, 16) as i16
}

#[inline]
pub fn interpolate824_u16(table: &[u16], phase: u32) -> u16 {
    let index = (phase >> 24) as usize;
    let a = i32::from(table[index]);
    let b = i32::from(table[index + 1]);
    lerp(a, b, ((phase >> 8) & 0xffff) as i32, 16) as u16
}

/// 8.24 lookup over an unsigned byte table, rescaled to a signed sample.
#[inline]
pub fn interpolate824_u8(table: &[u8], phase: u32) -> i16 {
    let index = (phase >> 24) as usize;
    let a = i32::from(table[index]);
    let b = i32::from(table[index + 1]);
    let frac = (phase & 0x00ff_ffff) as i64;
    ((a << 8) + ((i64::from(b - a) * frac) >> 16) as i32 - 32768) as i16
}

#[inline]
pub fn interpolate88(table: &[i16], index: u16) -> i16 {
    let i = (index >> 8) as usize;
    let a = i32::from(table[i]);
    let b = i32::from(table[i + 1]);
    lerp(a, b, i32::from(index & 0xff), 8) as i16
}

#[inline]
pub fn interpolate88_u16(table: &[u16], index: u16) -> u16 {
    let i = (index >> 8) as usize;
    let a = i32::from(table[i]);
    let b = i32::from(table[i + 1]);
    lerp(a, b, i32::from(index & 0xff), 8) as u16
}

/// 10.22 lookup over a signed delay line or wavetable.
#[inline]
pub fn interpolate1022(table: &[i16], phase: u32) -> i16 {
    let index = (phase >> 22) as usize;
    let a = i32::from(table[index]);
    let b = i32::from(table[index + 1]);
    lerp(a, b, ((phase >> 6) & 0xffff) as i32, 16) as i16
}

/// 10.22 lookup over an unsigned byte wavetable.
#[inline]
pub fn interpolate1022_u8(table: &[u8], phase: u32) -> i16 {
    let index = (phase >> 22) as usize;
    let a = i32::from(table[index]);
    let b = i32::from(table[index + 1]);
    let frac = (phase & 0x003f_ffff) as i64;
    ((a << 8) + ((i64::from(b - a) * frac) >> 14) as i32 - 32768) as i16
}

/// Linear mix, `balance` 0 is all `a`, 65535 is (almost) all `b`.
#[inline]
pub fn mix(a: i16, b: i16, balance: u16) -> i16 {
    let balance = i32::from(balance);
    ((i32::from(a) * (65535 - balance) + i32::from(b) * balance) >> 16) as i16
}

#[inline]
pub fn mix_u16(a: u16, b: u16, balance: u16) -> u16 {
    let balance = u32::from(balance);
    ((u32::from(a) * (65535 - balance) + u32::from(b) * balance) >> 16) as u16
}

/// Read two byte tables at the same phase and blend them.
#[inline]
pub fn crossfade_u8(table_a: &[u8], table_b: &[u8], phase: u32, balance: u16) -> i16 {
    let a = i32::from(interpolate824_u8(table_a, phase));
    let b = i32::from(interpolate824_u8(table_b, phase));
    lerp(a, b, i32::from(balance), 16) as i16
}

#[inline]
pub fn crossfade1022_u8(table_a: &[u8], table_b: &[u8], phase: u32, balance: u16) -> i16 {
    let a = i32::from(interpolate1022_u8(table_a, phase));
    let b = i32::from(interpolate1022_u8(table_b, phase));
    lerp(a, b, i32::from(balance), 16) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_saturates_at_int16_bounds() {
        assert_eq!(clip(40_000), 32767);
        assert_eq!(clip(-40_000), -32768);
        assert_eq!(clip(1234), 1234);
    }

    #[test]
    fn interpolate824_hits_entries_and_midpoints() {
        let mut table = [0i16; 257];
        for (i, v) in table.iter_mut().enumerate() {
            *v = (i as i16) * 100;
        }
        assert_eq!(interpolate824(&table, 3 << 24), 300);
        assert_eq!(interpolate824(&table, (3 << 24) + (1 << 23)), 350);
        assert_eq!(interpolate824(&table, u32::MAX), 25599);
    }

    #[test]
    fn interpolate88_uses_low_byte_as_fraction() {
        let mut table = [0i16; 257];
        for (i, v) in table.iter_mut().enumerate() {
            *v = (i as i16) * 16;
        }
        assert_eq!(interpolate88(&table, 0x0480), 72);
    }

    #[test]
    fn mix_balances_between_inputs() {
        assert_eq!(mix(1000, -1000, 0), 999);
        assert!(mix(1000, -1000, 65535) <= -999);
        assert_eq!(mix(0, 0, 32768), 0);
    }

    #[test]
    fn byte_tables_are_centered() {
        let table = [128u8; 1025];
        assert_eq!(interpolate824_u8(&table, 0), 0);
        assert_eq!(interpolate1022_u8(&table, 12345), 0);
    }

    #[test]
    fn interpolate1022_reads_delay_lines() {
        let table: Vec<i16> = (0..1025).map(|i| (i * 1000) as i16).collect();
        assert_eq!(interpolate1022(&table, (1 << 22) + (1 << 21)), 1500);
    }
}
