//! Output stage transforms between the signed engine samples and the
//! unsigned codes and floats the outside world wants.

/// Offset a signed sample into the unsigned output range.
#[inline]
pub fn to_unsigned(sample: i16) -> u16 {
    (32767 + i32::from(sample)).clamp(0, 65535) as u16
}

/// DAC code for a sample. The output stage inverts, and `offset` trims the
/// zero point of the channel.
#[inline]
pub fn dac_code(sample: i16, offset: i32) -> u16 {
    (32767 - i32::from(sample) + offset).clamp(0, 65535) as u16
}

#[inline]
pub fn to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Inverse of [`to_unsigned`], scaled to [-1, 1).
#[inline]
pub fn unsigned_to_f32(code: u16) -> f32 {
    (i32::from(code) - 32767) as f32 / 32768.0
}
