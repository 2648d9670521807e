//! # DS1621 Temperature Encodings
//!
//! Conversions between milli-degrees Celsius and the register formats the
//! DS1621 puts on the wire.
//!
//! The native format is a 16-bit word whose top 9 bits hold a two's
//! complement value in 0.5°C steps. The low 7 bits carry no information.
//!
//! ```text
//!  15 14 13 12 11 10  9  8  7  6 ... 0
//! | S| 64| 32| 16|  8|  4|  2|  1|0.5| unused |
//! ```
//!
//! Extended resolution is obtained from the integer part (high byte of the
//! temperature register) together with the COUNT_REMAIN and COUNT_PER_C
//! registers:
//!
//! ```text
//! T = integer_part - 0.25 + (COUNT_PER_C - COUNT_REMAIN) / COUNT_PER_C
//! ```
//!
//! All arithmetic is integer with truncating division. Host drivers compare
//! against real silicon bit for bit, so no rounding mode may be swapped in.

/// Milli-degrees represented by one native step (0.5°C).
pub const MILLI_PER_STEP: i32 = 500;

/// COUNT_PER_C value reported by the emulated sensor.
pub const SLOPE: u8 = 255;

/// Native fields are left aligned by this many bits.
const NATIVE_SHIFT: u32 = 7;

/// Converts a left-aligned native value into milli-degrees Celsius.
///
/// The arithmetic shift keeps the sign, which yields the 9-bit sign
/// extension of the top bits.
pub fn decode_native_to_milli(native: i16) -> i32 {
    i32::from(native >> NATIVE_SHIFT) * MILLI_PER_STEP
}

/// Rounds `milli` to the nearest 0.5°C step and left aligns it.
///
/// Exact half steps round away from zero. Values outside the 9-bit range
/// wrap, the same as writing them into the register would.
pub fn encode_milli_to_rounded_native(milli: i32) -> i16 {
    let steps = ((milli.unsigned_abs() + 250) / 500) as i32;
    let signed = if milli < 0 { -steps } else { steps };
    signed.wrapping_shl(NATIVE_SHIFT) as i16
}

/// The integer part of a native value, i.e. its high byte read as `i8`.
pub fn integer_part(native: i16) -> i8 {
    (native >> 8) as i8
}

/// Computes the temperature, COUNT_REMAIN and COUNT_PER_C registers that a
/// Read Temperature command latches for `milli`.
pub fn extended_resolution_registers(milli: i32) -> (i16, u8, u8) {
    let rounded = encode_milli_to_rounded_native(milli);
    let fractional_delta = milli.wrapping_sub(i32::from(integer_part(rounded)) * 1000);
    let counter = (750i32.wrapping_sub(fractional_delta)).wrapping_mul(i32::from(SLOPE)) / 1000;
    (rounded, counter as u8, SLOPE)
}

/// Reconstructs milli-degrees from the extended resolution registers the
/// way a host driver does.
///
/// A zero slope leaves only the `integer_part - 0.25` term.
pub fn recover_extended_milli(native: i16, counter: u8, slope: u8) -> i32 {
    let base = i32::from(integer_part(native)) * 1000 - 250;
    if slope == 0 {
        return base;
    }
    base + (i32::from(slope) - i32::from(counter)) * 1000 / i32::from(slope)
}
