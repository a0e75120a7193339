//! 24-bit word helpers.
//!
//! Registers M, Q, Z, the holding registers and the scratchpad are all
//! 24 bits wide. Values are carried in `u32` and masked at every point
//! where the hardware would drop carries.

/// Width of a datapath word in bits.
pub const WORD_BITS: u32 = 24;

/// Mask of a full datapath word (`077777777`).
pub const WORD_MASK: u32 = 0o77777777;

/// The sign bit of a datapath word (`040000000`).
pub const SIGN_BIT: u32 = 0o40000000;

/// Truncate a value to 24 bits.
#[inline]
pub const fn mask24(value: u32) -> u32 {
    value & WORD_MASK
}

/// Check the sign bit of a 24-bit word.
#[inline]
pub const fn is_negative(value: u32) -> bool {
    value & SIGN_BIT != 0
}

/// Interpret a 24-bit word as two's complement.
#[inline]
pub const fn to_signed(value: u32) -> i32 {
    let value = mask24(value);
    if is_negative(value) {
        value as i32 - (1 << WORD_BITS)
    } else {
        value as i32
    }
}

/// The 24-bit adder: `left + right + carry`, carry out discarded.
#[inline]
pub const fn adder(left: u32, right: u32, carry_in: bool) -> u32 {
    mask24(mask24(left) + mask24(right) + carry_in as u32)
}

/// Shift a boolean-box output left and drop everything above bit 23.
///
/// Shift amounts of 24 or more produce zero.
#[inline]
pub const fn shift_merge(value: u32, amount: u32) -> u32 {
    if amount >= WORD_BITS {
        0
    } else {
        mask24(value << amount)
    }
}
