//! 24-bit datapath primitives.
//!
//! This module provides the pieces of the micro-engine datapath that are
//! pure functions of their inputs:
//! - [`word`] - masks and helpers for the 24-bit registers and busses
//! - [`boolean`] - the 16-function boolean boxes feeding the adder

pub mod word;
pub mod boolean;

pub use word::{adder, is_negative, mask24, shift_merge, to_signed, SIGN_BIT, WORD_BITS, WORD_MASK};
pub use boolean::{evaluate as boolean, BooleanFunction};
