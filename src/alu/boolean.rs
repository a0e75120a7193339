//! The boolean boxes.
//!
//! Each micro-engine has two boolean boxes selecting one of sixteen
//! two-input functions with a 4-bit code. The left box combines M and Q,
//! the right box combines Z and Q; both feed the adder.

use crate::alu::word::WORD_MASK;
use serde::{Deserialize, Serialize};

/// A boolean box function, named by its operands `A` and `B`.
///
/// The listing names use M for `A` and Q for `B` (left box); the right
/// box substitutes Z for M.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanFunction {
    /// 00: A AND B
    And,
    /// 01: A EQV B
    Eqv,
    /// 02: B
    PassB,
    /// 03: NOT A OR B
    NotAOrB,
    /// 04: A
    PassA,
    /// 05: A OR NOT B
    AOrNotB,
    /// 06: A OR B
    Or,
    /// 07: -1
    Ones,
    /// 10: 0
    Zero,
    /// 11: NOT A AND NOT B
    Nor,
    /// 12: NOT A AND B
    NotAAndB,
    /// 13: listed as NOT A, the hardware table resolves to NOT B
    Code13,
    /// 14: A AND NOT B
    AAndNotB,
    /// 15: NOT B
    NotB,
    /// 16: listed as A EOR B, the hardware table resolves to A AND B
    Code16,
    /// 17: NOT A OR NOT B
    Nand,
}

impl BooleanFunction {
    /// All functions in code order.
    pub const ALL: [BooleanFunction; 16] = [
        Self::And,
        Self::Eqv,
        Self::PassB,
        Self::NotAOrB,
        Self::PassA,
        Self::AOrNotB,
        Self::Or,
        Self::Ones,
        Self::Zero,
        Self::Nor,
        Self::NotAAndB,
        Self::Code13,
        Self::AAndNotB,
        Self::NotB,
        Self::Code16,
        Self::Nand,
    ];

    /// Select the function for a 4-bit code. Higher bits are ignored.
    #[inline]
    pub const fn from_code(code: u8) -> Self {
        Self::ALL[(code & 0o17) as usize]
    }

    /// The 4-bit code of this function.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Apply the function to two 24-bit operands.
    pub const fn apply(self, a: u32, b: u32) -> u32 {
        let a = a & WORD_MASK;
        let b = b & WORD_MASK;
        let not_a = !a & WORD_MASK;
        let not_b = !b & WORD_MASK;
        match self {
            Self::And => a & b,
            Self::Eqv => !(a ^ b) & WORD_MASK,
            Self::PassB => b,
            Self::NotAOrB => not_a | b,
            Self::PassA => a,
            Self::AOrNotB => a | not_b,
            Self::Or => a | b,
            Self::Ones => WORD_MASK,
            Self::Zero => 0,
            Self::Nor => not_a & not_b,
            Self::NotAAndB => not_a & b,
            Self::Code13 => not_b,
            Self::AAndNotB => a & not_b,
            Self::NotB => not_b,
            Self::Code16 => a & b,
            Self::Nand => not_a | not_b,
        }
    }

    /// Listing notation, with `a` and `b` naming the operand registers.
    pub fn describe(self, a: &str, b: &str) -> String {
        match self {
            Self::And | Self::Code16 => format!("{a} AND {b}"),
            Self::Eqv => format!("{a} EQV {b}"),
            Self::PassB => b.to_string(),
            Self::NotAOrB => format!("NOT {a} OR {b}"),
            Self::PassA => a.to_string(),
            Self::AOrNotB => format!("{a} OR NOT {b}"),
            Self::Or => format!("{a} OR {b}"),
            Self::Ones => "-1".to_string(),
            Self::Zero => "0".to_string(),
            Self::Nor => format!("NOT {a} AND NOT {b}"),
            Self::NotAAndB => format!("NOT {a} AND {b}"),
            Self::Code13 | Self::NotB => format!("NOT {b}"),
            Self::AAndNotB => format!("{a} AND NOT {b}"),
            Self::Nand => format!("NOT {a} OR NOT {b}"),
        }
    }
}

/// Evaluate boolean box `code` over operands `a` and `b`.
#[inline]
pub const fn evaluate(code: u8, a: u32, b: u32) -> u32 {
    BooleanFunction::from_code(code).apply(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A: u32 = 0o12345670;
    const B: u32 = 0o76543210;

    #[test]
    fn test_codes_match_table_order() {
        for (code, function) in BooleanFunction::ALL.iter().enumerate() {
            assert_eq!(function.code() as usize, code);
            assert_eq!(BooleanFunction::from_code(code as u8), *function);
        }
    }

    #[test]
    fn test_observed_table_values() {
        assert_eq!(evaluate(0o00, A, B), A & B);
        assert_eq!(evaluate(0o01, A, B), !(A ^ B) & WORD_MASK);
        assert_eq!(evaluate(0o03, A, B), (!A & WORD_MASK) | B);
        assert_eq!(evaluate(0o06, A, B), A | B);
        assert_eq!(evaluate(0o11, A, B), !(A | B) & WORD_MASK);
        assert_eq!(evaluate(0o13, A, B), !B & WORD_MASK);
        assert_eq!(evaluate(0o15, A, B), !B & WORD_MASK);
        assert_eq!(evaluate(0o16, A, B), A & B);
        assert_eq!(evaluate(0o17, A, B), !(A & B) & WORD_MASK);
    }

    #[test]
    fn test_describe_uses_register_names() {
        assert_eq!(BooleanFunction::from_code(2).describe("M", "Q"), "Q");
        assert_eq!(BooleanFunction::from_code(4).describe("Z", "Q"), "Z");
        assert_eq!(BooleanFunction::from_code(0o12).describe("M", "Q"), "NOT M AND Q");
    }

    proptest! {
        #[test]
        fn prop_table_is_total_and_24_bit(code in 0u8..16, a in 0u32..=WORD_MASK, b in 0u32..=WORD_MASK) {
            prop_assert!(evaluate(code, a, b) <= WORD_MASK);
        }

        #[test]
        fn prop_identities(a in 0u32..=WORD_MASK, b in 0u32..=WORD_MASK) {
            prop_assert_eq!(evaluate(0o04, a, b), a);
            prop_assert_eq!(evaluate(0o02, a, b), b);
            prop_assert_eq!(evaluate(0o07, a, b), WORD_MASK);
            prop_assert_eq!(evaluate(0o10, a, b), 0);
        }

        #[test]
        fn prop_complement_is_an_involution(a in 0u32..=WORD_MASK, b in 0u32..=WORD_MASK) {
            prop_assert_eq!(evaluate(0o15, a, evaluate(0o15, a, b)), b);
            prop_assert_eq!(evaluate(0o13, a, evaluate(0o13, a, b)), b);
        }

        #[test]
        fn prop_high_bits_are_ignored(code in 0u8..16, a in any::<u32>(), b in any::<u32>()) {
            prop_assert_eq!(evaluate(code, a, b), evaluate(code, a & WORD_MASK, b & WORD_MASK));
        }
    }
}
