//! Branch condition evaluator (MC field).
//!
//! Sign tests look at bit 23 of the 24-bit value.

use crate::alu::word::{is_negative, mask24};
use crate::cpu::execute::{CycleError, OpcodeKind};
use crate::cpu::unit::UnitState;
use log::info;

/// Low 18 bits, the field tested by conditions 014 and 015.
const LOW_FIELD: u32 = 0o777777;

/// Evaluate branch condition `code` for this cycle.
///
/// `x` and `y` are the bus values, `bl` the left boolean box output.
pub fn evaluate(code: u8, x: u32, y: u32, bl: u32, state: &UnitState) -> Result<bool, CycleError> {
    let x = mask24(x);
    let y = mask24(y);
    let taken = match code {
        0o00 => false,
        0o01 | 0o20 => true,
        0o02 => x == 0,
        0o03 => x != 0,
        0o04 => is_negative(x),
        0o05 => !is_negative(x),
        0o06 => x != 0 && !is_negative(x),
        0o07 => !is_negative(y),
        0o10 => is_negative(y),
        0o11 => is_negative(state.holding(0)),
        0o12 => !is_negative(state.holding(0)),
        0o13 => is_negative(x) || x == 0,
        0o14 => x & LOW_FIELD == LOW_FIELD,
        0o15 => x & LOW_FIELD != LOW_FIELD,
        0o16 => !is_negative(state.z()),
        0o17 => is_negative(state.z()),
        0o21 => y & 0o7 != 0,
        0o22 => bl == 0,
        0o23 => bl != 0,
        0o24 => y & 1 == 0,
        0o25 => y & 1 != 0,
        0o26 | 0o34 | 0o45 => {
            info!(target: "bcc500::device", "branch {:02o}: {}", code, device_condition(code));
            false
        }
        _ => {
            return Err(CycleError::UnimplementedOpcode {
                kind: OpcodeKind::Branch,
                code,
            })
        }
    };
    Ok(taken)
}

/// Name of a device-latch branch condition.
fn device_condition(code: u8) -> &'static str {
    match code {
        0o26 => "attention latch 1 set, reset",
        0o34 => "attention latch 2 set, reset",
        _ => "breakpoint set",
    }
}

/// Listing description of a branch condition, if the code is known.
pub fn describe(code: u8) -> Option<&'static str> {
    Some(match code {
        0o00 => "never",
        0o01 | 0o20 => "always",
        0o02 => "X = 0",
        0o03 => "X != 0",
        0o04 => "X < 0",
        0o05 => "X >= 0",
        0o06 => "X > 0",
        0o07 => "Y >= 0",
        0o10 => "Y < 0",
        0o11 => "R0 < 0",
        0o12 => "R0 >= 0",
        0o13 => "X <= 0",
        0o14 => "X[17:0] all ones",
        0o15 => "X[17:0] not all ones",
        0o16 => "Z >= 0",
        0o17 => "Z < 0",
        0o21 => "Y[2:0] != 0",
        0o22 => "BL = 0",
        0o23 => "BL != 0",
        0o24 => "Y even",
        0o25 => "Y odd",
        0o26 | 0o34 | 0o45 => device_condition(code),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NEG: u32 = 0o40000000;

    fn eval(code: u8, x: u32, y: u32) -> bool {
        evaluate(code, x, y, 0, &UnitState::new()).unwrap()
    }

    #[test]
    fn test_constant_conditions() {
        assert!(!eval(0o00, 0, 0));
        assert!(eval(0o01, 0, 0));
        assert!(eval(0o20, 0, 0));
    }

    #[test]
    fn test_x_conditions() {
        assert!(eval(0o02, 0, 0));
        assert!(!eval(0o02, 1, 0));
        assert!(eval(0o03, 1, 0));
        assert!(eval(0o04, NEG, 0));
        assert!(eval(0o05, 0, 0));
        assert!(!eval(0o06, 0, 0));
        assert!(eval(0o06, 5, 0));
        assert!(!eval(0o06, NEG | 5, 0));
        assert!(eval(0o13, 0, 0));
        assert!(eval(0o13, NEG, 0));
        assert!(!eval(0o13, 1, 0));
    }

    #[test]
    fn test_low_field_conditions() {
        assert!(eval(0o14, 0o12777777, 0));
        assert!(!eval(0o14, 0o777776, 0));
        assert!(eval(0o15, 0o777776, 0));
    }

    #[test]
    fn test_y_conditions() {
        assert!(eval(0o07, 0, 0o37777777));
        assert!(eval(0o10, 0, NEG));
        assert!(eval(0o21, 0, 0o10004));
        assert!(!eval(0o21, 0, 0o10000));
        assert!(eval(0o24, 0, 2));
        assert!(eval(0o25, 0, 3));
    }

    #[test]
    fn test_register_conditions() {
        let mut state = UnitState::new();
        state.set_holding(0, NEG);
        state.set_z(1);
        assert!(evaluate(0o11, 0, 0, 0, &state).unwrap());
        assert!(!evaluate(0o12, 0, 0, 0, &state).unwrap());
        assert!(evaluate(0o16, 0, 0, 0, &state).unwrap());
        assert!(!evaluate(0o17, 0, 0, 0, &state).unwrap());
    }

    #[test]
    fn test_boolean_box_conditions() {
        let state = UnitState::new();
        assert!(evaluate(0o22, 0, 0, 0, &state).unwrap());
        assert!(evaluate(0o23, 0, 0, 0o40, &state).unwrap());
    }

    #[test]
    fn test_device_conditions_are_false() {
        for code in [0o26, 0o34, 0o45] {
            assert!(!eval(code, 0o77777777, 0o77777777));
            assert!(describe(code).is_some());
        }
    }

    #[test]
    fn test_device_condition_names() {
        assert_eq!(describe(0o26), Some("attention latch 1 set, reset"));
        assert_eq!(describe(0o34), Some("attention latch 2 set, reset"));
        assert_eq!(describe(0o45), Some("breakpoint set"));
    }

    #[test]
    fn test_unknown_condition_is_fatal() {
        let err = evaluate(0o27, 0, 0, 0, &UnitState::new()).unwrap_err();
        assert_eq!(
            err,
            CycleError::UnimplementedOpcode { kind: OpcodeKind::Branch, code: 0o27 }
        );
        assert!(describe(0o77).is_none());
    }

    proptest! {
        #[test]
        fn prop_complementary_pairs(x in 0u32..=0o77777777, y in 0u32..=0o77777777) {
            for (a, b) in [(0o02, 0o03), (0o04, 0o05), (0o07, 0o10), (0o14, 0o15), (0o24, 0o25)] {
                prop_assert_ne!(eval(a, x, y), eval(b, x, y));
            }
        }
    }
}
