//! Special-function unit (MS field).
//!
//! Codes 001-012 merge the left boolean box into X at a shift, 060/061
//! switch ROM banks. Codes 014-033 drive latches and strobes outside the
//! micro-engine; they are reported on the `bcc500::device` log target
//! and otherwise do nothing. The memory transaction codes (040 and up,
//! other than the bank selects) move data and are rejected.

use crate::alu::word::shift_merge;
use crate::cpu::execute::{CycleError, OpcodeKind};
use crate::cpu::microword::SPECIAL_SKZ;
use crate::cpu::unit::{RomBank, UnitState};
use log::info;

/// Shift applied to BL by codes 001 through 010.
const MERGE_SHIFTS: [u32; 8] = [1, 2, 3, 4, 8, 12, 16, 20];

/// Side effect of a special function beyond the X bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Nothing outside X.
    None,
    /// Switch the unit to a ROM bank.
    SelectBank(RomBank),
    /// A device request that was only reported.
    Device(&'static str),
}

/// Apply special function `code`.
///
/// May OR a shifted copy of `bl` into `x`. The bank switch is returned
/// rather than applied so the caller can defer it until every fallible
/// step of the cycle has succeeded.
pub fn apply(code: u8, bl: u32, x: &mut u32, state: &UnitState) -> Result<Effect, CycleError> {
    let effect = match code {
        0o00 | SPECIAL_SKZ => Effect::None,
        0o01..=0o10 => {
            *x |= shift_merge(bl, MERGE_SHIFTS[usize::from(code - 1)]);
            Effect::None
        }
        0o11 => {
            *x |= shift_merge(bl, state.z() & 0o3);
            Effect::None
        }
        0o12 => {
            *x |= shift_merge(bl, (state.z() >> 2) & 0o7);
            Effect::None
        }
        0o60 => Effect::SelectBank(RomBank::A),
        0o61 => Effect::SelectBank(RomBank::B),
        _ => match device_request(code) {
            Some(name) => Effect::Device(name),
            None => {
                return Err(CycleError::UnimplementedOpcode {
                    kind: OpcodeKind::Special,
                    code,
                })
            }
        },
    };
    if let Effect::Device(name) = effect {
        info!(target: "bcc500::device", "special {:02o}: {}", code, name);
    }
    Ok(effect)
}

/// Device requests that are accepted but not modeled.
fn device_request(code: u8) -> Option<&'static str> {
    Some(match code {
        0o14 => "alert",
        0o15 => "POT",
        0o16 => "PIN",
        0o17 => "request strobe 1",
        0o20 => "unprotect",
        0o22 => "load memory request priority",
        0o23 => "reset request strobe 1",
        0o24 => "reset central memory request",
        0o25 => "set protect mask",
        0o26 => "reset I/O connector device",
        0o30 => "set special flag A",
        0o31 => "reset special flag A",
        0o32 => "reset request strobe 2",
        0o33 => "request strobe 2",
        _ => return None,
    })
}

/// Listing description of a special function, if the code is known.
pub fn describe(code: u8) -> Option<&'static str> {
    Some(match code {
        0o00 => "none",
        0o01 => "X |= BL << 1",
        0o02 => "X |= BL << 2",
        0o03 => "X |= BL << 3",
        0o04 => "X |= BL << 4",
        0o05 => "X |= BL << 8",
        0o06 => "X |= BL << 12",
        0o07 => "X |= BL << 16",
        0o10 => "X |= BL << 20",
        0o11 => "X |= BL << Z[1:0]",
        0o12 => "X |= BL << Z[4:2]",
        SPECIAL_SKZ => "SKZ",
        0o60 => "select ROM bank A",
        0o61 => "select ROM bank B",
        _ => return device_request(code),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: u8, bl: u32, state: &UnitState) -> (u32, Effect) {
        let mut x = 0;
        let effect = apply(code, bl, &mut x, state).unwrap();
        (x, effect)
    }

    #[test]
    fn test_fixed_shift_merges() {
        let state = UnitState::new();
        let expected = [0o2, 0o4, 0o10, 0o20, 0o400, 0o10000, 0o200000, 0o4000000];
        for (i, &want) in expected.iter().enumerate() {
            let (x, effect) = run(i as u8 + 1, 1, &state);
            assert_eq!(x, want, "code {:02o}", i + 1);
            assert_eq!(effect, Effect::None);
        }
    }

    #[test]
    fn test_merge_ors_and_masks() {
        let state = UnitState::new();
        let mut x = 0o1;
        apply(0o10, 0o77, &mut x, &state).unwrap();
        assert_eq!(x, 0o74000001);
    }

    #[test]
    fn test_z_controlled_shifts() {
        let mut state = UnitState::new();
        state.set_z(0b11);
        assert_eq!(run(0o11, 1, &state).0, 1 << 3);
        state.set_z(0b10100);
        assert_eq!(run(0o12, 1, &state).0, 1 << 5);
    }

    #[test]
    fn test_bank_select() {
        let state = UnitState::new();
        assert_eq!(run(0o60, 0, &state).1, Effect::SelectBank(RomBank::A));
        assert_eq!(run(0o61, 0, &state).1, Effect::SelectBank(RomBank::B));
    }

    #[test]
    fn test_device_requests_leave_x() {
        let state = UnitState::new();
        for code in [0o14, 0o15, 0o16, 0o17, 0o20, 0o22, 0o23, 0o24, 0o25, 0o26, 0o30, 0o31, 0o32, 0o33] {
            let (x, effect) = run(code, 0o7777, &state);
            assert_eq!(x, 0);
            assert!(matches!(effect, Effect::Device(_)));
        }
        assert_eq!(run(SPECIAL_SKZ, 0o7777, &state), (0, Effect::None));
    }

    #[test]
    fn test_unknown_special_is_fatal() {
        let state = UnitState::new();
        for code in [0o21, 0o27, 0o34, 0o40, 0o45, 0o57, 0o62, 0o77] {
            let mut x = 0o5;
            let err = apply(code, 1, &mut x, &state).unwrap_err();
            assert_eq!(err, CycleError::UnimplementedOpcode { kind: OpcodeKind::Special, code });
            assert_eq!(x, 0o5);
            assert!(describe(code).is_none());
        }
    }
}
