//! Built-in CPU0 diagnostic.
//!
//! A short loop that exercises call/return, the deferred jump, holding
//! register increment, the scratchpad and an extended adder cycle:
//!
//! ```text
//! 0000  .MC = 0
//! 0001  .MC = 20, .B = 2                        jump 0002
//! 0002  .MC = 20, .MCONT = 1, .B = 100          call 0100
//! 0003  .MC = 20, .B = 0, .DGO                  deferred jump 0000
//! 0004  .IHR, .THY, .TYW                        R0 <- R0 + 1
//! 0100  .C = -1, .TCX, .TSPY, .LQY, .LZX        Z <- -1, Q <- SP0
//! 0101  .TAX, .LSPX, .BL = Q, .BR = Z, .VCY     SP0 <- Q + Z
//! 0102  .MC = 20, .MCONT = 2                    return
//! ```
//!
//! Each pass through the loop takes twelve cycles and adds one to R0.

use crate::cpu::microword::Microword;
use crate::cpu::rom::ControlStore;

/// Address and contents of each diagnostic microword.
pub const DIAGNOSTIC_PROGRAM: [(u16, Microword); 8] = [
    (0o0000, Microword::new([0, 0, 0])),
    (0o0001, Microword::new([0o2000020000, 0, 0])),
    (0o0002, Microword::new([0o2021000000, 0, 0])),
    (0o0003, Microword::new([0o2000000000, 0, 0o4])),
    (0o0004, Microword::new([0, 0o424000, 0])),
    (0o0100, Microword::new([0o7777, 0o7777240000, 0o60000])),
    (0o0101, Microword::new([0, 0o2001, 0o1110])),
    (0o0102, Microword::new([0o2040000000, 0, 0])),
];

/// Cycles per pass through the diagnostic loop.
pub const DIAGNOSTIC_LOOP_CYCLES: u64 = 12;

/// Clear a control store and load the diagnostic into it.
pub fn load_diagnostic(rom: &mut ControlStore) {
    rom.clear();
    for (address, mw) in DIAGNOSTIC_PROGRAM {
        rom.write(address, mw);
    }
}
