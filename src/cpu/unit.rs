//! Micro-engine register state.
//!
//! Every unit has the same register complement:
//! - O: 11-bit micro address (bit 10 selects ROM bank B)
//! - OS: saved micro address, a one-deep return slot
//! - M, Q, Z: 24-bit working registers
//! - R0..R6: 24-bit holding registers
//! - SP: 64-word scratchpad
//! - I: the latched microinstruction
//! - the pipeline stage

use crate::alu::word::mask24;
use crate::cpu::microword::Microword;
use crate::cpu::sequencer::PipelineStage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of holding registers (R0..R6).
pub const HOLDING_REGISTERS: usize = 7;

/// Number of scratchpad words.
pub const SCRATCHPAD_SIZE: usize = 64;

/// Mask of the full micro address (`03777`).
pub const ADDRESS_MASK: u16 = 0o3777;

/// The ROM bank bit of the micro address (`02000`).
pub const BANK_BIT: u16 = 0o2000;

/// Mask of the in-bank part of the micro address (`01777`).
pub const OFFSET_MASK: u16 = 0o1777;

/// One of the six micro-engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitId {
    /// General purpose processor 0.
    Cpu0,
    /// General purpose processor 1.
    Cpu1,
    /// Memory scheduler.
    Msch,
    /// Channel I/O processor.
    Chio,
    /// Auxiliary memory controller.
    Amc,
    /// Auxiliary memory transfer unit.
    Amtu,
}

impl UnitId {
    /// All units in scheduling order.
    pub const ALL: [UnitId; 6] = [
        UnitId::Cpu0,
        UnitId::Cpu1,
        UnitId::Msch,
        UnitId::Chio,
        UnitId::Amc,
        UnitId::Amtu,
    ];

    /// Device name.
    pub const fn name(self) -> &'static str {
        match self {
            UnitId::Cpu0 => "CPU0",
            UnitId::Cpu1 => "CPU1",
            UnitId::Msch => "MSCH",
            UnitId::Chio => "CHIO",
            UnitId::Amc => "AMC",
            UnitId::Amtu => "AMTU",
        }
    }

    /// Look up a unit by device name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// ROM bank selected by bit 10 of the micro address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RomBank {
    /// Addresses 0000-1777.
    A,
    /// Addresses 2000-3777.
    B,
}

/// Register state of one micro-engine.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitState {
    o: u16,
    os: u16,
    m: u32,
    q: u32,
    z: u32,
    r: [u32; HOLDING_REGISTERS],
    sp: Vec<u32>,
    i: Microword,
    stage: PipelineStage,
}

impl UnitState {
    /// Create a zeroed unit state.
    pub fn new() -> Self {
        Self {
            o: 0,
            os: 0,
            m: 0,
            q: 0,
            z: 0,
            r: [0; HOLDING_REGISTERS],
            sp: vec![0; SCRATCHPAD_SIZE],
            i: Microword::NOP,
            stage: PipelineStage::Normal,
        }
    }

    /// Zero every register.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // ==================== Sequencer ====================

    /// O: current micro address.
    #[inline]
    pub fn address(&self) -> u16 {
        self.o
    }

    /// Set O, masked to 11 bits.
    pub fn set_address(&mut self, address: u16) {
        self.o = address & ADDRESS_MASK;
    }

    /// OS: saved micro address.
    #[inline]
    pub fn saved_address(&self) -> u16 {
        self.os
    }

    /// Set OS, masked to 11 bits.
    pub fn set_saved_address(&mut self, address: u16) {
        self.os = address & ADDRESS_MASK;
    }

    /// Replace the in-bank part of O, keeping the bank bit.
    pub fn load_offset(&mut self, offset: u16) {
        self.o = (self.o & BANK_BIT) | (offset & OFFSET_MASK);
    }

    /// Advance O by one within the current bank.
    pub fn advance(&mut self) {
        self.load_offset(self.o.wrapping_add(1));
    }

    /// Currently selected ROM bank.
    pub fn bank(&self) -> RomBank {
        if self.o & BANK_BIT != 0 {
            RomBank::B
        } else {
            RomBank::A
        }
    }

    /// Select a ROM bank without disturbing the in-bank address.
    pub fn select_bank(&mut self, bank: RomBank) {
        match bank {
            RomBank::A => self.o &= OFFSET_MASK,
            RomBank::B => self.o |= BANK_BIT,
        }
    }

    /// I: latched microinstruction.
    #[inline]
    pub fn latched(&self) -> Microword {
        self.i
    }

    /// Replace the latched microinstruction.
    pub fn set_latched(&mut self, microword: Microword) {
        self.i = microword;
    }

    /// Pipeline stage.
    #[inline]
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Set the pipeline stage.
    pub fn set_stage(&mut self, stage: PipelineStage) {
        self.stage = stage;
    }

    // ==================== Working registers ====================

    /// M register.
    #[inline]
    pub fn m(&self) -> u32 {
        self.m
    }

    /// Set M, masked to 24 bits.
    pub fn set_m(&mut self, value: u32) {
        self.m = mask24(value);
    }

    /// Q register.
    #[inline]
    pub fn q(&self) -> u32 {
        self.q
    }

    /// Set Q, masked to 24 bits.
    pub fn set_q(&mut self, value: u32) {
        self.q = mask24(value);
    }

    /// Z register.
    #[inline]
    pub fn z(&self) -> u32 {
        self.z
    }

    /// Set Z, masked to 24 bits.
    pub fn set_z(&mut self, value: u32) {
        self.z = mask24(value);
    }

    // ==================== Holding registers ====================

    /// Read holding register `index`.
    ///
    /// The 3-bit register selects can name R7, which is not fitted;
    /// it reads as zero.
    pub fn holding(&self, index: usize) -> u32 {
        self.r.get(index).copied().unwrap_or(0)
    }

    /// Write holding register `index`, masked to 24 bits.
    ///
    /// Returns `false` when the register is not fitted and the write was dropped.
    pub fn set_holding(&mut self, index: usize, value: u32) -> bool {
        match self.r.get_mut(index) {
            Some(slot) => {
                *slot = mask24(value);
                true
            }
            None => false,
        }
    }

    /// All holding registers.
    pub fn holding_registers(&self) -> &[u32; HOLDING_REGISTERS] {
        &self.r
    }

    // ==================== Scratchpad ====================

    /// Read scratchpad word `index` (masked to 0..63).
    pub fn scratchpad(&self, index: usize) -> u32 {
        self.sp.get(index % SCRATCHPAD_SIZE).copied().unwrap_or(0)
    }

    /// Write scratchpad word `index` (masked to 0..63), value masked to 24 bits.
    pub fn set_scratchpad(&mut self, index: usize, value: u32) {
        if let Some(slot) = self.sp.get_mut(index % SCRATCHPAD_SIZE) {
            *slot = mask24(value);
        }
    }

    /// The whole scratchpad.
    pub fn scratchpad_words(&self) -> &[u32] {
        &self.sp
    }
}

impl Default for UnitState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitState")
            .field("stage", &self.stage)
            .field("o", &format_args!("{:04o}", self.o))
            .field("os", &format_args!("{:04o}", self.os))
            .field("m", &format_args!("{:08o}", self.m))
            .field("q", &format_args!("{:08o}", self.q))
            .field("z", &format_args!("{:08o}", self.z))
            .field("r", &self.r)
            .field("i", &self.i)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_zeroed() {
        let state = UnitState::new();
        assert_eq!(state.address(), 0);
        assert_eq!(state.saved_address(), 0);
        assert_eq!(state.m() | state.q() | state.z(), 0);
        assert!(state.holding_registers().iter().all(|&r| r == 0));
        assert_eq!(state.scratchpad_words().len(), SCRATCHPAD_SIZE);
        assert!(state.latched().is_nop());
        assert_eq!(state.stage(), PipelineStage::Normal);
    }

    #[test]
    fn test_registers_are_24_bit() {
        let mut state = UnitState::new();
        state.set_m(0o177777777);
        state.set_q(0o100000001);
        state.set_z(u32::MAX);
        assert_eq!(state.m(), 0o77777777);
        assert_eq!(state.q(), 1);
        assert_eq!(state.z(), 0o77777777);
    }

    #[test]
    fn test_advance_wraps_within_bank() {
        let mut state = UnitState::new();
        state.set_address(0o1777);
        state.advance();
        assert_eq!(state.address(), 0);

        state.set_address(0o3777);
        state.advance();
        assert_eq!(state.address(), 0o2000);
    }

    #[test]
    fn test_bank_select() {
        let mut state = UnitState::new();
        state.set_address(0o123);
        state.select_bank(RomBank::B);
        assert_eq!(state.address(), 0o2123);
        assert_eq!(state.bank(), RomBank::B);
        state.select_bank(RomBank::A);
        assert_eq!(state.address(), 0o123);
        assert_eq!(state.bank(), RomBank::A);
    }

    #[test]
    fn test_address_registers_are_11_bit() {
        let mut state = UnitState::new();
        state.set_address(0o7777);
        state.set_saved_address(0o4001);
        assert_eq!(state.address(), 0o3777);
        assert_eq!(state.saved_address(), 0o0001);
    }

    #[test]
    fn test_unfitted_holding_register() {
        let mut state = UnitState::new();
        assert!(state.set_holding(6, 0o123));
        assert!(!state.set_holding(7, 0o456));
        assert_eq!(state.holding(6), 0o123);
        assert_eq!(state.holding(7), 0);
    }

    #[test]
    fn test_scratchpad_index_is_masked() {
        let mut state = UnitState::new();
        state.set_scratchpad(64 + 5, 0o1234);
        assert_eq!(state.scratchpad(5), 0o1234);
        assert_eq!(state.scratchpad(128 + 5), 0o1234);
    }

    #[test]
    fn test_unit_names() {
        for unit in UnitId::ALL {
            assert_eq!(UnitId::from_name(unit.name()), Some(unit));
        }
        assert_eq!(UnitId::from_name("msch"), Some(UnitId::Msch));
        assert_eq!(UnitId::from_name("cpu9"), None);
    }

    #[test]
    fn test_state_serializes_to_json() {
        let mut state = UnitState::new();
        state.set_z(0o77777777);
        state.set_scratchpad(3, 42);
        let json = serde_json::to_string(&state).unwrap();
        let back: UnitState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
