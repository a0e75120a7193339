//! # BCC 500 Emulator
//!
//! A microinstruction-level emulator of the micro-engines of the
//! Berkeley Computer Corporation BCC 500.
//!
//! The BCC 500 was built from several identical microprogrammed
//! processors (two CPUs, a memory scheduler, a channel I/O processor and
//! two auxiliary memory controllers), each running its own microcode
//! out of a private control store. This crate models those engines one
//! microcycle at a time and schedules them round-robin.

pub mod alu;
pub mod cpu;
pub mod config;
pub mod image;
pub mod machine;
pub mod trace;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use cpu::{
    ControlStore, CycleError, CycleReport, Engine, Flag, Microword, OpcodeKind, PipelineStage,
    Sequence, UnitId, UnitState,
};
pub use config::{ConfigError, MachineConfig};
pub use image::{disassemble, load_rom, save_rom, ImageError};
pub use machine::{HostControl, HostError, HostEvents, Machine, MachineError, NoEvents, StopReason};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
