//! BCC 500 micro-engine.
//!
//! Every unit of the machine (CPUs, memory scheduler, channel and
//! auxiliary memory controllers) is the same micro-engine running its
//! own microcode:
//! - 90-bit microinstructions in a 2048-word control store
//! - 24-bit M, Q, Z working registers, seven holding registers, a 64-word scratchpad
//! - a three-stage pipeline controller deciding commits and fetches

pub mod microword;
pub mod unit;
pub mod rom;
pub mod branch;
pub mod special;
pub mod sequencer;
pub mod execute;

pub use microword::{Flag, Microword, MicrowordBuilder};
pub use unit::{RomBank, UnitId, UnitState};
pub use rom::{ControlStore, RomError, ROM_SIZE};
pub use sequencer::{PipelineStage, Sequence};
pub use execute::{CycleError, CycleReport, Engine, Latch, OpcodeKind};
