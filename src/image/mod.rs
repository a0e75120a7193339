//! Microcode images.
//!
//! This module provides:
//! - the ROM text image format (load and save)
//! - a microword disassembler producing listing notation
//! - the built-in CPU0 diagnostic program

pub mod rom_file;
pub mod disasm;
pub mod diagnostic;

pub use rom_file::{format_rom, load_rom, parse_rom, save_rom, ImageError};
pub use disasm::{annotate, disassemble, listing};
pub use diagnostic::{load_diagnostic, DIAGNOSTIC_PROGRAM};
