//! Terminal debugger for the BCC 500 emulator.
//!
//! Provides an interactive terminal debugger with:
//! - Register, holding register and scratchpad views for each unit
//! - Control store disassembly around the micro address
//! - Step/run/breakpoint controls and unit switching

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
