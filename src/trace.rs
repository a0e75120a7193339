//! Trace output.
//!
//! Two log targets carry the machine's trace:
//! - `bcc500::trace`: one line per microcycle (stage letter, address, raw words)
//! - `bcc500::state`: the X and Y buses of every committed cycle, then
//!   one line per register load
//!
//! Nothing here affects execution; with no logger installed the calls
//! are no-ops.

use crate::cpu::execute::CycleReport;
use crate::cpu::unit::UnitId;
use log::{debug, log_enabled, trace, Level};

/// Target for per-cycle lines.
pub const TRACE_TARGET: &str = "bcc500::trace";

/// Target for register change lines.
pub const STATE_TARGET: &str = "bcc500::state";

/// Format the trace line of a cycle.
pub fn cycle_line(unit: UnitId, report: &CycleReport) -> String {
    format!(
        "{:<4} {} {:04o}: {}{}",
        unit,
        report.stage.letter(),
        report.address,
        report.microword,
        if report.branch { " BR" } else { "" }
    )
}

/// Format the bus line of a committed cycle.
pub fn bus_line(report: &CycleReport) -> Option<String> {
    report
        .committed
        .then(|| format!("X {:08o} Y {:08o}", report.x, report.y))
}

/// Emit the trace and state lines for a completed cycle.
pub fn cycle(unit: UnitId, report: &CycleReport) {
    if log_enabled!(target: TRACE_TARGET, Level::Trace) {
        trace!(target: TRACE_TARGET, "{}", cycle_line(unit, report));
    }
    if log_enabled!(target: STATE_TARGET, Level::Debug) {
        if let Some(line) = bus_line(report) {
            debug!(target: STATE_TARGET, "{:<4} {}", unit, line);
        }
    }
    for latch in &report.latched {
        debug!(target: STATE_TARGET, "{:<4} {}", unit, latch);
    }
}

/// Report a holding register write that had no register to land in.
pub fn dropped_write(unit: UnitId, index: u8) {
    debug!(target: STATE_TARGET, "{:<4} R{} not fitted, write dropped", unit, index);
}
