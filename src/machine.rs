//! The multi-unit machine and its scheduler.
//!
//! All six micro-engines exist; each iteration of the scheduler first
//! does host bookkeeping, then runs one microcycle on every enabled unit
//! in the fixed order CPU0, CPU1, MSCH, CHIO, AMC, AMTU.

use crate::config::{ConfigError, MachineConfig};
use crate::cpu::execute::{CycleError, CycleReport, Engine};
use crate::cpu::rom::RomError;
use crate::cpu::unit::{UnitId, UnitState};
use crate::image::{load_diagnostic, load_rom, ImageError};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

/// Why [`Machine::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The step budget ran out.
    Stepped,
    /// An enabled unit reached a breakpoint address.
    Breakpoint { unit: UnitId, address: u16 },
    /// The host asked to stop.
    HostStop,
}

/// Host answer to an event poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostControl {
    Continue,
    Stop,
}

/// Failure reported by the host while servicing events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host event failure: {0}")]
pub struct HostError(pub String);

/// Host services polled once per scheduler iteration.
pub trait HostEvents {
    /// Handle pending host events.
    fn service(&mut self, machine: &Machine) -> Result<HostControl, HostError>;
}

/// A host with nothing to service.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl HostEvents for NoEvents {
    fn service(&mut self, _machine: &Machine) -> Result<HostControl, HostError> {
        Ok(HostControl::Continue)
    }
}

/// Errors that stop the machine.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("{unit} at {address:04o}: {source}")]
    Cycle {
        unit: UnitId,
        address: u16,
        #[source]
        source: CycleError,
    },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("{unit}: {source}")]
    Image {
        unit: UnitId,
        #[source]
        source: ImageError,
    },

    #[error("{unit}: {source}")]
    Rom {
        unit: UnitId,
        #[source]
        source: RomError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Clone)]
struct Slot {
    engine: Engine,
    enabled: bool,
}

/// The whole machine.
pub struct Machine {
    slots: Vec<Slot>,
    breakpoints: BTreeSet<(UnitId, u16)>,
    preload_diagnostic: bool,
    iterations: u64,
}

/// Serializable view of every unit.
#[derive(Debug, Clone, Serialize)]
pub struct MachineSnapshot<'a> {
    pub iterations: u64,
    pub units: Vec<UnitSnapshot<'a>>,
}

/// Serializable view of one unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitSnapshot<'a> {
    pub unit: UnitId,
    pub enabled: bool,
    pub cycles: u64,
    pub state: &'a UnitState,
}

impl Machine {
    /// The reference machine, bootstrapped with the diagnostic in CPU0.
    pub fn new() -> Self {
        let config = MachineConfig::default();
        let mut machine = Self::unbooted(&config);
        machine.bootstrap();
        machine
    }

    /// Build a machine from a configuration, loading unit images.
    pub fn from_config(config: &MachineConfig) -> Result<Self, MachineError> {
        let mut machine = Self::unbooted(config);
        for unit in UnitId::ALL {
            if let Some(path) = config.image(unit) {
                let image = load_rom(path).map_err(|source| MachineError::Image { unit, source })?;
                machine
                    .unit_mut(unit)
                    .rom
                    .load_image(&image)
                    .map_err(|source| MachineError::Rom { unit, source })?;
                info!("{}: loaded {}", unit, path.display());
            }
        }
        machine.bootstrap();
        Ok(machine)
    }

    fn unbooted(config: &MachineConfig) -> Self {
        let slots = UnitId::ALL
            .into_iter()
            .map(|unit| Slot {
                engine: Engine::new(unit),
                enabled: config.is_enabled(unit),
            })
            .collect();
        Self {
            slots,
            breakpoints: BTreeSet::new(),
            preload_diagnostic: config.preload_diagnostic,
            iterations: 0,
        }
    }

    /// The reset switch: zero every unit, optionally preload the
    /// diagnostic into CPU0, then have every unit latch ROM[0].
    pub fn bootstrap(&mut self) {
        for slot in &mut self.slots {
            slot.engine.reset();
        }
        if self.preload_diagnostic {
            load_diagnostic(&mut self.unit_mut(UnitId::Cpu0).rom);
        }
        for slot in &mut self.slots {
            slot.engine.prime();
        }
        self.iterations = 0;
        debug!("bootstrap complete (diagnostic: {})", self.preload_diagnostic);
    }

    /// Whether bootstrap loads the diagnostic.
    pub fn preload_diagnostic(&self) -> bool {
        self.preload_diagnostic
    }

    /// Change the bootstrap switch. Takes effect at the next bootstrap.
    pub fn set_preload_diagnostic(&mut self, preload: bool) {
        self.preload_diagnostic = preload;
    }

    fn slot(&self, unit: UnitId) -> &Slot {
        &self.slots[unit as usize]
    }

    fn slot_mut(&mut self, unit: UnitId) -> &mut Slot {
        &mut self.slots[unit as usize]
    }

    /// A unit's engine.
    pub fn unit(&self, unit: UnitId) -> &Engine {
        &self.slot(unit).engine
    }

    /// A unit's engine, mutably.
    pub fn unit_mut(&mut self, unit: UnitId) -> &mut Engine {
        &mut self.slot_mut(unit).engine
    }

    pub fn is_enabled(&self, unit: UnitId) -> bool {
        self.slot(unit).enabled
    }

    pub fn set_enabled(&mut self, unit: UnitId, enabled: bool) {
        self.slot_mut(unit).enabled = enabled;
    }

    /// Enabled units in scheduling order.
    pub fn enabled_units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.enabled)
            .map(|slot| slot.engine.id())
    }

    /// Scheduler iterations since bootstrap.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    // ==================== Breakpoints ====================

    pub fn add_breakpoint(&mut self, unit: UnitId, address: u16) {
        self.breakpoints.insert((unit, address));
    }

    pub fn remove_breakpoint(&mut self, unit: UnitId, address: u16) -> bool {
        self.breakpoints.remove(&(unit, address))
    }

    /// Flip a breakpoint; returns whether it is now set.
    pub fn toggle_breakpoint(&mut self, unit: UnitId, address: u16) -> bool {
        if self.remove_breakpoint(unit, address) {
            false
        } else {
            self.add_breakpoint(unit, address);
            true
        }
    }

    pub fn has_breakpoint(&self, unit: UnitId, address: u16) -> bool {
        self.breakpoints.contains(&(unit, address))
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = (UnitId, u16)> + '_ {
        self.breakpoints.iter().copied()
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// First enabled unit sitting on a breakpoint.
    pub fn breakpoint_hit(&self) -> Option<(UnitId, u16)> {
        self.enabled_units().find_map(|unit| {
            let address = self.unit(unit).state.address();
            self.has_breakpoint(unit, address).then_some((unit, address))
        })
    }

    // ==================== Scheduling ====================

    /// One scheduler iteration: a microcycle on every enabled unit.
    ///
    /// A fatal opcode stops the iteration at the failing unit; units
    /// earlier in the order keep the cycle they completed.
    pub fn step(&mut self) -> Result<Vec<(UnitId, CycleReport)>, MachineError> {
        let mut reports = Vec::new();
        for slot in self.slots.iter_mut().filter(|slot| slot.enabled) {
            let unit = slot.engine.id();
            let address = slot.engine.state.address();
            let report = slot
                .engine
                .step()
                .map_err(|source| MachineError::Cycle { unit, address, source })?;
            reports.push((unit, report));
        }
        self.iterations += 1;
        Ok(reports)
    }

    /// Run until the budget runs out, a breakpoint is reached, the host
    /// stops or an error occurs.
    ///
    /// `limit` counts scheduler iterations. A breakpoint is not reported
    /// on the first iteration, so a run can resume from one.
    pub fn run<H: HostEvents>(
        &mut self,
        host: &mut H,
        limit: Option<u64>,
    ) -> Result<StopReason, MachineError> {
        let mut remaining = limit;
        let mut first = true;
        loop {
            if host.service(self)? == HostControl::Stop {
                info!("host stop after {} iterations", self.iterations);
                return Ok(StopReason::HostStop);
            }
            if let Some(left) = remaining.as_mut() {
                if *left == 0 {
                    return Ok(StopReason::Stepped);
                }
                *left -= 1;
            }
            if !first {
                if let Some((unit, address)) = self.breakpoint_hit() {
                    info!("{} breakpoint at {:04o}", unit, address);
                    return Ok(StopReason::Breakpoint { unit, address });
                }
            }
            first = false;
            self.step()?;
        }
    }

    /// Serializable view of every unit.
    pub fn snapshot(&self) -> MachineSnapshot<'_> {
        MachineSnapshot {
            iterations: self.iterations,
            units: self
                .slots
                .iter()
                .map(|slot| UnitSnapshot {
                    unit: slot.engine.id(),
                    enabled: slot.enabled,
                    cycles: slot.engine.cycles,
                    state: &slot.engine.state,
                })
                .collect(),
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
