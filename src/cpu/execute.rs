//! Micro-engine cycle execution.
//!
//! One call to [`Engine::step`] runs one microcycle: gather the buses,
//! run the boolean boxes, special function and adder, test the branch
//! condition, then commit (if the pipeline allows it) and move the
//! sequencer.

use crate::alu::{adder, boolean};
use crate::cpu::branch;
use crate::cpu::microword::{Flag, Microword};
use crate::cpu::rom::ControlStore;
use crate::cpu::sequencer::{self, AddressStep, CycleControl, PipelineStage};
use crate::cpu::special::{self, Effect};
use crate::cpu::unit::{UnitId, UnitState};
use crate::trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which decoder rejected an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpcodeKind {
    /// MC field.
    Branch,
    /// MS field.
    Special,
}

impl fmt::Display for OpcodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpcodeKind::Branch => f.write_str("branch"),
            OpcodeKind::Special => f.write_str("special"),
        }
    }
}

/// Errors that stop a microcycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("unimplemented {kind} code {code:02o}")]
    UnimplementedOpcode { kind: OpcodeKind, code: u8 },
}

/// A register load committed by a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Latch {
    M(u32),
    Q(u32),
    Z(u32),
    Holding { index: u8, value: u32 },
    Scratchpad { index: u8, value: u32 },
}

impl fmt::Display for Latch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Latch::M(v) => write!(f, "M <- {:08o}", v),
            Latch::Q(v) => write!(f, "Q <- {:08o}", v),
            Latch::Z(v) => write!(f, "Z <- {:08o}", v),
            Latch::Holding { index, value } => write!(f, "R{} <- {:08o}", index, value),
            Latch::Scratchpad { index, value } => write!(f, "SP[{:02o}] <- {:08o}", index, value),
        }
    }
}

/// What happened during one microcycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Stage the cycle ran in.
    pub stage: PipelineStage,
    /// O at the start of the cycle.
    pub address: u16,
    /// The microinstruction that executed.
    pub microword: Microword,
    /// X bus.
    pub x: u32,
    /// Y bus.
    pub y: u32,
    /// Left boolean box output.
    pub left_box: u32,
    /// Branch condition outcome.
    pub branch: bool,
    /// Whether register loads were enabled.
    pub committed: bool,
    /// Register loads performed.
    pub latched: Vec<Latch>,
}

/// One micro-engine: its registers and its control store.
#[derive(Clone, Serialize, Deserialize)]
pub struct Engine {
    id: UnitId,
    /// Register state.
    pub state: UnitState,
    /// Control store.
    pub rom: ControlStore,
    /// Completed cycles since reset.
    pub cycles: u64,
}

impl Engine {
    /// Create an engine with zeroed registers and an empty control store.
    pub fn new(id: UnitId) -> Self {
        Self {
            id,
            state: UnitState::new(),
            rom: ControlStore::new(),
            cycles: 0,
        }
    }

    /// Which unit this is.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Zero the registers. The control store is kept.
    pub fn reset(&mut self) {
        self.state.reset();
        self.cycles = 0;
    }

    /// Latch ROM[O] and step O, as the hardware does coming out of reset.
    pub fn prime(&mut self) {
        self.state.set_latched(self.rom.read(self.state.address()));
        self.state.advance();
    }

    /// Execute one microcycle.
    ///
    /// On error nothing has been modified.
    pub fn step(&mut self) -> Result<CycleReport, CycleError> {
        let state = &self.state;
        let mw = state.latched();
        let stage = state.stage();
        let address = state.address();
        let sp_index = mw.scratchpad_index(state.z());

        let constant = mw.constant();
        let mut y = 0;
        if mw.has(Flag::Tcy) {
            y |= constant;
        }
        if mw.has(Flag::Tspy) {
            y |= state.scratchpad(sp_index);
        }
        if mw.has(Flag::Thy) {
            let held = state.holding(usize::from(mw.read_register()));
            y |= adder(held, 0, mw.has(Flag::Ihr));
        }
        if mw.has(Flag::Tosy) {
            y |= u32::from(state.saved_address());
        }
        // TE1Y/TE2Y: no device buses are attached, they read as zero.

        let mut x = if mw.has(Flag::Tcx) { constant } else { 0 };

        let bl = boolean(mw.left_box(), state.m(), state.q());
        let effect = special::apply(mw.special(), bl, &mut x, state)?;

        if mw.has(Flag::Tax) {
            let br = boolean(mw.right_box(), state.z(), state.q());
            x |= adder(bl, br, mw.has(Flag::Loc));
        }

        let taken = branch::evaluate(mw.branch_condition(), x, y, bl, state)?;

        // Everything past this point is infallible.
        if let Effect::SelectBank(bank) = effect {
            self.state.select_bank(bank);
        }

        let control = CycleControl {
            branch: taken,
            deferred: mw.has(Flag::Dgo),
            extended: mw.has(Flag::Vcy),
        };
        let committed = sequencer::commit_enabled(stage, control);
        let latched = if committed {
            self.commit(&mw, x, y, sp_index)
        } else {
            Vec::new()
        };

        let plan = sequencer::transition(stage, control);
        self.state.set_stage(plan.next);
        if plan.fetch {
            let next = self.rom.read(self.state.address());
            self.state.set_latched(next);
        }
        match plan.address {
            AddressStep::Hold => {}
            AddressStep::Increment => self.state.advance(),
            AddressStep::Jump => {
                sequencer::jump(mw.sequence(), mw.branch_address(), x, &mut self.state)
            }
        }
        self.cycles += 1;

        let report = CycleReport {
            stage,
            address,
            microword: mw,
            x,
            y,
            left_box: bl,
            branch: taken,
            committed,
            latched,
        };
        trace::cycle(self.id, &report);
        Ok(report)
    }

    /// Load the registers selected by the microword.
    fn commit(&mut self, mw: &Microword, x: u32, y: u32, sp_index: usize) -> Vec<Latch> {
        let mut latched = Vec::new();
        let bus = |from_x: bool, from_y: bool| {
            (if from_x { x } else { 0 }) | (if from_y { y } else { 0 })
        };

        let txw = mw.has(Flag::Txw);
        let tyw = mw.has(Flag::Tyw);
        let w = bus(txw, tyw);
        if mw.has(Flag::Lr0) {
            self.state.set_holding(0, w);
            latched.push(Latch::Holding { index: 0, value: self.state.holding(0) });
        }
        if txw || tyw {
            let index = mw.load_register();
            if self.state.set_holding(usize::from(index), w) {
                latched.push(Latch::Holding { index, value: self.state.holding(usize::from(index)) });
            } else {
                trace::dropped_write(self.id, index);
            }
        }

        if mw.has(Flag::Lspx) {
            self.state.set_scratchpad(sp_index, x);
            latched.push(Latch::Scratchpad {
                index: sp_index as u8,
                value: self.state.scratchpad(sp_index),
            });
        }

        if mw.has(Flag::Lmx) || mw.has(Flag::Lmy) {
            self.state.set_m(bus(mw.has(Flag::Lmx), mw.has(Flag::Lmy)));
            latched.push(Latch::M(self.state.m()));
        }
        if mw.has(Flag::Lqx) || mw.has(Flag::Lqy) {
            self.state.set_q(bus(mw.has(Flag::Lqx), mw.has(Flag::Lqy)));
            latched.push(Latch::Q(self.state.q()));
        }
        if mw.has(Flag::Lzx) || mw.has(Flag::Lzy) {
            self.state.set_z(bus(mw.has(Flag::Lzx), mw.has(Flag::Lzy)));
            latched.push(Latch::Z(self.state.z()));
        }
        latched
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.id)
            .field("cycles", &self.cycles)
            .field("state", &self.state)
            .finish()
    }
}
