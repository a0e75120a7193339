//! Address sequencer and pipeline stage controller.
//!
//! Every cycle the sequencer decides three things from the current
//! pipeline stage and the cycle's control inputs (branch outcome, DGO,
//! VCY): whether register loads are committed, whether the next
//! microinstruction is fetched, and how the micro address moves.
//!
//! | stage          | commit               | next stage                       | fetch            | address                 |
//! |----------------|----------------------|----------------------------------|------------------|-------------------------|
//! | Normal         | !VCY && (DGO \|\| !BR) | BranchPending if (BR && !DGO) \|\| VCY | !VCY && (!BR \|\| DGO) | hold if VCY, else jump if BR, else +1 |
//! | BranchPending  | !(VCY && BR)         | ExtendedSettle if BR && !DGO && VCY | always        | jump if VCY && BR, else +1 |
//! | ExtendedSettle | always               | Normal                           | always           | +1                      |

use crate::cpu::unit::{UnitState, ADDRESS_MASK};
use serde::{Deserialize, Serialize};

/// Pipeline stage of a micro-engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Ordinary cycle.
    #[default]
    Normal,
    /// A jump was taken or a stretched cycle started; the latched
    /// microinstruction executes again.
    BranchPending,
    /// Third cycle of a stretched cycle that branched.
    ExtendedSettle,
}

impl PipelineStage {
    /// Numeric encoding (0, 1, 2).
    pub const fn index(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::BranchPending => 1,
            Self::ExtendedSettle => 2,
        }
    }

    /// Decode the numeric encoding.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Normal),
            1 => Some(Self::BranchPending),
            2 => Some(Self::ExtendedSettle),
            _ => None,
        }
    }

    /// Trace letter: `A`, `B` or `C`.
    pub const fn letter(self) -> char {
        match self {
            Self::Normal => 'A',
            Self::BranchPending => 'B',
            Self::ExtendedSettle => 'C',
        }
    }
}

/// Sequence control (MCONT) applied when a jump is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sequence {
    /// Load the low address bits from B.
    Jump,
    /// Save the address in OS, then jump.
    Call,
    /// Restore the address from OS.
    Return,
    /// Load the full address from the X bus.
    IndirectJump,
}

impl Sequence {
    /// Decode the 2-bit field.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Self::Jump,
            1 => Self::Call,
            2 => Self::Return,
            _ => Self::IndirectJump,
        }
    }

    /// The 2-bit field value.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Jump => 0,
            Self::Call => 1,
            Self::Return => 2,
            Self::IndirectJump => 3,
        }
    }

    /// Listing mnemonic.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jump => "JUMP",
            Self::Call => "CALL",
            Self::Return => "RETURN",
            Self::IndirectJump => "IJUMP",
        }
    }
}

/// Per-cycle inputs to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleControl {
    /// Branch condition outcome.
    pub branch: bool,
    /// DGO: deferred jump.
    pub deferred: bool,
    /// VCY: extended cycle.
    pub extended: bool,
}

/// How the micro address moves at the end of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStep {
    /// Address unchanged.
    Hold,
    /// Advance by one within the current bank.
    Increment,
    /// Take the jump selected by MCONT.
    Jump,
}

/// End-of-cycle plan for one micro-engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Stage for the next cycle.
    pub next: PipelineStage,
    /// Fetch the microinstruction at the current address into the latch.
    pub fetch: bool,
    /// Address update, applied after the fetch.
    pub address: AddressStep,
}

/// Register commit enable for a cycle.
pub const fn commit_enabled(stage: PipelineStage, control: CycleControl) -> bool {
    let CycleControl { branch, deferred, extended } = control;
    match stage {
        PipelineStage::Normal => !extended && (deferred || !branch),
        PipelineStage::BranchPending => !(extended && branch),
        PipelineStage::ExtendedSettle => true,
    }
}

/// Stage, fetch and address plan for the end of a cycle.
pub const fn transition(stage: PipelineStage, control: CycleControl) -> Transition {
    let CycleControl { branch, deferred, extended } = control;
    match stage {
        PipelineStage::Normal => {
            let next = if (branch && !deferred) || extended {
                PipelineStage::BranchPending
            } else {
                PipelineStage::Normal
            };
            if extended {
                // Stretched cycle: the same microinstruction runs again.
                Transition { next, fetch: false, address: AddressStep::Hold }
            } else {
                Transition {
                    next,
                    fetch: !branch || deferred,
                    address: if branch { AddressStep::Jump } else { AddressStep::Increment },
                }
            }
        }
        PipelineStage::BranchPending => {
            let next = if branch && !deferred && extended {
                PipelineStage::ExtendedSettle
            } else {
                PipelineStage::Normal
            };
            Transition {
                next,
                fetch: true,
                address: if extended && branch { AddressStep::Jump } else { AddressStep::Increment },
            }
        }
        PipelineStage::ExtendedSettle => Transition {
            next: PipelineStage::Normal,
            fetch: true,
            address: AddressStep::Increment,
        },
    }
}

/// Apply a taken jump to the unit's address registers.
///
/// `target` is the B field, `x` the X bus value of this cycle.
pub fn jump(sequence: Sequence, target: u16, x: u32, state: &mut UnitState) {
    match sequence {
        Sequence::Jump => state.load_offset(target),
        Sequence::Call => {
            state.set_saved_address(state.address());
            state.load_offset(target);
        }
        Sequence::Return => state.set_address(state.saved_address()),
        Sequence::IndirectJump => state.set_address((x & u32::from(ADDRESS_MASK)) as u16),
    }
}
