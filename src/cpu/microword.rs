//! Microinstruction words and field decoding.
//!
//! A microinstruction is three 30-bit words, 90 control bits in all.
//! Bits are numbered as in the hardware listings: bit 0 is the most
//! significant bit of word 0, bit 89 the least significant bit of word 2.
//!
//! ```text
//!  0- 5 MC     branch condition       51-56 SSP   scratchpad select
//!  6- 7 MCONT  sequence control       57    TOSY  OS to Y bus
//!  8-17 B      branch address         58    LR0   load R0
//! 18-41 C      constant               59    LSPX  load scratchpad from X
//! 42    IHR    increment holding reg  60-65 MS    special function
//! 43    TCX    constant to X bus      66-68 RRN   read holding register
//! 44    TCY    constant to Y bus      69-71 LRN   load holding register
//! 45    TSPY   scratchpad to Y bus    72-77 LMX..LZY register loads
//! 46    THY    holding reg to Y bus   78-81 BL    left boolean box
//! 47    TXW    X bus to holding reg   82-85 BR    right boolean box
//! 48    TYW    Y bus to holding reg   86    VCY   extended cycle
//! 49    TAX    adder to X bus         87    DGO   deferred jump
//! 50    LOC    adder carry in         88-89 TE1Y, TE2Y device busses
//! ```

use crate::cpu::sequencer::Sequence;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mask of one 30-bit microword component.
pub const COMPONENT_MASK: u32 = 0o7777777777;

/// Total number of control bits in a microinstruction.
pub const MICROWORD_BITS: u8 = 90;

/// Special function code that indexes the scratchpad with Z (SKZ).
pub const SPECIAL_SKZ: u8 = 0o13;

// ============================================================================
// Field layout
// ============================================================================

const MC_MASK: u32 = 0o7700000000;
const MC_SHIFT: u32 = 24;
const MCONT_MASK: u32 = 0o0060000000;
const MCONT_SHIFT: u32 = 22;
const B_MASK: u32 = 0o0017770000;
const B_SHIFT: u32 = 12;
const C_HIGH_MASK: u32 = 0o0000007777;
const C_LOW_MASK: u32 = 0o7777000000;
const C_LOW_SHIFT: u32 = 18;
const SSP_MASK: u32 = 0o0000000770;
const SSP_SHIFT: u32 = 3;
const MS_MASK: u32 = 0o7700000000;
const MS_SHIFT: u32 = 24;
const RRN_MASK: u32 = 0o0070000000;
const RRN_SHIFT: u32 = 21;
const LRN_MASK: u32 = 0o0007000000;
const LRN_SHIFT: u32 = 18;
const BL_MASK: u32 = 0o0000007400;
const BL_SHIFT: u32 = 8;
const BR_MASK: u32 = 0o0000000360;
const BR_SHIFT: u32 = 4;

/// Single-bit control flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    /// Increment the holding register on its way to the Y bus.
    Ihr,
    /// Transfer the constant to the X bus.
    Tcx,
    /// Transfer the constant to the Y bus.
    Tcy,
    /// Transfer the selected scratchpad slot to the Y bus.
    Tspy,
    /// Transfer the selected holding register to the Y bus.
    Thy,
    /// Transfer the X bus to the holding register.
    Txw,
    /// Transfer the Y bus to the holding register.
    Tyw,
    /// Transfer the adder output to the X bus.
    Tax,
    /// Adder low order carry.
    Loc,
    /// Transfer OS to the Y bus.
    Tosy,
    /// Load holding register R0.
    Lr0,
    /// Load the selected scratchpad slot from the X bus.
    Lspx,
    /// Load M from the X bus.
    Lmx,
    /// Load M from the Y bus.
    Lmy,
    /// Load Q from the X bus.
    Lqx,
    /// Load Q from the Y bus.
    Lqy,
    /// Load Z from the X bus.
    Lzx,
    /// Load Z from the Y bus.
    Lzy,
    /// Extended (200 ns) cycle.
    Vcy,
    /// Deferred jump.
    Dgo,
    /// Transfer the E1 device bus to the Y bus.
    Te1y,
    /// Transfer the E2 device bus to the Y bus.
    Te2y,
}

impl Flag {
    /// All flags in bit order.
    pub const ALL: [Flag; 22] = [
        Flag::Ihr,
        Flag::Tcx,
        Flag::Tcy,
        Flag::Tspy,
        Flag::Thy,
        Flag::Txw,
        Flag::Tyw,
        Flag::Tax,
        Flag::Loc,
        Flag::Tosy,
        Flag::Lr0,
        Flag::Lspx,
        Flag::Lmx,
        Flag::Lmy,
        Flag::Lqx,
        Flag::Lqy,
        Flag::Lzx,
        Flag::Lzy,
        Flag::Vcy,
        Flag::Dgo,
        Flag::Te1y,
        Flag::Te2y,
    ];

    /// Word index and mask of this flag.
    const fn location(self) -> (usize, u32) {
        match self {
            Flag::Ihr => (1, 0o400000),
            Flag::Tcx => (1, 0o200000),
            Flag::Tcy => (1, 0o100000),
            Flag::Tspy => (1, 0o040000),
            Flag::Thy => (1, 0o020000),
            Flag::Txw => (1, 0o010000),
            Flag::Tyw => (1, 0o004000),
            Flag::Tax => (1, 0o002000),
            Flag::Loc => (1, 0o001000),
            Flag::Tosy => (1, 0o4),
            Flag::Lr0 => (1, 0o2),
            Flag::Lspx => (1, 0o1),
            Flag::Lmx => (2, 0o400000),
            Flag::Lmy => (2, 0o200000),
            Flag::Lqx => (2, 0o100000),
            Flag::Lqy => (2, 0o040000),
            Flag::Lzx => (2, 0o020000),
            Flag::Lzy => (2, 0o010000),
            Flag::Vcy => (2, 0o10),
            Flag::Dgo => (2, 0o4),
            Flag::Te1y => (2, 0o2),
            Flag::Te2y => (2, 0o1),
        }
    }

    /// Listing mnemonic.
    pub const fn name(self) -> &'static str {
        match self {
            Flag::Ihr => "IHR",
            Flag::Tcx => "TCX",
            Flag::Tcy => "TCY",
            Flag::Tspy => "TSPY",
            Flag::Thy => "THY",
            Flag::Txw => "TXW",
            Flag::Tyw => "TYW",
            Flag::Tax => "TAX",
            Flag::Loc => "LOC",
            Flag::Tosy => "TOSY",
            Flag::Lr0 => "LR0",
            Flag::Lspx => "LSPX",
            Flag::Lmx => "LMX",
            Flag::Lmy => "LMY",
            Flag::Lqx => "LQX",
            Flag::Lqy => "LQY",
            Flag::Lzx => "LZX",
            Flag::Lzy => "LZY",
            Flag::Vcy => "VCY",
            Flag::Dgo => "DGO",
            Flag::Te1y => "TE1Y",
            Flag::Te2y => "TE2Y",
        }
    }
}

// ============================================================================
// Microword
// ============================================================================

/// One microinstruction as read from the control store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Microword {
    words: [u32; 3],
}

impl Microword {
    /// The all-zero microword: never branch, no transfers, no loads.
    pub const NOP: Microword = Microword { words: [0; 3] };

    /// Create a microword from its three components, masked to 30 bits.
    pub const fn new(words: [u32; 3]) -> Self {
        Self {
            words: [
                words[0] & COMPONENT_MASK,
                words[1] & COMPONENT_MASK,
                words[2] & COMPONENT_MASK,
            ],
        }
    }

    /// Create a microword with the given listing bit numbers set.
    ///
    /// Bit numbers of 90 or more are ignored.
    pub fn from_bits(bits: &[u8]) -> Self {
        let mut words = [0u32; 3];
        for &bit in bits.iter().filter(|&&bit| bit < MICROWORD_BITS) {
            let word = usize::from(bit / 30);
            words[word] |= 1 << (29 - u32::from(bit % 30));
        }
        Self { words }
    }

    /// Start building a microword field by field.
    pub fn builder() -> MicrowordBuilder {
        MicrowordBuilder::default()
    }

    /// The three raw components.
    #[inline]
    pub const fn words(&self) -> [u32; 3] {
        self.words
    }

    /// Test a listing bit number (0 = most significant bit of word 0).
    pub const fn bit(&self, bit: u8) -> bool {
        if bit >= MICROWORD_BITS {
            return false;
        }
        let word = (bit / 30) as usize;
        self.words[word] & (1 << (29 - (bit % 30) as u32)) != 0
    }

    /// True for the all-zero microword.
    pub const fn is_nop(&self) -> bool {
        self.words[0] == 0 && self.words[1] == 0 && self.words[2] == 0
    }

    /// MC: branch condition code (6 bits).
    #[inline]
    pub const fn branch_condition(&self) -> u8 {
        ((self.words[0] & MC_MASK) >> MC_SHIFT) as u8
    }

    /// MCONT: sequence control (2 bits).
    #[inline]
    pub const fn sequence(&self) -> Sequence {
        Sequence::from_bits(((self.words[0] & MCONT_MASK) >> MCONT_SHIFT) as u8)
    }

    /// B: branch target address (10 bits, bank bit excluded).
    #[inline]
    pub const fn branch_address(&self) -> u16 {
        ((self.words[0] & B_MASK) >> B_SHIFT) as u16
    }

    /// C: 24-bit constant, split across words 0 and 1.
    #[inline]
    pub const fn constant(&self) -> u32 {
        ((self.words[0] & C_HIGH_MASK) << 12) | ((self.words[1] & C_LOW_MASK) >> C_LOW_SHIFT)
    }

    /// Test a single-bit control flag.
    #[inline]
    pub const fn has(&self, flag: Flag) -> bool {
        let (word, mask) = flag.location();
        self.words[word] & mask != 0
    }

    /// SSP: scratchpad select (6 bits).
    #[inline]
    pub const fn scratchpad_select(&self) -> u8 {
        ((self.words[1] & SSP_MASK) >> SSP_SHIFT) as u8
    }

    /// MS: special function code (6 bits).
    #[inline]
    pub const fn special(&self) -> u8 {
        ((self.words[2] & MS_MASK) >> MS_SHIFT) as u8
    }

    /// RRN: holding register read into the incrementer (3 bits).
    #[inline]
    pub const fn read_register(&self) -> u8 {
        ((self.words[2] & RRN_MASK) >> RRN_SHIFT) as u8
    }

    /// LRN: holding register loaded from the busses (3 bits).
    #[inline]
    pub const fn load_register(&self) -> u8 {
        ((self.words[2] & LRN_MASK) >> LRN_SHIFT) as u8
    }

    /// BL: left boolean box function (4 bits).
    #[inline]
    pub const fn left_box(&self) -> u8 {
        ((self.words[2] & BL_MASK) >> BL_SHIFT) as u8
    }

    /// BR: right boolean box function (4 bits).
    #[inline]
    pub const fn right_box(&self) -> u8 {
        ((self.words[2] & BR_MASK) >> BR_SHIFT) as u8
    }

    /// Scratchpad slot addressed this cycle.
    ///
    /// SSP, with the low six bits of Z merged in under SKZ.
    #[inline]
    pub const fn scratchpad_index(&self, z: u32) -> usize {
        let skz = if self.special() == SPECIAL_SKZ { z & 0o77 } else { 0 };
        (self.scratchpad_select() as u32 | skz) as usize
    }
}

impl fmt::Debug for Microword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Microword({})", self)
    }
}

impl fmt::Display for Microword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:010o} {:010o} {:010o}",
            self.words[0], self.words[1], self.words[2]
        )
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Field-by-field construction of a [`Microword`].
///
/// Values wider than their field are truncated.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrowordBuilder {
    words: [u32; 3],
}

impl MicrowordBuilder {
    fn insert(mut self, word: usize, mask: u32, shift: u32, value: u32) -> Self {
        self.words[word] = (self.words[word] & !mask) | ((value << shift) & mask);
        self
    }

    /// Set MC.
    pub fn branch(self, condition: u8) -> Self {
        self.insert(0, MC_MASK, MC_SHIFT, u32::from(condition))
    }

    /// Set MCONT.
    pub fn sequence(self, sequence: Sequence) -> Self {
        self.insert(0, MCONT_MASK, MCONT_SHIFT, u32::from(sequence.bits()))
    }

    /// Set B.
    pub fn target(self, address: u16) -> Self {
        self.insert(0, B_MASK, B_SHIFT, u32::from(address))
    }

    /// Set C.
    pub fn constant(self, value: u32) -> Self {
        self.insert(0, C_HIGH_MASK, 0, value >> 12)
            .insert(1, C_LOW_MASK, C_LOW_SHIFT, value & 0o7777)
    }

    /// Set a single-bit flag.
    pub fn flag(mut self, flag: Flag) -> Self {
        let (word, mask) = flag.location();
        self.words[word] |= mask;
        self
    }

    /// Set SSP.
    pub fn scratchpad(self, select: u8) -> Self {
        self.insert(1, SSP_MASK, SSP_SHIFT, u32::from(select))
    }

    /// Set MS.
    pub fn special(self, code: u8) -> Self {
        self.insert(2, MS_MASK, MS_SHIFT, u32::from(code))
    }

    /// Set RRN.
    pub fn read_register(self, index: u8) -> Self {
        self.insert(2, RRN_MASK, RRN_SHIFT, u32::from(index))
    }

    /// Set LRN.
    pub fn load_register(self, index: u8) -> Self {
        self.insert(2, LRN_MASK, LRN_SHIFT, u32::from(index))
    }

    /// Set BL.
    pub fn left_box(self, code: u8) -> Self {
        self.insert(2, BL_MASK, BL_SHIFT, u32::from(code))
    }

    /// Set BR.
    pub fn right_box(self, code: u8) -> Self {
        self.insert(2, BR_MASK, BR_SHIFT, u32::from(code))
    }

    /// Finish the microword.
    pub fn build(self) -> Microword {
        Microword::new(self.words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_fields() {
        // .MC = 20, .MCONT = 1, .B = 100
        let mw = Microword::new([0o2021000000, 0, 0]);
        assert_eq!(mw.branch_condition(), 0o20);
        assert_eq!(mw.sequence(), Sequence::Call);
        assert_eq!(mw.branch_address(), 0o100);

        let ret = Microword::new([0o2040000000, 0, 0]);
        assert_eq!(ret.sequence(), Sequence::Return);
        assert_eq!(ret.branch_address(), 0);
    }

    #[test]
    fn test_constant_spans_word_boundary() {
        let mw = Microword::new([0o0000001234, 0o5670000000, 0]);
        assert_eq!(mw.constant(), 0o12345670);

        let all_ones = Microword::new([0o7777, 0o7777240000, 0]);
        assert_eq!(all_ones.constant(), 0o77777777);
        assert!(all_ones.has(Flag::Tcx));
        assert!(all_ones.has(Flag::Tspy));
        assert!(!all_ones.has(Flag::Tcy));
    }

    #[test]
    fn test_word2_fields() {
        // .BL = Q, .BR = Z, .VCY
        let mw = Microword::new([0, 0o2001, 0o1110]);
        assert_eq!(mw.left_box(), 0o02);
        assert_eq!(mw.right_box(), 0o04);
        assert!(mw.has(Flag::Vcy));
        assert!(mw.has(Flag::Tax));
        assert!(mw.has(Flag::Lspx));
        assert!(!mw.has(Flag::Dgo));

        let regs = Microword::new([0, 0, 0o4567000000]);
        assert_eq!(regs.special(), 0o45);
        assert_eq!(regs.read_register(), 6);
        assert_eq!(regs.load_register(), 7);
    }

    #[test]
    fn test_scratchpad_select_and_skz() {
        let mw = Microword::builder().scratchpad(0o41).build();
        assert_eq!(mw.scratchpad_select(), 0o41);
        assert_eq!(mw.scratchpad_index(0o77), 0o41);

        let skz = Microword::builder().scratchpad(0o40).special(SPECIAL_SKZ).build();
        assert_eq!(skz.scratchpad_index(0o1203), 0o43);
    }

    #[test]
    fn test_flag_bits_match_listing_numbers() {
        let numbered = [
            (42, Flag::Ihr),
            (43, Flag::Tcx),
            (44, Flag::Tcy),
            (45, Flag::Tspy),
            (46, Flag::Thy),
            (47, Flag::Txw),
            (48, Flag::Tyw),
            (49, Flag::Tax),
            (50, Flag::Loc),
            (57, Flag::Tosy),
            (58, Flag::Lr0),
            (59, Flag::Lspx),
            (72, Flag::Lmx),
            (73, Flag::Lmy),
            (74, Flag::Lqx),
            (75, Flag::Lqy),
            (76, Flag::Lzx),
            (77, Flag::Lzy),
            (86, Flag::Vcy),
            (87, Flag::Dgo),
            (88, Flag::Te1y),
            (89, Flag::Te2y),
        ];
        for (bit, flag) in numbered {
            let mw = Microword::from_bits(&[bit]);
            for other in Flag::ALL {
                assert_eq!(mw.has(other), other == flag, "bit {} vs {:?}", bit, other);
            }
            assert!(mw.bit(bit));
        }
    }

    #[test]
    fn test_multi_bit_fields_match_listing_numbers() {
        assert_eq!(Microword::from_bits(&[0]).branch_condition(), 0o40);
        assert_eq!(Microword::from_bits(&[5]).branch_condition(), 0o01);
        assert_eq!(Microword::from_bits(&[8]).branch_address(), 0o1000);
        assert_eq!(Microword::from_bits(&[17]).branch_address(), 0o0001);
        assert_eq!(Microword::from_bits(&[18]).constant(), 0o40000000);
        assert_eq!(Microword::from_bits(&[29]).constant(), 0o00010000);
        assert_eq!(Microword::from_bits(&[30]).constant(), 0o00004000);
        assert_eq!(Microword::from_bits(&[41]).constant(), 0o00000001);
        assert_eq!(Microword::from_bits(&[51]).scratchpad_select(), 0o40);
        assert_eq!(Microword::from_bits(&[65]).special(), 0o01);
        assert_eq!(Microword::from_bits(&[66]).read_register(), 4);
        assert_eq!(Microword::from_bits(&[71]).load_register(), 1);
        assert_eq!(Microword::from_bits(&[78]).left_box(), 0o10);
        assert_eq!(Microword::from_bits(&[85]).right_box(), 0o01);
    }

    #[test]
    fn test_builder_matches_decoder() {
        let mw = Microword::builder()
            .branch(0o25)
            .sequence(Sequence::IndirectJump)
            .target(0o1777)
            .constant(0o76543210)
            .flag(Flag::Thy)
            .flag(Flag::Dgo)
            .scratchpad(0o77)
            .special(0o61)
            .read_register(3)
            .load_register(5)
            .left_box(0o16)
            .right_box(0o11)
            .build();

        assert_eq!(mw.branch_condition(), 0o25);
        assert_eq!(mw.sequence(), Sequence::IndirectJump);
        assert_eq!(mw.branch_address(), 0o1777);
        assert_eq!(mw.constant(), 0o76543210);
        assert!(mw.has(Flag::Thy));
        assert!(mw.has(Flag::Dgo));
        assert!(!mw.has(Flag::Vcy));
        assert_eq!(mw.scratchpad_select(), 0o77);
        assert_eq!(mw.special(), 0o61);
        assert_eq!(mw.read_register(), 3);
        assert_eq!(mw.load_register(), 5);
        assert_eq!(mw.left_box(), 0o16);
        assert_eq!(mw.right_box(), 0o11);
    }

    #[test]
    fn test_builder_truncates_wide_values() {
        let mw = Microword::builder().target(0o3777).branch(0o177).build();
        assert_eq!(mw.branch_address(), 0o1777);
        assert_eq!(mw.branch_condition(), 0o77);
        assert_eq!(mw.sequence(), Sequence::Jump);
    }

    #[test]
    fn test_new_masks_components() {
        let mw = Microword::new([u32::MAX, u32::MAX, u32::MAX]);
        assert_eq!(mw.words(), [COMPONENT_MASK; 3]);
        assert!(!Microword::from_bits(&[90]).bit(90));
        assert!(Microword::from_bits(&[90]).is_nop());
    }
}
