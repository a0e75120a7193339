//! Microword disassembler.
//!
//! Renders the fields of a microword in listing notation:
//! `.MC = 20, .MCONT = 1, .B = 100`. Numbers are octal and zero
//! fields are left out.

use crate::alu::BooleanFunction;
use crate::cpu::microword::{Flag, Microword};
use crate::cpu::{branch, special};

/// Disassemble a single microword.
pub fn disassemble(mw: &Microword) -> String {
    if mw.is_nop() {
        return ".MC = 0".to_string();
    }

    let mut fields: Vec<String> = Vec::new();
    let mc = mw.branch_condition();
    if mc != 0 {
        fields.push(format!(".MC = {:o}", mc));
    }
    let mcont = mw.sequence().bits();
    if mcont != 0 {
        fields.push(format!(".MCONT = {}", mcont));
    }
    if mc != 0 || mw.branch_address() != 0 {
        fields.push(format!(".B = {:o}", mw.branch_address()));
    }
    if mw.constant() != 0 || mw.has(Flag::Tcx) || mw.has(Flag::Tcy) {
        fields.push(format!(".C = {:o}", mw.constant()));
    }
    for flag in Flag::ALL {
        if mw.has(flag) {
            fields.push(format!(".{}", flag.name()));
        }
    }

    let tax = mw.has(Flag::Tax);
    let numbered = [
        ("SSP", mw.scratchpad_select(), false),
        ("MS", mw.special(), false),
        ("RRN", mw.read_register(), mw.has(Flag::Thy)),
        ("LRN", mw.load_register(), mw.has(Flag::Txw) || mw.has(Flag::Tyw)),
        ("BL", mw.left_box(), tax),
        ("BR", mw.right_box(), tax),
    ];
    for (name, value, used) in numbered {
        if value != 0 || used {
            fields.push(format!(".{} = {:o}", name, value));
        }
    }

    fields.join(", ")
}

/// Describe what the coded fields of a microword do.
///
/// `if Y odd; X |= BL << 8; BL = M AND Q`. Unknown codes are shown as `??`.
pub fn annotate(mw: &Microword) -> String {
    let mut notes = Vec::new();
    let mc = mw.branch_condition();
    if mc != 0 {
        notes.push(format!("if {}", branch::describe(mc).unwrap_or("??")));
    }
    let ms = mw.special();
    if ms != 0 {
        notes.push(special::describe(ms).unwrap_or("??").to_string());
    }
    if mw.has(Flag::Tax) || mw.left_box() != 0 {
        let bl = BooleanFunction::from_code(mw.left_box());
        notes.push(format!("BL = {}", bl.describe("M", "Q")));
    }
    if mw.has(Flag::Tax) || mw.right_box() != 0 {
        let br = BooleanFunction::from_code(mw.right_box());
        notes.push(format!("BR = {}", br.describe("Z", "Q")));
    }
    notes.join("; ")
}

/// Disassemble every populated entry of a control store image.
pub fn listing(words: &[Microword]) -> String {
    let mut output = String::new();
    output.push_str("; BCC 500 microcode listing\n");
    output.push_str("; -------------------------\n\n");

    for (addr, mw) in words.iter().enumerate() {
        if mw.is_nop() {
            continue;
        }
        output.push_str(&format!("{:04o}: {}  ; {}\n", addr, disassemble(mw), mw));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::sequencer::Sequence;

    #[test]
    fn test_disassemble_branches() {
        assert_eq!(disassemble(&Microword::NOP), ".MC = 0");
        assert_eq!(
            disassemble(&Microword::new([0o2000020000, 0, 0])),
            ".MC = 20, .B = 2"
        );
        assert_eq!(
            disassemble(&Microword::new([0o2021000000, 0, 0])),
            ".MC = 20, .MCONT = 1, .B = 100"
        );
        assert_eq!(
            disassemble(&Microword::new([0o2000000000, 0, 0o4])),
            ".MC = 20, .B = 0, .DGO"
        );
    }

    #[test]
    fn test_disassemble_datapath() {
        assert_eq!(
            disassemble(&Microword::new([0, 0o424000, 0])),
            ".IHR, .THY, .TYW, .RRN = 0, .LRN = 0"
        );
        assert_eq!(
            disassemble(&Microword::new([0o7777, 0o7777240000, 0o60000])),
            ".C = 77777777, .TCX, .TSPY, .LQY, .LZX"
        );
    }

    #[test]
    fn test_disassemble_boxes_and_special() {
        let mw = Microword::builder()
            .branch(0o3)
            .sequence(Sequence::IndirectJump)
            .special(0o61)
            .left_box(0o2)
            .right_box(0o4)
            .flag(Flag::Tax)
            .build();
        assert_eq!(
            disassemble(&mw),
            ".MC = 3, .MCONT = 3, .B = 0, .TAX, .MS = 61, .BL = 2, .BR = 4"
        );
    }

    #[test]
    fn test_annotate() {
        assert_eq!(annotate(&Microword::NOP), "");
        assert_eq!(
            annotate(&Microword::new([0, 0o2001, 0o1110])),
            "BL = Q; BR = Z"
        );
        let mw = Microword::builder().branch(0o25).special(0o05).build();
        assert_eq!(annotate(&mw), "if Y odd; X |= BL << 8");
        let bad = Microword::builder().branch(0o77).special(0o77).build();
        assert_eq!(annotate(&bad), "if ??; ??");
    }

    #[test]
    fn test_listing_skips_empty_entries() {
        let mut words = vec![Microword::NOP; 8];
        words[5] = Microword::new([0o2040000000, 0, 0]);
        let text = listing(&words);
        assert!(text.contains("0005: .MC = 20, .MCONT = 2, .B = 0  ; 2040000000 0000000000 0000000000"));
        assert_eq!(text.lines().filter(|l| !l.starts_with(';') && !l.is_empty()).count(), 1);
    }
}
