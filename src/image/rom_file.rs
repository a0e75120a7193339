//! ROM text image format.
//!
//! An image is a list of component assignments, the same shape the
//! microcode listings use:
//!
//! ```text
//! // CPU0 diagnostic
//! ROM[0100][0] = 00000007777;  // .TSPY, .LQY, .TCX, .C = -1, .LZX
//! ROM[0100][1] = 07777240000;
//! ```
//!
//! - Addresses, component indexes and values are octal
//! - Everything after `//` is a comment, as is a line starting with `;`
//! - Entries that are never assigned are zero

use crate::cpu::microword::{Microword, COMPONENT_MASK};
use crate::cpu::rom::{ControlStore, ROM_SIZE};
use crate::image::disasm::disassemble;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

/// Parse a ROM text image into a full control store image.
pub fn parse_rom(text: &str) -> Result<Vec<Microword>, ImageError> {
    let mut words = vec![[0u32; 3]; ROM_SIZE];

    for (line_num, line) in text.lines().enumerate() {
        let line_num = line_num + 1;
        let content = match line.find("//") {
            Some(pos) => &line[..pos],
            None => line,
        };
        let trimmed = content.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        let (address, component, value) =
            parse_assignment(trimmed).map_err(|message| ImageError::ParseError {
                line: line_num,
                message,
            })?;
        words[address][component] = value;
    }

    Ok(words.into_iter().map(Microword::new).collect())
}

/// Parse `ROM[aaaa][w] = vvvvvvvvvvv;`.
fn parse_assignment(text: &str) -> Result<(usize, usize, u32), String> {
    let rest = text
        .strip_prefix("ROM[")
        .ok_or_else(|| format!("expected `ROM[`, found `{}`", text))?;
    let (address, rest) = rest
        .split_once(']')
        .ok_or_else(|| "missing `]` after address".to_string())?;
    let rest = rest
        .trim_start()
        .strip_prefix('[')
        .ok_or_else(|| "expected `[` before component index".to_string())?;
    let (component, rest) = rest
        .split_once(']')
        .ok_or_else(|| "missing `]` after component index".to_string())?;
    let rest = rest
        .trim_start()
        .strip_prefix('=')
        .ok_or_else(|| "expected `=`".to_string())?;
    let value = rest.trim().trim_end_matches(';').trim_end();

    let address = parse_octal(address)?;
    if address >= ROM_SIZE as u32 {
        return Err(format!("address {:o} outside the control store", address));
    }
    let component = parse_octal(component)?;
    if component > 2 {
        return Err(format!("component index {} out of range", component));
    }
    let value = parse_octal(value)?;
    if value > COMPONENT_MASK {
        return Err(format!("value {:o} wider than 30 bits", value));
    }
    Ok((address as usize, component as usize, value))
}

fn parse_octal(text: &str) -> Result<u32, String> {
    let text = text.trim();
    let digits = text.strip_prefix("0o").unwrap_or(text);
    if digits.is_empty() {
        return Err("missing number".to_string());
    }
    u32::from_str_radix(digits, 8).map_err(|_| format!("invalid octal number `{}`", text))
}

/// Render a control store as a ROM text image.
///
/// Only non-zero components are written.
pub fn format_rom(words: &[Microword]) -> String {
    let mut out = String::new();
    let populated = words.iter().filter(|mw| !mw.is_nop()).count();
    let _ = writeln!(out, "// BCC 500 microcode image");
    let _ = writeln!(out, "// {} populated entries", populated);

    for (address, mw) in words.iter().enumerate() {
        if mw.is_nop() {
            continue;
        }
        let mut first = true;
        for (component, value) in mw.words().iter().enumerate() {
            if *value == 0 {
                continue;
            }
            let _ = write!(out, "ROM[{:04o}][{}] = {:011o};", address, component, value);
            if first {
                let _ = write!(out, "  // {}", disassemble(mw));
                first = false;
            }
            out.push('\n');
        }
    }
    out
}

/// Load a ROM text image from disk.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<Vec<Microword>, ImageError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ImageError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;
    parse_rom(&text)
}

/// Save a control store to disk as a ROM text image.
pub fn save_rom<P: AsRef<Path>>(path: P, rom: &ControlStore) -> Result<(), ImageError> {
    std::fs::write(path.as_ref(), format_rom(rom.words()))
        .map_err(|e| ImageError::IoError(format!("{}: {}", path.as_ref().display(), e)))
}

/// Errors that can occur reading or writing images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_lines() {
        let text = "\
// header
ROM[0100][0] = 00000007777;  // .TCX
ROM[0100][1] = 07777240000;

; old style comment
ROM[0102][0] = 0o2040000000
";
        let words = parse_rom(text).unwrap();
        assert_eq!(words.len(), ROM_SIZE);
        assert_eq!(words[0o100], Microword::new([0o7777, 0o7777240000, 0]));
        assert_eq!(words[0o102], Microword::new([0o2040000000, 0, 0]));
        assert_eq!(words.iter().filter(|mw| !mw.is_nop()).count(), 2);
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let bad_address = "// ok\nROM[4000][0] = 1;";
        assert!(matches!(
            parse_rom(bad_address),
            Err(ImageError::ParseError { line: 2, .. })
        ));

        let bad_component = "ROM[0001][3] = 1;";
        assert!(matches!(
            parse_rom(bad_component),
            Err(ImageError::ParseError { line: 1, .. })
        ));

        let bad_digit = "ROM[0001][0] = 0128;";
        assert!(parse_rom(bad_digit).is_err());

        let too_wide = "ROM[0001][0] = 077777777777;";
        assert!(parse_rom(too_wide).is_err());

        assert!(parse_rom("RAM[0][0] = 1;").is_err());
    }

    #[test]
    fn test_format_then_parse() {
        let mut rom = ControlStore::new();
        rom.write(0o1, Microword::new([0o2000020000, 0, 0]));
        rom.write(0o2101, Microword::new([0, 0o2001, 0o1110]));

        let text = format_rom(rom.words());
        assert!(text.contains("ROM[0001][0] = 02000020000;"));
        assert!(text.contains("ROM[2101][2] = 00000001110;"));

        let words = parse_rom(&text).unwrap();
        assert_eq!(words, rom.words());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_rom("/nonexistent/bcc500.rom"),
            Err(ImageError::IoError(_))
        ));
    }
}
