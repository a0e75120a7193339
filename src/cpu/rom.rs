//! Control store.
//!
//! Each micro-engine owns 2048 microinstructions, two banks of 1024.
//! The store is filled at reset or load time and only read while the
//! engine runs.

use crate::cpu::microword::Microword;
use crate::cpu::unit::ADDRESS_MASK;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of microinstructions in a control store.
pub const ROM_SIZE: usize = 2048;

/// A unit's control store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlStore {
    words: Vec<Microword>,
}

impl ControlStore {
    /// Create a control store filled with no-op microwords.
    pub fn new() -> Self {
        Self {
            words: vec![Microword::NOP; ROM_SIZE],
        }
    }

    /// Read the microinstruction at `address` (masked to 11 bits).
    #[inline]
    pub fn read(&self, address: u16) -> Microword {
        self.words
            .get(usize::from(address & ADDRESS_MASK))
            .copied()
            .unwrap_or(Microword::NOP)
    }

    /// Write the microinstruction at `address` (masked to 11 bits).
    #[inline]
    pub fn write(&mut self, address: u16, microword: Microword) {
        if let Some(slot) = self.words.get_mut(usize::from(address & ADDRESS_MASK)) {
            *slot = microword;
        }
    }

    /// Replace the whole store with a complete image.
    pub fn load_image(&mut self, image: &[Microword]) -> Result<(), RomError> {
        if image.len() != ROM_SIZE {
            return Err(RomError::ImageSize {
                expected: ROM_SIZE,
                found: image.len(),
            });
        }
        self.words.copy_from_slice(image);
        Ok(())
    }

    /// Fill the store with no-op microwords.
    pub fn clear(&mut self) {
        self.words.fill(Microword::NOP);
    }

    /// All entries in address order.
    pub fn words(&self) -> &[Microword] {
        &self.words
    }

    /// Addresses and contents of every non-zero entry.
    pub fn populated(&self) -> impl Iterator<Item = (u16, Microword)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, mw)| !mw.is_nop())
            .map(|(addr, mw)| (addr as u16, *mw))
    }
}

impl Default for ControlStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ControlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ControlStore({} populated)", self.populated().count())
    }
}

/// Errors that can occur while filling a control store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("microcode image has {found} entries, expected {expected}")]
    ImageSize { expected: usize, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let rom = ControlStore::new();
        assert_eq!(rom.words().len(), ROM_SIZE);
        assert_eq!(rom.populated().count(), 0);
    }

    #[test]
    fn test_read_write_masks_address() {
        let mut rom = ControlStore::new();
        let mw = Microword::new([1, 2, 3]);
        rom.write(0o4005, mw);
        assert_eq!(rom.read(0o0005), mw);
        assert_eq!(rom.populated().collect::<Vec<_>>(), vec![(5, mw)]);
    }

    #[test]
    fn test_load_image_requires_full_size() {
        let mut rom = ControlStore::new();
        let short = vec![Microword::NOP; 10];
        assert_eq!(
            rom.load_image(&short),
            Err(RomError::ImageSize { expected: ROM_SIZE, found: 10 })
        );

        let mut full = vec![Microword::NOP; ROM_SIZE];
        full[ROM_SIZE - 1] = Microword::new([0, 0, 7]);
        rom.load_image(&full).unwrap();
        assert_eq!(rom.read(0o3777), Microword::new([0, 0, 7]));
    }

    #[test]
    fn test_clear_empties_store() {
        let mut rom = ControlStore::new();
        rom.write(0o100, Microword::new([1, 0, 0]));
        rom.write(0o3777, Microword::new([0, 0, 2]));
        assert_eq!(rom.populated().count(), 2);
        rom.clear();
        assert_eq!(rom.populated().count(), 0);
    }
}
