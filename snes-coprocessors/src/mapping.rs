//! Address classification for CX4-mapped cartridges.
//!
//! A CX4 board claims the entire PRG ROM address space plus a small register/RAM window, so the
//! coprocessor itself stands in as the bus handler for addresses a plain LoROM cartridge would
//! route straight to ROM. This module owns only the *classification*; callers decide what to do
//! with each outcome.

use bincode::{Decode, Encode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum MemoryType {
    PrgRom,
    SaveRam,
    Register,
}

/// Classifies CPU-visible addresses for a CX4 cartridge.
///
/// The original engine registers PRG ROM, SaveRAM, and the `$6000-$7FFF` register/RAM window
/// into two separate handler tables: one on the SNES CPU's own memory manager, one owned by the
/// CX4 itself for its cache-fill and DMA engines to address. Both tables are registered with the
/// *same* ranges (the CX4's DMA engine routinely copies PRG ROM into its own register/DataRam
/// window), so `Cx4` keeps two `MappingTable` instances purely to mirror that ownership split,
/// not because the two views classify addresses differently.
#[derive(Debug, Clone, Copy, Encode, Decode)]
pub struct MappingTable {
    strict_board_mapping: bool,
}

impl MappingTable {
    #[must_use]
    pub fn new(strict_board_mapping: bool) -> Self {
        Self { strict_board_mapping }
    }

    #[must_use]
    pub fn classify(&self, address: u32) -> Option<MemoryType> {
        let bank = ((address >> 16) & 0xFF) as u8;
        let offset = (address & 0xFFFF) as u16;

        if matches!(bank, 0x00..=0x3F | 0x80..=0xBF) && (0x6000..=0x7FFF).contains(&offset) {
            return Some(MemoryType::Register);
        }

        if matches!(bank, 0x70..=0x7D | 0xF0..=0xFF) && offset <= 0x7FFF {
            return Some(MemoryType::SaveRam);
        }

        if matches!(bank, 0x00..=0x3F | 0x80..=0xBF) && offset >= 0x8000 {
            return Some(MemoryType::PrgRom);
        }

        let extended_limit: u8 = if self.strict_board_mapping { 0x7D } else { 0x7F };
        let mirror_limit: u8 = if self.strict_board_mapping { 0xFD } else { 0xFF };
        if (0x40..=extended_limit).contains(&bank) || (0xC0..=mirror_limit).contains(&bank) {
            return Some(MemoryType::PrgRom);
        }

        None
    }
}
