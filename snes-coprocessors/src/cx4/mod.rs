//! CX4, a programmable DSP coprocessor built around a custom Hitachi HG51B169 RISC core.
//!
//! Used by 2 games, Mega Man X2 and Mega Man X3. This module emulates the chip's host-visible
//! bus/cache/DMA/register behavior; the DSP instruction set itself is a black box dispatched
//! through [`OpcodeExecutor`].

mod cache;
mod dma;
mod driver;
mod registers;
mod state;

pub use driver::{NullOpcodeExecutor, OpcodeExecutor};
pub use registers::WriteEffects;

use crate::common::{impl_take_set_rom, Rom};
use crate::mapping::{MappingTable, MemoryType};
use bincode::{Decode, Encode};
use jgenesis_proc_macros::PartialClone;
use state::Cx4State;
use thiserror::Error;

/// The smallest ROM size that can back a CX4 vector table located via LoROM mapping.
const MIN_ROM_LEN: usize = 0x8000;

#[derive(Debug, Error)]
pub enum CoprocessorInitError {
    #[error("ROM is too small to back a CX4 vector table: {len} bytes")]
    RomTooSmall { len: usize },
}

#[derive(Debug, Clone, Copy, Encode, Decode)]
pub struct CoprocessorConfig {
    pub strict_board_mapping: bool,
}

impl Default for CoprocessorConfig {
    fn default() -> Self {
        Self { strict_board_mapping: false }
    }
}

#[derive(Debug, Clone, Encode, Decode, PartialClone)]
pub struct Cx4 {
    #[partial_clone(default)]
    rom: Rom,
    state: Cx4State,
    config: CoprocessorConfig,
    mapping_cpu: MappingTable,
    mapping_internal: MappingTable,
    clock_ratio: f64,
}

impl Cx4 {
    /// # Errors
    ///
    /// Returns [`CoprocessorInitError::RomTooSmall`] if `rom` is too small to contain a LoROM
    /// vector table.
    pub fn new(
        rom: Box<[u8]>,
        config: CoprocessorConfig,
        host_master_clock_rate: u64,
    ) -> Result<Self, CoprocessorInitError> {
        if rom.len() < MIN_ROM_LEN {
            return Err(CoprocessorInitError::RomTooSmall { len: rom.len() });
        }

        Ok(Self {
            rom: Rom(rom),
            state: Cx4State::default(),
            config,
            mapping_cpu: MappingTable::new(config.strict_board_mapping),
            mapping_internal: MappingTable::new(config.strict_board_mapping),
            clock_ratio: 20_000_000.0 / host_master_clock_rate as f64,
        })
    }

    pub fn reset(&mut self) {
        let pages = std::mem::replace(&mut self.state.cache.pages, Box::new([[0; 256]; 2]));
        self.state = Cx4State::default();
        self.state.cache.pages = pages;
    }

    #[must_use]
    pub fn read(&self, address: u32) -> u8 {
        match self.mapping_cpu.classify(address) {
            Some(MemoryType::Register) => registers::read(&self.state, address),
            Some(MemoryType::PrgRom) => self.peek(address),
            Some(MemoryType::SaveRam) => 0,
            None => {
                log::info!("CX4 read from unmapped address: {address:06X}");
                0
            }
        }
    }

    pub fn write(&mut self, address: u32, value: u8) -> WriteEffects {
        match self.mapping_cpu.classify(address) {
            Some(MemoryType::Register) => registers::write(&mut self.state, address, value),
            Some(MemoryType::PrgRom | MemoryType::SaveRam) => WriteEffects::default(),
            None => {
                log::info!("CX4 write to unmapped address: {address:06X} = {value:02X}");
                WriteEffects::default()
            }
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    #[must_use]
    pub fn config(&self) -> CoprocessorConfig {
        self.config
    }

    impl_take_set_rom!(rom);
}
