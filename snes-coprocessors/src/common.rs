use jgenesis_proc_macros::{FakeDecode, FakeEncode};
use std::ops::Deref;

// Main SNES master clock frequencies
pub const NTSC_MASTER_CLOCK_FREQUENCY: u64 = 21_477_270;
pub const PAL_MASTER_CLOCK_FREQUENCY: u64 = 21_281_370;

#[derive(Debug, Clone, Default, FakeEncode, FakeDecode)]
pub struct Rom(pub Box<[u8]>);

impl Deref for Rom {
    type Target = Box<[u8]>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[must_use]
pub fn lorom_map_rom_address(address: u32, rom_len: u32) -> u32 {
    // LoROM mapping ignores A23 and A15, and A16-22 are shifted right 1
    let rom_addr = ((address & 0x7F0000) >> 1) | (address & 0x007FFF);
    rom_addr % rom_len
}

/// Generates `take_rom`/`set_rom` methods for a coprocessor that stores its cartridge image in a
/// field of type [`Rom`]. ROM bytes are not part of save-state encoding (see [`Rom`]'s fake
/// `Encode`/`Decode` impls), so a host must reattach them after decoding a state.
#[macro_export]
macro_rules! impl_take_set_rom {
    ($field:ident) => {
        #[must_use]
        pub fn take_rom(&mut self) -> Box<[u8]> {
            std::mem::take(&mut self.$field.0)
        }

        pub fn set_rom(&mut self, rom: Box<[u8]>) {
            self.$field = $crate::common::Rom(rom);
        }
    };
}

pub use impl_take_set_rom;
