//! Byte-addressable register window, mapped at CPU offsets `$6000-$7FFF` (mirrored down to a
//! 4KB internal window at `$7000-$7FFF`).

use super::state::Cx4State;
use jgenesis_common::num::{U16Ext, U24Ext};

/// Masks a CPU-visible offset within the `$6000-$7FFF` window down to the chip's internal
/// 4KB register space.
#[must_use]
fn window_offset(address: u32) -> u32 {
    0x7000 | (address & 0xFFF)
}

#[must_use]
pub(crate) fn read(state: &Cx4State, address: u32) -> u8 {
    let addr = window_offset(address);

    if addr <= 0x7BFF {
        return state.data_ram[(addr & 0xFFF) as usize];
    }

    if (0x7F60..=0x7F7F).contains(&addr) {
        return state.vectors[(addr & 0x1F) as usize];
    }

    if (0x7F80..=0x7FAF).contains(&addr) || (0x7FC0..=0x7FEF).contains(&addr) {
        let masked = addr & 0x3F;
        let reg = state.regs[(masked / 3) as usize];
        return match masked % 3 {
            0 => reg.low_byte(),
            1 => reg.mid_byte(),
            _ => reg.high_byte(),
        };
    }

    if (0x7F53..=0x7F5F).contains(&addr) {
        return status_byte(state);
    }

    match addr {
        0x7F40 => state.dma.source.low_byte(),
        0x7F41 => state.dma.source.mid_byte(),
        0x7F42 => state.dma.source.high_byte(),
        0x7F43 => state.dma.length.lsb(),
        0x7F44 => state.dma.length.msb(),
        0x7F45 => state.dma.dest.low_byte(),
        0x7F46 => state.dma.dest.mid_byte(),
        0x7F47 => state.dma.dest.high_byte(),
        0x7F48 => state.cache.page,
        0x7F49 => state.cache.base.low_byte(),
        0x7F4A => state.cache.base.mid_byte(),
        0x7F4B => state.cache.base.high_byte(),
        0x7F4C => u8::from(state.cache.lock[0]) | (u8::from(state.cache.lock[1]) << 1),
        0x7F4D => state.cache.program_bank.lsb(),
        0x7F4E => state.cache.program_bank.msb(),
        0x7F4F => state.cache.program_counter,
        0x7F50 => state.ram_access_delay | (state.rom_access_delay << 4),
        0x7F51 => u8::from(state.irq_disabled),
        0x7F52 => u8::from(state.single_rom),
        _ => 0,
    }
}

#[must_use]
fn status_byte(state: &Cx4State) -> u8 {
    u8::from(state.suspend.enabled)
        | (u8::from(state.irq_flag) << 1)
        | (u8::from(state.is_running()) << 6)
        | (u8::from(state.is_busy()) << 7)
}

/// Side effects a register write can have beyond mutating `state` directly: starting the DMA
/// engine, arming the cache, or resuming execution from a stopped state. The driver checks these
/// after calling [`write`] rather than this module reaching into driver-owned fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteEffects {
    pub start_dma: bool,
    pub start_cache: bool,
    pub resume_execution: bool,
    pub irq_acknowledged_by_host: bool,
}

pub(crate) fn write(state: &mut Cx4State, address: u32, value: u8) -> WriteEffects {
    let addr = window_offset(address);
    let mut effects = WriteEffects::default();

    if addr <= 0x7BFF {
        state.data_ram[(addr & 0xFFF) as usize] = value;
        return effects;
    }

    if (0x7F60..=0x7F7F).contains(&addr) {
        state.vectors[(addr & 0x1F) as usize] = value;
        return effects;
    }

    if (0x7F80..=0x7FAF).contains(&addr) || (0x7FC0..=0x7FEF).contains(&addr) {
        let masked = addr & 0x3F;
        let reg = &mut state.regs[(masked / 3) as usize];
        match masked % 3 {
            0 => reg.set_low_byte(value),
            1 => reg.set_mid_byte(value),
            _ => reg.set_high_byte(value),
        }
        return effects;
    }

    if (0x7F55..=0x7F5C).contains(&addr) {
        state.suspend.enabled = true;
        state.suspend.duration = (addr - 0x7F55) * 32;
        return effects;
    }

    match addr {
        0x7F40 => state.dma.source.set_low_byte(value),
        0x7F41 => state.dma.source.set_mid_byte(value),
        0x7F42 => state.dma.source.set_high_byte(value),
        0x7F43 => state.dma.length.set_lsb(value),
        0x7F44 => state.dma.length.set_msb(value),
        0x7F45 => state.dma.dest.set_low_byte(value),
        0x7F46 => state.dma.dest.set_mid_byte(value),
        0x7F47 => {
            state.dma.dest.set_high_byte(value);
            if state.stopped {
                state.dma.enabled = true;
                effects.start_dma = true;
            }
        }
        0x7F48 => {
            state.cache.page = value & 0x01;
            if state.stopped {
                state.cache.enabled = true;
                effects.start_cache = true;
            }
        }
        0x7F49 => state.cache.base.set_low_byte(value),
        0x7F4A => state.cache.base.set_mid_byte(value),
        0x7F4B => state.cache.base.set_high_byte(value),
        0x7F4C => {
            state.cache.lock[0] = value & 0x01 != 0;
            state.cache.lock[1] = value & 0x02 != 0;
        }
        0x7F4D => state.cache.program_bank.set_lsb(value),
        0x7F4E => state.cache.program_bank.set_msb(value & 0x7F),
        0x7F4F => {
            state.cache.program_counter = value;
            if state.stopped {
                state.stopped = false;
                state.pb = state.cache.program_bank;
                state.pc = state.cache.program_counter;
                effects.resume_execution = true;
            }
        }
        0x7F50 => {
            state.ram_access_delay = value & 0x07;
            state.rom_access_delay = (value >> 4) & 0x07;
        }
        0x7F51 => {
            state.irq_disabled = value & 0x01 != 0;
            if state.irq_disabled {
                state.irq_flag = true;
                effects.irq_acknowledged_by_host = true;
            }
        }
        0x7F52 => state.single_rom = value & 0x01 != 0,
        0x7F53 => {
            state.locked = false;
            state.stopped = true;
        }
        0x7F5D => state.suspend.enabled = false,
        0x7F5E => state.irq_flag = false,
        _ => {
            log::trace!("CX4 register write to unmapped offset: {addr:04X} = {value:02X}");
        }
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_ram_window_round_trips() {
        let mut state = Cx4State::default();
        write(&mut state, 0x006123, 0xAB);
        assert_eq!(read(&state, 0x006123), 0xAB);
    }

    #[test]
    fn gpr_window_packs_little_endian_24_bit() {
        let mut state = Cx4State::default();
        write(&mut state, 0x007F80, 0x11);
        write(&mut state, 0x007F81, 0x22);
        write(&mut state, 0x007F82, 0x33);
        assert_eq!(state.regs[0], 0x332211);
        assert_eq!(read(&state, 0x007F80), 0x11);
        assert_eq!(read(&state, 0x007F81), 0x22);
        assert_eq!(read(&state, 0x007F82), 0x33);
    }

    #[test]
    fn mirrored_gpr_window_addresses_same_registers() {
        let mut state = Cx4State::default();
        write(&mut state, 0x007FC0, 0x55);
        assert_eq!(state.regs[0], 0x55);
    }

    #[test]
    fn status_byte_composes_suspend_irq_running_busy() {
        let mut state = Cx4State::default();
        state.stopped = false;
        state.suspend.enabled = true;
        state.irq_flag = true;
        state.cache.enabled = true;
        let byte = status_byte(&state);
        assert_eq!(byte & 0x01, 0x01);
        assert_eq!(byte & 0x02, 0x02);
        assert_eq!(byte & 0x40, 0x40);
        assert_eq!(byte & 0x80, 0x80);
    }

    #[test]
    fn writing_dma_dest_high_byte_starts_dma_only_when_stopped() {
        let mut state = Cx4State::default();
        state.stopped = false;
        let effects = write(&mut state, 0x007F47, 0x00);
        assert!(!effects.start_dma);
        assert!(!state.dma.enabled);

        state.stopped = true;
        let effects = write(&mut state, 0x007F47, 0x00);
        assert!(effects.start_dma);
        assert!(state.dma.enabled);
    }

    #[test]
    fn writing_program_counter_resumes_execution_from_cache_shadow() {
        let mut state = Cx4State::default();
        state.cache.program_bank = 0x1234;
        state.stopped = true;
        let effects = write(&mut state, 0x007F4F, 0x99);
        assert!(effects.resume_execution);
        assert!(!state.stopped);
        assert_eq!(state.pb, 0x1234);
        assert_eq!(state.pc, 0x99);
    }

    #[test]
    fn disabling_irq_sets_flag_and_reports_acknowledgement() {
        let mut state = Cx4State::default();
        let effects = write(&mut state, 0x007F51, 0x01);
        assert!(state.irq_disabled);
        assert!(state.irq_flag);
        assert!(effects.irq_acknowledged_by_host);
    }

    #[test]
    fn suspend_duration_scales_with_offset() {
        let mut state = Cx4State::default();
        write(&mut state, 0x007F57, 0x00);
        assert!(state.suspend.enabled);
        assert_eq!(state.suspend.duration, 2 * 32);
    }

    #[test]
    fn access_delay_register_packs_ram_and_rom_nibbles() {
        let mut state = Cx4State::default();
        write(&mut state, 0x007F50, 0x57);
        assert_eq!(state.ram_access_delay, 0x07);
        assert_eq!(state.rom_access_delay, 0x05);
        assert_eq!(read(&state, 0x007F50), 0x57);
    }

    #[test]
    fn unlock_write_clears_lock_and_forces_stop() {
        let mut state = Cx4State::default();
        state.locked = true;
        state.stopped = false;
        write(&mut state, 0x007F53, 0x00);
        assert!(!state.locked);
        assert!(state.stopped);
    }
}
