//! The priority-cascade catch-up driver: advances the chip to a target cycle count, picking among
//! locked/suspended/cache-fill/dma/stopped/executing in that order every iteration.

use super::cache::PageSelection;
use super::dma;
use super::registers;
use super::Cx4;
use crate::mapping::MemoryType;

/// The DSP opcode payload itself is out of scope; a host supplies one of these to actually
/// interpret the 16-bit words the cache engine loads. The executor is handed `&mut Cx4` so it can
/// read/write working registers (via [`Cx4::accumulator`]/[`Cx4::register`]/[`Cx4::stack`] and
/// their `set_*` counterparts) and, if it performs an asynchronous external access, start a bus
/// transaction via [`Cx4::start_bus_read`]/[`Cx4::start_bus_write`].
pub trait OpcodeExecutor {
    fn execute_opcode(&mut self, cx4: &mut Cx4, opcode: u16);
}

/// An executor that treats every opcode as a one-cycle no-op. Useful for driver/cache/dma tests
/// that only care about bus and cache behavior, not DSP semantics.
#[derive(Debug, Default)]
pub struct NullOpcodeExecutor;

impl OpcodeExecutor for NullOpcodeExecutor {
    fn execute_opcode(&mut self, cx4: &mut Cx4, _opcode: u16) {
        cx4.advance_cycles(1);
    }
}

impl Cx4 {
    /// Advances emulation until the internal cycle counter reaches the cycle count implied by
    /// `host_master_clock` under this chip's fixed 20MHz-relative clock ratio.
    pub fn run(&mut self, host_master_clock: u64, host: &mut impl OpcodeExecutor) {
        let target_cycle = self.target_cycle(host_master_clock);

        while self.state.cycle_count < target_cycle {
            if self.state.locked {
                self.step(1);
            } else if self.state.suspend.enabled {
                self.step(1);
                if self.state.suspend.duration > 0 {
                    self.state.suspend.duration -= 1;
                    if self.state.suspend.duration == 0 {
                        self.state.suspend.enabled = false;
                    }
                }
            } else if self.state.cache.enabled {
                self.process_cache(target_cycle);
            } else if self.state.dma.enabled {
                self.process_dma(target_cycle);
            } else if self.state.stopped {
                self.step(target_cycle - self.state.cycle_count);
            } else if !self.process_cache(target_cycle) {
                if !self.state.cache.enabled {
                    self.stop();
                }
            } else {
                let opcode = self.state.cache.pages[self.state.cache.page as usize]
                    [self.state.pc as usize];
                self.state.pc = self.state.pc.wrapping_add(1);

                if self.state.pc == 0 {
                    // Execution reached the end of the page; start loading the next one before
                    // running the instruction, so a jump/branch to address 0 doesn't re-trigger
                    // this.
                    self.switch_cache_page(target_cycle);
                }

                host.execute_opcode(self, opcode);
            }
        }
    }

    #[must_use]
    fn target_cycle(&self, host_master_clock: u64) -> u64 {
        (host_master_clock as f64 * self.clock_ratio) as u64
    }

    fn stop(&mut self) {
        self.state.stopped = true;
    }

    fn step(&mut self, cycles: u64) {
        if self.state.bus.enabled {
            if u64::from(self.state.bus.delay_cycles) > cycles {
                self.state.bus.delay_cycles -= cycles as u8;
            } else {
                self.state.bus.enabled = false;
                self.state.bus.delay_cycles = 0;

                if self.state.bus.reading {
                    self.state.memory_data_reg = self.read_cx4(self.state.bus.address);
                    self.state.bus.reading = false;
                }
                if self.state.bus.writing {
                    let value = self.state.memory_data_reg;
                    self.write_cx4(self.state.bus.address, value);
                    self.state.bus.writing = false;
                }
            }
        }

        self.state.cycle_count += cycles;
    }

    /// Starts an asynchronous read that completes after `delay` further calls to [`Self::step`]
    /// (via the driver loop), landing its result in the memory data register.
    pub fn start_bus_read(&mut self, address: u32, delay: u8) {
        self.state.bus.enabled = true;
        self.state.bus.reading = true;
        self.state.bus.writing = false;
        self.state.bus.address = address;
        self.state.bus.delay_cycles = delay;
    }

    /// Starts an asynchronous write of the current memory data register value, completing after
    /// `delay` further steps.
    pub fn start_bus_write(&mut self, address: u32, delay: u8) {
        self.state.bus.enabled = true;
        self.state.bus.writing = true;
        self.state.bus.reading = false;
        self.state.bus.address = address;
        self.state.bus.delay_cycles = delay;
    }

    /// Charges `cycles` against the chip's local cycle counter. The opcode payload is a host
    /// responsibility (see [`OpcodeExecutor`]), including accounting for how many cycles each of
    /// its opcodes costs; this is the hook it drives that accounting through.
    pub fn advance_cycles(&mut self, cycles: u64) {
        self.step(cycles);
    }

    fn switch_cache_page(&mut self, target_cycle: u64) {
        if self.state.cache.page == 1 {
            self.stop();
            return;
        }

        self.state.cache.page = 1;
        if self.state.cache.lock[1] {
            self.stop();
            return;
        }

        self.state.pb = self.state.p;

        if !self.process_cache(target_cycle) && !self.state.cache.enabled {
            self.stop();
        }
    }

    /// Returns `true` once the requested cache line is resident and ready to execute from.
    fn process_cache(&mut self, target_cycle: u64) -> bool {
        let address = self.state.cache.line_address(self.state.pb);

        if self.state.cache.pos == 0 {
            match self.state.cache.select_page(address) {
                PageSelection::AlreadyCached => {
                    self.state.cache.enabled = false;
                    return true;
                }
                PageSelection::BothLocked => {
                    self.state.cache.enabled = false;
                    return false;
                }
                PageSelection::NeedsFill => {
                    self.state.cache.enabled = true;
                }
            }
        }

        while self.state.cache.pos < 256 {
            let word_address = address + u32::from(self.state.cache.pos) * 2;

            let lsb = self.read_cx4(word_address);
            self.step(self.access_delay(word_address));

            let msb = self.read_cx4(word_address + 1);
            self.step(self.access_delay(word_address + 1));

            self.state.cache.store_word(u16::from(msb) << 8 | u16::from(lsb));

            if self.state.cycle_count > target_cycle {
                break;
            }
        }

        if self.state.cache.pos >= 256 {
            self.state.cache.fill_complete(address);
            true
        } else {
            false
        }
    }

    fn process_dma(&mut self, target_cycle: u64) {
        while self.state.dma.pos < self.state.dma.length {
            let src = (self.state.dma.source + u32::from(self.state.dma.pos)) & 0xFF_FFFF;
            let dest = (self.state.dma.dest + u32::from(self.state.dma.pos)) & 0xFF_FFFF;

            let src_type = self.mapping_internal.classify(src);
            let dest_type = self.mapping_internal.classify(dest);
            if !dma::transfer_is_valid(src_type, dest_type) {
                log::warn!("CX4 DMA rejected: src={src:06X} dest={dest:06X}, locking until $7F53 is written");
                self.state.locked = true;
                self.state.dma.pos = 0;
                self.state.dma.enabled = false;
                return;
            }

            self.step(self.access_delay(src));
            let value = self.read_cx4(src);

            self.step(self.access_delay(dest));
            self.write_cx4(dest, value);
            self.state.dma.pos += 1;

            if self.state.cycle_count > target_cycle {
                break;
            }
        }

        if self.state.dma.pos >= self.state.dma.length {
            self.state.dma.pos = 0;
            self.state.dma.enabled = false;
        }
    }

    #[must_use]
    fn access_delay(&self, address: u32) -> u64 {
        match self.mapping_internal.classify(address) {
            Some(MemoryType::PrgRom) => 1 + u64::from(self.state.rom_access_delay),
            Some(MemoryType::SaveRam) => 1 + u64::from(self.state.ram_access_delay),
            _ => 1,
        }
    }

    fn read_cx4(&self, address: u32) -> u8 {
        match self.mapping_internal.classify(address) {
            Some(MemoryType::PrgRom) => self.read_rom(address),
            Some(MemoryType::Register) => registers::read(&self.state, address),
            Some(MemoryType::SaveRam) | None => 0,
        }
    }

    /// Routes a cache-fill or DMA-engine write the same way the original routes it back through
    /// the shared mapping table: a register-window address reaches the same register logic a CPU
    /// write would (the chip's own DMA engine can address its own register/DataRam window), while
    /// PRG ROM is read-only and any side effects a register write would normally signal to the
    /// host (starting another DMA/cache operation, acknowledging an IRQ) are discarded here, since
    /// the underlying state those effects describe is already mutated by `registers::write`.
    fn write_cx4(&mut self, address: u32, value: u8) {
        match self.mapping_internal.classify(address) {
            Some(MemoryType::PrgRom) => {
                log::info!("CX4 internal write ignored (PRG ROM is read-only): {address:06X} = {value:02X}");
            }
            Some(MemoryType::Register) => {
                registers::write(&mut self.state, address, value);
            }
            Some(MemoryType::SaveRam) | None => {}
        }
    }

    /// Non-side-effecting read used by debuggers: never triggers a cache fill, never advances the
    /// cycle counter, and reads 0 for an unmapped address rather than asserting.
    #[must_use]
    pub fn peek(&self, address: u32) -> u8 {
        match self.mapping_cpu.classify(address) {
            Some(MemoryType::Register) => registers::read(&self.state, address),
            Some(MemoryType::PrgRom) => self.read_rom(address),
            _ => 0,
        }
    }

    /// Returns the linear PRG ROM bank a debugger would page through, or `None` if `bank` holds no
    /// linear ROM image (e.g. a SaveRAM or register/RAM bank).
    #[must_use]
    pub fn peek_block(&self, bank: u8) -> Option<&[u8]> {
        let address = u32::from(bank) << 16 | 0x8000;
        if self.mapping_internal.classify(address) != Some(MemoryType::PrgRom) {
            return None;
        }

        let start = crate::common::lorom_map_rom_address(address, self.rom.len() as u32);
        self.rom.get(start as usize..start as usize + 0x8000)
    }

    #[must_use]
    pub fn absolute_rom_address(&self, address: u32) -> Option<u32> {
        match self.mapping_internal.classify(address) {
            Some(MemoryType::PrgRom) => {
                Some(crate::common::lorom_map_rom_address(address, self.rom.len() as u32))
            }
            _ => None,
        }
    }

    /// Debug-only setter over the sixteen working registers; out-of-range indices are a no-op.
    pub fn set_register_raw(&mut self, index: u8, value: u32) {
        if let Some(reg) = self.state.regs.get_mut(usize::from(index)) {
            *reg = value & 0xFF_FFFF;
        }
    }

    /// Reads one of the sixteen working registers; out-of-range indices read as 0.
    #[must_use]
    pub fn register(&self, index: u8) -> u32 {
        self.state.regs.get(usize::from(index)).copied().unwrap_or(0)
    }

    /// The accumulator an [`OpcodeExecutor`] operates on.
    #[must_use]
    pub fn accumulator(&self) -> u32 {
        self.state.a
    }

    pub fn set_accumulator(&mut self, value: u32) {
        self.state.a = value & 0xFF_FFFF;
    }

    #[must_use]
    pub fn stack_pointer(&self) -> u8 {
        self.state.sp
    }

    pub fn set_stack_pointer(&mut self, value: u8) {
        self.state.sp = value;
    }

    /// Reads one of the eight call-stack slots; out-of-range indices read as 0.
    #[must_use]
    pub fn stack(&self, index: u8) -> u16 {
        self.state.stack.get(usize::from(index)).copied().unwrap_or(0)
    }

    /// Writes one of the eight call-stack slots; out-of-range indices are a no-op.
    pub fn set_stack(&mut self, index: u8, value: u16) {
        if let Some(slot) = self.state.stack.get_mut(usize::from(index)) {
            *slot = value;
        }
    }

    #[must_use]
    pub fn multiplier(&self) -> u64 {
        self.state.mult
    }

    pub fn set_multiplier(&mut self, value: u64) {
        self.state.mult = value;
    }

    #[must_use]
    pub fn memory_address_register(&self) -> u32 {
        self.state.memory_address_reg
    }

    pub fn set_memory_address_register(&mut self, value: u32) {
        self.state.memory_address_reg = value;
    }

    #[must_use]
    pub fn data_pointer_register(&self) -> u32 {
        self.state.data_pointer_reg
    }

    pub fn set_data_pointer_register(&mut self, value: u32) {
        self.state.data_pointer_reg = value;
    }

    #[must_use]
    pub fn rom_buffer(&self) -> u8 {
        self.state.rom_buffer
    }

    pub fn set_rom_buffer(&mut self, value: u8) {
        self.state.rom_buffer = value;
    }

    /// Reads one of the three RAM buffer bytes filled by a bus-read opcode; out-of-range indices
    /// read as 0.
    #[must_use]
    pub fn ram_buffer(&self, index: u8) -> u8 {
        self.state.ram_buffer.get(usize::from(index)).copied().unwrap_or(0)
    }

    /// Writes one of the three RAM buffer bytes; out-of-range indices are a no-op.
    pub fn set_ram_buffer(&mut self, index: u8, value: u8) {
        if let Some(byte) = self.state.ram_buffer.get_mut(usize::from(index)) {
            *byte = value;
        }
    }

    #[must_use]
    pub fn negative_flag(&self) -> bool {
        self.state.negative
    }

    pub fn set_negative_flag(&mut self, value: bool) {
        self.state.negative = value;
    }

    #[must_use]
    pub fn zero_flag(&self) -> bool {
        self.state.zero
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.state.zero = value;
    }

    #[must_use]
    pub fn carry_flag(&self) -> bool {
        self.state.carry
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.state.carry = value;
    }

    #[must_use]
    pub fn overflow_flag(&self) -> bool {
        self.state.overflow
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.state.overflow = value;
    }

    #[must_use]
    fn read_rom(&self, address: u32) -> u8 {
        let rom_addr = crate::common::lorom_map_rom_address(address, self.rom.len() as u32);
        self.rom[rom_addr as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cx4::{CoprocessorConfig, Cx4};

    fn test_rom(len: usize) -> Box<[u8]> {
        (0..len).map(|i| (i % 256) as u8).collect::<Vec<u8>>().into_boxed_slice()
    }

    fn new_cx4(rom_len: usize) -> Cx4 {
        Cx4::new(test_rom(rom_len), CoprocessorConfig::default(), crate::common::NTSC_MASTER_CLOCK_FREQUENCY)
            .unwrap()
    }

    #[test]
    fn boot_cache_fills_page_zero_from_cold_start() {
        let mut cx4 = new_cx4(0x200000);
        cx4.write(0x007F4D, 0x00); // cache program bank lsb
        cx4.write(0x007F4E, 0x00); // cache program bank msb
        cx4.write(0x007F48, 0x00); // select page 0, arm cache (chip is stopped)
        cx4.write(0x007F4F, 0x00); // program counter write resumes execution

        let mut host = NullOpcodeExecutor;
        cx4.run(10_000_000, &mut host);

        assert!(!cx4.is_busy());
        assert_eq!(cx4.state.cache.address[0], cx4.state.cache.line_address(0));
    }

    #[test]
    fn dma_with_matching_memory_types_locks_the_chip() {
        let mut cx4 = new_cx4(0x200000);
        // Source and dest both resolve to PrgRom -> invalid transfer.
        cx4.write(0x007F40, 0x00);
        cx4.write(0x007F41, 0x80);
        cx4.write(0x007F42, 0x00);
        cx4.write(0x007F45, 0x00);
        cx4.write(0x007F46, 0x80);
        cx4.write(0x007F43, 0x04);
        cx4.write(0x007F44, 0x00);
        cx4.write(0x007F47, 0x00); // triggers DMA start since stopped

        let mut host = NullOpcodeExecutor;
        cx4.run(1_000_000, &mut host);

        assert!(cx4.state.locked);
        assert!(!cx4.state.dma.enabled);
    }

    #[test]
    fn dma_from_rom_into_register_window_copies_data() {
        // The chip's ordinary DMA use case: pulling working data out of PRG ROM into its own
        // register/DataRam window. Source $018005 maps (LoROM) to ROM offset $8005, whose test
        // fixture byte is 5; dest $006020 lands in the DataRam portion of the register window.
        let mut cx4 = new_cx4(0x200000);
        cx4.write(0x007F40, 0x05); // dma source low
        cx4.write(0x007F41, 0x80); // dma source mid
        cx4.write(0x007F42, 0x01); // dma source high
        cx4.write(0x007F43, 0x01); // dma length lsb
        cx4.write(0x007F44, 0x00); // dma length msb
        cx4.write(0x007F45, 0x20); // dma dest low
        cx4.write(0x007F46, 0x60); // dma dest mid
        cx4.write(0x007F47, 0x00); // dma dest high, triggers DMA start since stopped

        let mut host = NullOpcodeExecutor;
        cx4.run(1_000_000, &mut host);

        assert!(!cx4.state.locked);
        assert!(!cx4.state.dma.enabled);
        assert_eq!(cx4.read(0x006020), 5);
    }

    #[test]
    fn opcode_executor_can_read_and_write_working_registers() {
        struct RecordingExecutor;

        impl OpcodeExecutor for RecordingExecutor {
            fn execute_opcode(&mut self, cx4: &mut Cx4, _opcode: u16) {
                cx4.set_accumulator(0x123456);
                cx4.set_register_raw(3, 0xABCDEF);
                cx4.set_stack_pointer(2);
                cx4.set_stack(1, 0x4242);
                cx4.set_multiplier(99);
                cx4.set_memory_address_register(0x1000);
                cx4.set_data_pointer_register(0x2000);
                cx4.set_rom_buffer(0x7F);
                cx4.set_ram_buffer(0, 0x11);
                cx4.set_negative_flag(true);
                cx4.set_carry_flag(true);
                cx4.advance_cycles(1);
            }
        }

        let mut cx4 = new_cx4(0x200000);
        let mut host = RecordingExecutor;
        host.execute_opcode(&mut cx4, 0);

        assert_eq!(cx4.accumulator(), 0x123456);
        assert_eq!(cx4.register(3), 0xABCDEF);
        assert_eq!(cx4.stack_pointer(), 2);
        assert_eq!(cx4.stack(1), 0x4242);
        assert_eq!(cx4.multiplier(), 99);
        assert_eq!(cx4.memory_address_register(), 0x1000);
        assert_eq!(cx4.data_pointer_register(), 0x2000);
        assert_eq!(cx4.rom_buffer(), 0x7F);
        assert_eq!(cx4.ram_buffer(0), 0x11);
        assert!(cx4.negative_flag());
        assert!(cx4.carry_flag());
        assert!(!cx4.zero_flag());
        assert!(!cx4.overflow_flag());
    }

    #[test]
    fn recovering_from_lock_requires_explicit_unlock_write() {
        let mut cx4 = new_cx4(0x200000);
        cx4.state.locked = true;
        cx4.write(0x007F53, 0x00);
        assert!(!cx4.state.locked);
        assert!(cx4.state.stopped);
    }

    #[test]
    fn bus_read_resolves_after_its_delay() {
        let mut cx4 = new_cx4(0x200000);
        cx4.start_bus_read(0x008000, 2);
        cx4.step(1);
        assert!(cx4.state.bus.enabled);
        cx4.step(1);
        assert!(!cx4.state.bus.enabled);
        assert_eq!(cx4.state.memory_data_reg, cx4.peek_block(0).unwrap()[0]);
    }

    #[test]
    fn peek_block_returns_none_for_a_non_rom_bank() {
        let cx4 = new_cx4(0x200000);
        assert!(cx4.peek_block(0x70).is_none());
    }
}
