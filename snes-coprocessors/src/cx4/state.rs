use bincode::{Decode, Encode};

pub(crate) const DATA_RAM_SIZE: usize = 0xC00;

#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
pub(crate) struct BusState {
    pub enabled: bool,
    pub reading: bool,
    pub writing: bool,
    pub address: u32,
    pub delay_cycles: u8,
}

#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
pub(crate) struct DmaState {
    pub source: u32,
    pub dest: u32,
    pub length: u16,
    pub pos: u16,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
pub(crate) struct SuspendState {
    pub enabled: bool,
    pub duration: u32,
}

#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct CacheState {
    pub pages: Box<[[u16; 256]; 2]>,
    pub address: [u32; 2],
    pub lock: [bool; 2],
    pub page: u8,
    pub base: u32,
    pub pos: u16,
    pub enabled: bool,
    // The cache-load shadow copies of PB/PC, set through the register window and only promoted
    // to the live PB/PC once execution resumes from a stopped state.
    pub program_bank: u16,
    pub program_counter: u8,
}

impl Default for CacheState {
    fn default() -> Self {
        Self {
            pages: Box::new([[0; 256]; 2]),
            address: [0; 2],
            lock: [false; 2],
            page: 0,
            base: 0,
            pos: 0,
            enabled: false,
            program_bank: 0,
            program_counter: 0,
        }
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct Cx4State {
    pub cycle_count: u64,

    // Live program bank/counter used to address the currently executing cache page.
    pub pb: u16,
    pub pc: u8,
    // Target bank register, written by opcode side effects; promoted to `pb` on a page swap.
    pub p: u16,

    pub a: u32,
    pub regs: [u32; 16],
    pub sp: u8,
    pub stack: [u16; 8],
    pub mult: u64,

    pub memory_data_reg: u8,
    pub memory_address_reg: u32,
    pub data_pointer_reg: u32,
    pub rom_buffer: u8,
    pub ram_buffer: [u8; 3],

    pub negative: bool,
    pub zero: bool,
    pub carry: bool,
    pub overflow: bool,

    pub irq_flag: bool,
    pub irq_disabled: bool,
    pub stopped: bool,
    pub locked: bool,
    pub single_rom: bool,

    pub ram_access_delay: u8,
    pub rom_access_delay: u8,

    pub bus: BusState,
    pub cache: CacheState,
    pub dma: DmaState,
    pub suspend: SuspendState,

    pub vectors: [u8; 32],
    pub data_ram: Box<[u8; DATA_RAM_SIZE]>,
}

impl Default for Cx4State {
    fn default() -> Self {
        Self {
            cycle_count: 0,
            pb: 0,
            pc: 0,
            p: 0,
            a: 0,
            regs: [0; 16],
            sp: 0,
            stack: [0; 8],
            mult: 0,
            memory_data_reg: 0,
            memory_address_reg: 0,
            data_pointer_reg: 0,
            rom_buffer: 0,
            ram_buffer: [0; 3],
            negative: false,
            zero: false,
            carry: false,
            overflow: false,
            irq_flag: false,
            irq_disabled: false,
            stopped: true,
            locked: false,
            single_rom: true,
            ram_access_delay: 3,
            rom_access_delay: 3,
            bus: BusState::default(),
            cache: CacheState::default(),
            dma: DmaState::default(),
            suspend: SuspendState::default(),
            vectors: [0; 32],
            data_ram: Box::new([0; DATA_RAM_SIZE]),
        }
    }
}

impl Cx4State {
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.cache.enabled || self.dma.enabled || self.bus.delay_cycles > 0
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.is_busy() || !self.stopped
    }
}
