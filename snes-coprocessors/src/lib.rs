//! SNES cartridge coprocessor emulation: CX4's bus/cache/DMA/register behavior, SA1's bus
//! contention timing, and MSU1's register gate.
//!
//! Each coprocessor's actual compute payload (CX4's DSP opcodes, the SA1 65C816 core, MSU1 audio
//! decoding and file I/O) is a black box this crate dispatches to or accounts for rather than
//! implements; see each module's doc comment for its host-supplied collaborator trait.

pub mod common;
pub mod cx4;
pub mod mapping;
pub mod msu1;
pub mod sa1_timing;
