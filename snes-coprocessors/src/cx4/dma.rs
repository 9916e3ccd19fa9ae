//! Pure precondition checks for the CX4-internal DMA engine.

use crate::mapping::MemoryType;

/// A DMA transfer is rejected (and the chip fault-locked) if either endpoint is unmapped, both
/// endpoints classify to the same memory type, or the destination is PRG ROM (which cannot be
/// written).
#[must_use]
pub(crate) fn transfer_is_valid(src: Option<MemoryType>, dest: Option<MemoryType>) -> bool {
    match (src, dest) {
        (Some(src), Some(dest)) => src != dest && dest != MemoryType::PrgRom,
        _ => false,
    }
}
