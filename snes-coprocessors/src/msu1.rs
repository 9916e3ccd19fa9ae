//! MSU1, a streaming audio/data side channel used by SNES ROM hacks and homebrew (most notably
//! the *Super Mario World* and *Mega Man* enhancement hacks that ship CD-quality soundtracks).
//!
//! This module emulates the register interface only. Audio decoding and file I/O are host
//! concerns, plugged in through [`Msu1DataSource`].

use bincode::{Decode, Encode};

/// The four-byte identification string returned by reads at `$2002-$2007`, spelling `"S-MSU1"`.
const SIGNATURE: [u8; 6] = *b"S-MSU1";

/// The PCM stream offset a freshly selected track starts decoding from, skipping the 8-byte
/// `MSU1`/sample-rate header. Only a save-state restore passes an explicit, previously persisted
/// offset instead of this default.
const DEFAULT_TRACK_START_OFFSET: u32 = 8;

/// Register-level MSU1 state. Plain data with no externally-owned resources, so it can be
/// persisted directly in a save state; see [`Msu1::registers`] and [`Msu1::restore_registers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Msu1Registers {
    volume: u8,
    track_select: u16,
    tmp_data_pointer: u32,
    data_pointer: u32,
    repeat: bool,
    paused: bool,
    /// Always false; exposed for bit-for-bit read compatibility with the status register.
    audio_busy: bool,
    /// Always false; exposed for bit-for-bit read compatibility with the status register.
    data_busy: bool,
    track_missing: bool,
    /// Playback position within the currently loaded track, used to resume audio across a save
    /// state without re-deriving it from `data_pointer` (a separate, unrelated read cursor).
    track_offset: u32,
}

impl Default for Msu1Registers {
    fn default() -> Self {
        Self {
            volume: 100,
            track_select: 0,
            tmp_data_pointer: 0,
            data_pointer: 0,
            repeat: false,
            paused: false,
            audio_busy: false,
            data_busy: false,
            track_missing: false,
            track_offset: 0,
        }
    }
}

impl Msu1Registers {
    #[must_use]
    fn status_byte(&self) -> u8 {
        (u8::from(self.data_busy) << 7)
            | (u8::from(self.audio_busy) << 6)
            | (u8::from(self.repeat) << 5)
            | (u8::from(!self.paused) << 4)
            | (u8::from(self.track_missing) << 3)
            | 0x01
    }
}

/// The host-owned backing store for MSU1 data and track audio: a bulk data file addressed by
/// [`Msu1::data_pointer`][Msu1Registers] for register `$2001` reads, and a per-track PCM stream
/// selected by `$2004`/`$2005` writes. Implementations typically wrap a pair of open files.
pub trait Msu1DataSource {
    /// Total length of the data file in bytes, or `0` if no data file is present.
    fn data_len(&self) -> u32;

    /// Seeks the data file's read cursor to `offset`.
    fn seek_data(&mut self, offset: u32);

    /// Reads one byte from the data file at the current cursor and advances it.
    fn read_data_byte(&mut self) -> u8;

    /// Attempts to open and start decoding `track`. Returns `false` if the track is missing,
    /// mirroring `Msu1::LoadTrack`'s `_trackMissing` bookkeeping.
    fn load_track(&mut self, track: u16, repeat: bool, start_offset: u32) -> bool;
}

/// MSU1 register gate. Generic over the host's [`Msu1DataSource`] so this crate never opens a
/// file itself.
#[derive(Debug, Clone)]
pub struct Msu1<D> {
    registers: Msu1Registers,
    data: D,
}

impl<D: Msu1DataSource> Msu1<D> {
    pub fn new(data: D) -> Self {
        Self { registers: Msu1Registers::default(), data }
    }

    /// Snapshot of the register state, suitable for embedding in a save state alongside the
    /// host's own record of which data/track files are open.
    #[must_use]
    pub fn registers(&self) -> Msu1Registers {
        self.registers
    }

    /// Restores register state saved via [`Msu1::registers`]. The caller must have already
    /// reopened its data source; this reseeks it to `registers.data_pointer` and resumes the
    /// selected track from `registers.track_offset`, matching `Msu1::Serialize`'s load-side
    /// behavior.
    pub fn restore_registers(&mut self, registers: Msu1Registers) {
        self.registers = registers;
        self.data.seek_data(registers.data_pointer);
        self.registers.track_missing = !self.data.load_track(
            registers.track_select,
            registers.repeat,
            registers.track_offset,
        );
    }

    #[must_use]
    pub fn read(&mut self, address: u16) -> u8 {
        match address {
            0x2000 => self.registers.status_byte(),
            0x2001 => {
                if !self.registers.data_busy && self.registers.data_pointer < self.data.data_len()
                {
                    self.registers.data_pointer += 1;
                    self.data.read_data_byte()
                } else {
                    0
                }
            }
            0x2002..=0x2007 => SIGNATURE[(address - 0x2002) as usize],
            _ => 0,
        }
    }

    pub fn write(&mut self, address: u16, value: u8) {
        match address {
            0x2000 => {
                self.registers.tmp_data_pointer =
                    (self.registers.tmp_data_pointer & 0xFFFF_FF00) | u32::from(value);
            }
            0x2001 => {
                self.registers.tmp_data_pointer = (self.registers.tmp_data_pointer
                    & 0xFFFF_00FF)
                    | (u32::from(value) << 8);
            }
            0x2002 => {
                self.registers.tmp_data_pointer = (self.registers.tmp_data_pointer
                    & 0xFF00_FFFF)
                    | (u32::from(value) << 16);
            }
            0x2003 => {
                self.registers.tmp_data_pointer =
                    (self.registers.tmp_data_pointer & 0x00FF_FFFF) | (u32::from(value) << 24);
                self.registers.data_pointer = self.registers.tmp_data_pointer;
                self.data.seek_data(self.registers.data_pointer);
            }
            0x2004 => {
                self.registers.track_select = (self.registers.track_select & 0xFF00) | u16::from(value);
            }
            0x2005 => {
                self.registers.track_select =
                    (self.registers.track_select & 0x00FF) | (u16::from(value) << 8);
                self.registers.track_offset = DEFAULT_TRACK_START_OFFSET;
                let loaded = self.data.load_track(
                    self.registers.track_select,
                    self.registers.repeat,
                    self.registers.track_offset,
                );
                self.registers.track_missing = !loaded;
            }
            0x2006 => self.registers.volume = value,
            0x2007 => {
                if !self.registers.audio_busy {
                    self.registers.repeat = value & 0x02 != 0;
                    self.registers.paused = value & 0x01 == 0;
                }
            }
            _ => {
                log::trace!("MSU1 write to unmapped offset: {address:04X} = {value:02X}");
            }
        }
    }
}

/// The two directory-resolution conventions `Msu1::Init` supports: a `<romname>.msu` data file
/// with tracks named after the ROM, or a generic `msu1.rom`/`track` fallback pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Msu1Paths<'a> {
    pub data_file_name: &'a str,
    pub track_base_name: &'a str,
}

/// Chooses between the two MSU1 naming conventions the way `Msu1::Init` does, without touching
/// the filesystem: `msu_file_exists` is an injected existence check over the folder the host has
/// already resolved (accounting for an `msu1.dir` override, if any).
#[must_use]
pub fn resolve_msu1_paths<'a>(
    rom_name: &'a str,
    msu_file_exists: impl Fn(&str) -> bool,
) -> Option<Msu1Paths<'a>> {
    if msu_file_exists(rom_name) {
        Some(Msu1Paths { data_file_name: rom_name, track_base_name: rom_name })
    } else if msu_file_exists("msu1.rom") {
        Some(Msu1Paths { data_file_name: "msu1.rom", track_base_name: "track" })
    } else {
        None
    }
}

/// Formats the PCM file name for `track`, e.g. `"game-3.pcm"` for `track_base_name == "game"`.
#[must_use]
pub fn track_file_name(paths: Msu1Paths<'_>, track: u16) -> String {
    format!("{}-{track}.pcm", paths.track_base_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDataSource {
        bytes: Vec<u8>,
        cursor: usize,
        loadable_tracks: Vec<u16>,
        last_start_offset: std::cell::Cell<u32>,
    }

    impl Msu1DataSource for FakeDataSource {
        fn data_len(&self) -> u32 {
            self.bytes.len() as u32
        }

        fn seek_data(&mut self, offset: u32) {
            self.cursor = offset as usize;
        }

        fn read_data_byte(&mut self) -> u8 {
            let byte = self.bytes[self.cursor];
            self.cursor += 1;
            byte
        }

        fn load_track(&mut self, track: u16, _repeat: bool, start_offset: u32) -> bool {
            self.last_start_offset.set(start_offset);
            self.loadable_tracks.contains(&track)
        }
    }

    fn new_msu1() -> Msu1<FakeDataSource> {
        Msu1::new(FakeDataSource {
            bytes: vec![0xAA, 0xBB, 0xCC, 0xDD],
            cursor: 0,
            loadable_tracks: vec![0, 1],
            last_start_offset: std::cell::Cell::new(0),
        })
    }

    #[test]
    fn signature_bytes_spell_s_msu1() {
        let mut msu1 = new_msu1();
        let signature: Vec<u8> =
            (0x2002..=0x2007).map(|addr| msu1.read(addr)).collect();
        assert_eq!(signature, b"S-MSU1");
    }

    #[test]
    fn status_byte_reports_busy_flags_and_pause_state() {
        let mut msu1 = new_msu1();
        let status = msu1.read(0x2000);
        assert_eq!(status & 0x01, 0x01);
        assert_eq!(status & 0x10, 0x10, "not paused by default");
    }

    #[test]
    fn setting_data_pointer_seeks_and_reads_sequentially() {
        let mut msu1 = new_msu1();
        msu1.write(0x2000, 0x02);
        msu1.write(0x2001, 0x00);
        msu1.write(0x2002, 0x00);
        msu1.write(0x2003, 0x00);
        assert_eq!(msu1.read(0x2001), 0xCC);
        assert_eq!(msu1.read(0x2001), 0xDD);
    }

    #[test]
    fn reading_past_data_end_returns_zero() {
        let mut msu1 = new_msu1();
        msu1.write(0x2000, 0x04);
        msu1.write(0x2003, 0x00);
        assert_eq!(msu1.read(0x2001), 0);
    }

    #[test]
    fn selecting_a_missing_track_sets_track_missing() {
        let mut msu1 = new_msu1();
        msu1.write(0x2004, 0x09);
        msu1.write(0x2005, 0x00);
        assert!(msu1.registers().track_missing);
        let status = msu1.read(0x2000);
        assert_eq!(status & 0x08, 0x08);
    }

    #[test]
    fn selecting_a_present_track_clears_track_missing() {
        let mut msu1 = new_msu1();
        msu1.write(0x2004, 0x01);
        msu1.write(0x2005, 0x00);
        assert!(!msu1.registers().track_missing);
    }

    #[test]
    fn audio_control_write_sets_repeat_and_pause() {
        let mut msu1 = new_msu1();
        msu1.write(0x2007, 0x03);
        let registers = msu1.registers();
        assert!(registers.repeat);
        assert!(!registers.paused);

        msu1.write(0x2007, 0x00);
        assert!(msu1.registers().paused);
    }

    #[test]
    fn volume_write_is_stored_verbatim() {
        let mut msu1 = new_msu1();
        msu1.write(0x2006, 42);
        assert_eq!(msu1.registers().volume, 42);
    }

    #[test]
    fn restore_registers_reseeks_data_and_reloads_track() {
        let mut msu1 = new_msu1();
        let mut registers = Msu1Registers::default();
        registers.data_pointer = 2;
        registers.track_select = 1;
        registers.track_offset = 10;
        msu1.restore_registers(registers);
        assert_eq!(msu1.read(0x2001), 0xCC);
        assert!(!msu1.registers().track_missing);
    }

    #[test]
    fn plain_track_select_write_loads_from_default_start_offset() {
        let mut msu1 = new_msu1();
        msu1.write(0x2005, 0);
        assert_eq!(msu1.registers().track_offset, DEFAULT_TRACK_START_OFFSET);
        assert_eq!(msu1.data.last_start_offset.get(), DEFAULT_TRACK_START_OFFSET);
    }

    #[test]
    fn resolve_paths_prefers_rom_named_msu_file() {
        let paths = resolve_msu1_paths("supermetroid", |name| name == "supermetroid").unwrap();
        assert_eq!(paths.data_file_name, "supermetroid");
        assert_eq!(paths.track_base_name, "supermetroid");
    }

    #[test]
    fn resolve_paths_falls_back_to_generic_names() {
        let paths = resolve_msu1_paths("supermetroid", |name| name == "msu1.rom").unwrap();
        assert_eq!(paths.data_file_name, "msu1.rom");
        assert_eq!(paths.track_base_name, "track");
    }

    #[test]
    fn resolve_paths_returns_none_when_nothing_exists() {
        assert!(resolve_msu1_paths("supermetroid", |_| false).is_none());
    }

    #[test]
    fn track_file_name_formats_base_and_index() {
        let paths = Msu1Paths { data_file_name: "msu1.rom", track_base_name: "track" };
        assert_eq!(track_file_name(paths, 3), "track-3.pcm");
    }
}
