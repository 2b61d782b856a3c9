//! Translation granule geometry.
//!
//! The granule size selects how an input address is sliced into per-level
//! table indices and a page offset:
//!
//! - 4KB:  `[47:39]` L0, `[38:30]` L1, `[29:21]` L2, `[20:12]` L3, `[11:0]` offset
//! - 16KB: `[47]` L0 (one bit), `[46:36]` L1, `[35:25]` L2, `[24:14]` L3, `[13:0]` offset
//! - 64KB: no L0, `[47:42]` L1, `[41:29]` L2, `[28:16]` L3, `[15:0]` offset
//!
//! Block sizes follow from the level shifts: 1GB at L1 / 2MB at L2 for the
//! 4KB granule, 32MB at L2 for 16KB, 512MB at L2 for 64KB.

use crate::defs::LEVEL_COUNT;

/// Supported translation granule sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granule {
    Kb4,
    Kb16,
    Kb64,
}

impl Granule {
    /// Parse a granule from its size in KB (4, 16, or 64).
    pub fn from_kb(kb: u32) -> Option<Granule> {
        match kb {
            4 => Some(Granule::Kb4),
            16 => Some(Granule::Kb16),
            64 => Some(Granule::Kb64),
            _ => None,
        }
    }

    pub fn size_kb(self) -> u32 {
        match self {
            Granule::Kb4 => 4,
            Granule::Kb16 => 16,
            Granule::Kb64 => 64,
        }
    }

    /// Geometry for this granule.
    pub fn config(self) -> &'static GranuleConfig {
        match self {
            Granule::Kb4 => &GRANULE_4KB,
            Granule::Kb16 => &GRANULE_16KB,
            Granule::Kb64 => &GRANULE_64KB,
        }
    }
}

/// Per-granule walk geometry.
pub struct GranuleConfig {
    pub granule: Granule,
    pub page_size: u64,
    pub offset_bits: u32,
    pub index_bits: u32,
    pub entries_per_table: u64,
    /// Bit position where each level's index starts (L0..L3).
    pub level_shifts: [u32; LEVEL_COUNT],
    /// Offset mask for a block mapping found at each level, if blocks are
    /// legal there.
    pub block_offset_masks: [Option<u64>; LEVEL_COUNT],
    /// First level of a full-size (48-bit input) walk.
    pub min_level: usize,
}

pub static GRANULE_4KB: GranuleConfig = GranuleConfig {
    granule: Granule::Kb4,
    page_size: 4096,
    offset_bits: 12,
    index_bits: 9,
    entries_per_table: 512,
    level_shifts: [39, 30, 21, 12],
    block_offset_masks: [None, Some(0x3FFF_FFFF), Some(0x1F_FFFF), None],
    min_level: 0,
};

pub static GRANULE_16KB: GranuleConfig = GranuleConfig {
    granule: Granule::Kb16,
    page_size: 16384,
    offset_bits: 14,
    index_bits: 11,
    entries_per_table: 2048,
    level_shifts: [47, 36, 25, 14],
    block_offset_masks: [None, None, Some(0x1FF_FFFF), None],
    min_level: 0,
};

pub static GRANULE_64KB: GranuleConfig = GranuleConfig {
    granule: Granule::Kb64,
    page_size: 65536,
    offset_bits: 16,
    index_bits: 13,
    entries_per_table: 8192,
    level_shifts: [0, 42, 29, 16],
    block_offset_masks: [None, None, Some(0x1FFF_FFFF), None],
    min_level: 1,
};

impl GranuleConfig {
    /// Table index for `addr` at `level`.
    ///
    /// Levels below `min_level` do not exist for this granule and index as 0.
    /// The 16KB granule's L0 holds only two entries, so its index is a single
    /// bit.
    pub fn index(&self, addr: u64, level: usize) -> u64 {
        if level < self.min_level || level >= LEVEL_COUNT {
            return 0;
        }
        let shift = self.level_shifts[level];
        if self.granule == Granule::Kb16 && level == 0 {
            return (addr >> shift) & 0x1;
        }
        (addr >> shift) & ((1 << self.index_bits) - 1)
    }

    /// Offset of `addr` within its page.
    pub fn page_offset(&self, addr: u64) -> u64 {
        addr & ((1 << self.offset_bits) - 1)
    }

    /// Offset of `addr` within a block mapped at `level`.
    ///
    /// Falls back to the page offset when the level has no block size
    /// (including L3, where the leaf is always a page).
    pub fn block_offset(&self, addr: u64, level: usize) -> u64 {
        match self.block_offset_masks.get(level).copied().flatten() {
            Some(mask) => addr & mask,
            None => self.page_offset(addr),
        }
    }
}
