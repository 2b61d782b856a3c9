//! VMSAv8/v9 Architecture Constants
//!
//! Named constants for translation table descriptor fields, register
//! layouts, and walk geometry. Eliminates magic numbers throughout the
//! codebase.

// ── Descriptor type bits ─────────────────────────────────────────────
pub const PTE_VALID: u64 = 1 << 0;
pub const PTE_TABLE: u64 = 1 << 1;

// ── Descriptor address fields (48-bit OA, 4KB granule layout) ────────
pub const PTE_ADDR_MASK: u64 = 0x0000_FFFF_FFFF_F000;
pub const BLOCK_L1_ADDR_MASK: u64 = 0x0000_FFFF_C000_0000;
pub const BLOCK_L2_ADDR_MASK: u64 = 0x0000_FFFF_FFE0_0000;

// ── Stage-1 lower attributes (Block/Page descriptors) ────────────────
pub const PTE_ATTR_INDEX_SHIFT: u32 = 2;
pub const PTE_ATTR_INDEX_MASK: u64 = 0x7;
pub const PTE_NS_BIT: u64 = 1 << 5;
pub const PTE_AP_SHIFT: u32 = 6;
pub const PTE_AP_MASK: u64 = 0x3;
pub const PTE_SH_SHIFT: u32 = 8;
pub const PTE_SH_MASK: u64 = 0x3;
pub const PTE_AF_BIT: u64 = 1 << 10;
pub const PTE_NG_BIT: u64 = 1 << 11;

// ── Stage-1 upper attributes ─────────────────────────────────────────
pub const PTE_PXN_BIT: u64 = 1 << 53;
pub const PTE_UXN_BIT: u64 = 1 << 54;

// ── Stage-1 Table descriptor hierarchical controls ───────────────────
pub const PTE_PXN_TABLE_BIT: u64 = 1 << 59;
pub const PTE_UXN_TABLE_BIT: u64 = 1 << 60;
pub const PTE_AP_TABLE_SHIFT: u32 = 61;
pub const PTE_AP_TABLE_MASK: u64 = 0x3;
pub const PTE_NS_TABLE_BIT: u64 = 1 << 63;

// ── Stage-2 attributes (Block/Page descriptors) ──────────────────────
pub const PTE_S2AP_SHIFT: u32 = 6;
pub const PTE_S2AP_MASK: u64 = 0x3;
pub const PTE_S2_XN_BIT: u64 = 1 << 54;

// ── TTBR / VTTBR layout ──────────────────────────────────────────────
pub const TTBR_BADDR_MASK: u64 = 0x0000_FFFF_FFFF_FFFE;
pub const TTBR_ASID_SHIFT: u32 = 48;
pub const TTBR_ASID_MASK: u64 = 0xFFFF;
pub const TTBR_CNP_BIT: u64 = 1 << 0;

// ── Walk geometry ────────────────────────────────────────────────────
pub const DESCRIPTOR_SIZE: u64 = 8;
pub const PAGE_SIZE_4KB: u64 = 4096;
pub const BLOCK_SIZE_2MB: u64 = 2 * 1024 * 1024;
pub const BLOCK_MASK_2MB: u64 = BLOCK_SIZE_2MB - 1;
pub const BLOCK_SIZE_1GB: u64 = 1024 * 1024 * 1024;
pub const BLOCK_MASK_1GB: u64 = BLOCK_SIZE_1GB - 1;
pub const LEVEL_COUNT: usize = 4;
