//! Translation table descriptor model.
//!
//! A descriptor is one 64-bit word in a translation table. Its meaning
//! depends on the level it was fetched from:
//!
//! - bit[0] = 0            → Invalid (translation fault on use)
//! - bits[1:0] = 01        → Block (levels 1 and 2 only)
//! - bits[1:0] = 11, L < 3 → Table (points at the next-level table)
//! - bits[1:0] = 11, L = 3 → Page
//!
//! Any other combination (a block encoding at L0/L3, for instance) is
//! treated as Invalid. The 128-bit descriptor format is accepted as a
//! configuration flag upstream but decoding here is always 64-bit.

use crate::defs::*;

/// Classification of a descriptor at a specific level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Invalid,
    Table,
    Block,
    Page,
}

impl DescriptorKind {
    pub fn name(&self) -> &'static str {
        match self {
            DescriptorKind::Invalid => "INVALID",
            DescriptorKind::Table => "TABLE",
            DescriptorKind::Block => "BLOCK",
            DescriptorKind::Page => "PAGE",
        }
    }

    /// True for the leaf kinds that terminate a walk with an output address.
    pub fn is_leaf(&self) -> bool {
        matches!(self, DescriptorKind::Block | DescriptorKind::Page)
    }
}

/// Raw 64-bit translation table descriptor.
///
/// All field accessors are bit slices of the stored word; nothing is cached.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor(u64);

impl Descriptor {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Build a table descriptor pointing at the next-level table.
    pub const fn table(next_table_addr: u64) -> Self {
        Self((next_table_addr & PTE_ADDR_MASK) | PTE_VALID | PTE_TABLE)
    }

    /// Build a stage-1 page descriptor (level 3 leaf).
    pub const fn page(output_addr: u64, ap: u64, uxn: bool, pxn: bool) -> Self {
        let mut value = (output_addr & PTE_ADDR_MASK)
            | ((ap & PTE_AP_MASK) << PTE_AP_SHIFT)
            | (0b11 << PTE_SH_SHIFT) // Inner shareable
            | PTE_AF_BIT
            | PTE_VALID
            | PTE_TABLE;
        if uxn {
            value |= PTE_UXN_BIT;
        }
        if pxn {
            value |= PTE_PXN_BIT;
        }
        Self(value)
    }

    /// Build a stage-1 block descriptor (level 1 or 2 leaf).
    pub const fn block(output_addr: u64, ap: u64) -> Self {
        Self(
            output_addr
                | ((ap & PTE_AP_MASK) << PTE_AP_SHIFT)
                | (0b11 << PTE_SH_SHIFT)
                | PTE_AF_BIT
                | PTE_VALID,
        )
    }

    /// Build a stage-2 page descriptor: Normal memory, inner shareable,
    /// AF set, with the given S2AP bits.
    pub const fn stage2_page(output_addr: u64, s2ap: u64) -> Self {
        Self(
            (output_addr & PTE_ADDR_MASK)
                | (0b1111 << 2) // MemAttr: Normal, write-back
                | ((s2ap & PTE_S2AP_MASK) << PTE_S2AP_SHIFT)
                | (0b11 << PTE_SH_SHIFT)
                | PTE_AF_BIT
                | PTE_VALID
                | PTE_TABLE,
        )
    }

    /// Build a stage-2 block descriptor (level 1 or 2 leaf).
    pub const fn stage2_block(output_addr: u64, s2ap: u64) -> Self {
        Self(
            output_addr
                | (0b1111 << 2)
                | ((s2ap & PTE_S2AP_MASK) << PTE_S2AP_SHIFT)
                | (0b11 << PTE_SH_SHIFT)
                | PTE_AF_BIT
                | PTE_VALID,
        )
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        (self.0 & PTE_VALID) != 0
    }

    /// Classify this descriptor as fetched from `level`.
    pub fn kind(&self, level: usize) -> DescriptorKind {
        if !self.is_valid() {
            return DescriptorKind::Invalid;
        }
        let table_bit = (self.0 & PTE_TABLE) != 0;
        match (table_bit, level) {
            (true, 3) => DescriptorKind::Page,
            (true, _) => DescriptorKind::Table,
            (false, 1) | (false, 2) => DescriptorKind::Block,
            // Block encoding at L0 or L3 has no meaning
            (false, _) => DescriptorKind::Invalid,
        }
    }

    /// Next-level table address from a Table descriptor.
    pub fn next_table_address(&self) -> u64 {
        self.0 & PTE_ADDR_MASK
    }

    /// Output address of a leaf at `level`.
    ///
    /// Blocks keep fewer address bits than pages: bits [47:30] at L1 and
    /// [47:21] at L2 (4KB granule layout).
    pub fn output_address(&self, level: usize) -> u64 {
        match (self.kind(level), level) {
            (DescriptorKind::Block, 1) => self.0 & BLOCK_L1_ADDR_MASK,
            (DescriptorKind::Block, 2) => self.0 & BLOCK_L2_ADDR_MASK,
            _ => self.0 & PTE_ADDR_MASK,
        }
    }

    // ── Leaf attributes (stage 1) ────────────────────────────────────

    pub fn af(&self) -> bool {
        (self.0 & PTE_AF_BIT) != 0
    }

    pub fn sh(&self) -> u64 {
        (self.0 >> PTE_SH_SHIFT) & PTE_SH_MASK
    }

    pub fn ap(&self) -> u64 {
        (self.0 >> PTE_AP_SHIFT) & PTE_AP_MASK
    }

    pub fn ns(&self) -> bool {
        (self.0 & PTE_NS_BIT) != 0
    }

    pub fn attr_index(&self) -> u64 {
        (self.0 >> PTE_ATTR_INDEX_SHIFT) & PTE_ATTR_INDEX_MASK
    }

    pub fn ng(&self) -> bool {
        (self.0 & PTE_NG_BIT) != 0
    }

    pub fn uxn(&self) -> bool {
        (self.0 & PTE_UXN_BIT) != 0
    }

    pub fn pxn(&self) -> bool {
        (self.0 & PTE_PXN_BIT) != 0
    }

    // ── Table descriptor hierarchical controls (stage 1) ─────────────

    pub fn ap_table(&self) -> u64 {
        (self.0 >> PTE_AP_TABLE_SHIFT) & PTE_AP_TABLE_MASK
    }

    pub fn uxn_table(&self) -> bool {
        (self.0 & PTE_UXN_TABLE_BIT) != 0
    }

    pub fn pxn_table(&self) -> bool {
        (self.0 & PTE_PXN_TABLE_BIT) != 0
    }

    pub fn ns_table(&self) -> bool {
        (self.0 & PTE_NS_TABLE_BIT) != 0
    }

    // ── Stage-2 attributes ───────────────────────────────────────────

    pub fn s2ap(&self) -> u64 {
        (self.0 >> PTE_S2AP_SHIFT) & PTE_S2AP_MASK
    }

    pub fn s2_xn(&self) -> bool {
        (self.0 & PTE_S2_XN_BIT) != 0
    }

    /// Memory attributes of a stage-1 leaf, for surfacing in results.
    pub fn leaf_attributes(&self) -> MemoryAttributes {
        MemoryAttributes {
            shareability: Shareability::from_bits(self.sh()),
            attr_index: self.attr_index() as u8,
            access_flag: self.af(),
            not_global: self.ng(),
            non_secure: self.ns(),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("0x{:016X}", self.0)
    }
}

/// Memory shareability domain (SH bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shareability {
    NonShareable,
    Reserved,
    OuterShareable,
    InnerShareable,
}

impl Shareability {
    pub fn from_bits(sh: u64) -> Self {
        match sh & 0x3 {
            0b00 => Shareability::NonShareable,
            0b01 => Shareability::Reserved,
            0b10 => Shareability::OuterShareable,
            _ => Shareability::InnerShareable,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shareability::NonShareable => "NON_SHAREABLE",
            Shareability::Reserved => "RESERVED",
            Shareability::OuterShareable => "OUTER_SHAREABLE",
            Shareability::InnerShareable => "INNER_SHAREABLE",
        }
    }
}

/// Attributes carried by a stage-1 leaf descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAttributes {
    pub shareability: Shareability,
    /// Index into MAIR_EL1 (the MAIR contents themselves are not modeled).
    pub attr_index: u8,
    pub access_flag: bool,
    pub not_global: bool,
    pub non_secure: bool,
}
