//! Typed addresses for the three translation domains.
//!
//! VA, IPA, and PA are all 64-bit quantities but live in different address
//! spaces: a VA enters stage 1, the resulting IPA enters stage 2, and the PA
//! is what the bus would see. Keeping them as distinct types stops a walker
//! from feeding an untranslated address into the wrong stage.

use crate::defs::DESCRIPTOR_SIZE;
use crate::granule::Granule;

/// Virtual address, input to stage-1 translation.
///
/// Carries the configured VA width and granule so index slicing and the
/// TTBR0/TTBR1 split do not need extra context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    value: u64,
    va_bits: u32,
    granule: Granule,
}

impl VirtualAddress {
    pub fn new(value: u64, va_bits: u32, granule: Granule) -> Self {
        Self {
            value,
            va_bits,
            granule,
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn va_bits(&self) -> u32 {
        self.va_bits
    }

    pub fn granule(&self) -> Granule {
        self.granule
    }

    /// Table index at the given level.
    pub fn index(&self, level: usize) -> u64 {
        self.granule.config().index(self.value, level)
    }

    pub fn page_offset(&self) -> u64 {
        self.granule.config().page_offset(self.value)
    }

    pub fn block_offset(&self, level: usize) -> u64 {
        self.granule.config().block_offset(self.value, level)
    }

    /// True when the upper `64 - va_bits` bits are all set, selecting the
    /// TTBR1 (upper) region.
    pub fn uses_ttbr1(&self) -> bool {
        if self.va_bits >= 64 {
            return false;
        }
        let upper = self.value >> self.va_bits;
        upper == (1u64 << (64 - self.va_bits)) - 1
    }

    /// True when the upper bits are all-zero or all-one. Anything else is a
    /// malformed scenario, rejected before a walk starts.
    pub fn is_canonical(&self) -> bool {
        if self.va_bits >= 64 {
            return true;
        }
        let upper = self.value >> self.va_bits;
        upper == 0 || upper == (1u64 << (64 - self.va_bits)) - 1
    }

    pub fn to_hex(&self) -> String {
        format!("0x{:016X}", self.value)
    }
}

/// Intermediate physical address, stage-1 output and stage-2 input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntermediatePhysicalAddress {
    value: u64,
    granule: Granule,
}

impl IntermediatePhysicalAddress {
    pub fn new(value: u64, granule: Granule) -> Self {
        Self { value, granule }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn index(&self, level: usize) -> u64 {
        self.granule.config().index(self.value, level)
    }

    pub fn page_offset(&self) -> u64 {
        self.granule.config().page_offset(self.value)
    }

    pub fn block_offset(&self, level: usize) -> u64 {
        self.granule.config().block_offset(self.value, level)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{:016X}", self.value)
    }
}

/// Physical address, final stage-2 output.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalAddress(pub u64);

impl PhysicalAddress {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{:016X}", self.0)
    }
}

/// Physical address of the descriptor at `index` in the table at
/// `table_base`. Descriptors are 8 bytes wide.
pub fn descriptor_address(table_base: u64, index: u64) -> u64 {
    table_base + index * DESCRIPTOR_SIZE
}
