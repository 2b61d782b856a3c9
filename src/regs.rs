//! Translation control register models.
//!
//! Only the fields that steer a walk are modeled: table base addresses
//! (TTBR0_EL1 / TTBR1_EL1 / VTTBR_EL2), input address sizes (TCR_EL1.TxSZ,
//! VTCR_EL2.T0SZ), and the stage-2 starting level (VTCR_EL2.SL0). Cache and
//! shareability hints for the walk itself do not change its outcome and are
//! left out.

use crate::defs::{TTBR_ASID_MASK, TTBR_ASID_SHIFT, TTBR_BADDR_MASK, TTBR_CNP_BIT};

/// Translation Table Base Register (TTBR0_EL1, TTBR1_EL1, or VTTBR_EL2).
///
/// Layout: bits [63:48] ASID (VMID for VTTBR), bits [47:1] table base
/// address, bit [0] CnP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ttbr {
    pub value: u64,
    pub name: &'static str,
}

impl Ttbr {
    pub fn new(value: u64, name: &'static str) -> Self {
        Self { value, name }
    }

    pub fn asid(&self) -> u64 {
        (self.value >> TTBR_ASID_SHIFT) & TTBR_ASID_MASK
    }

    /// Base address of the starting-level translation table.
    pub fn baddr(&self) -> u64 {
        self.value & TTBR_BADDR_MASK
    }

    pub fn cnp(&self) -> bool {
        (self.value & TTBR_CNP_BIT) != 0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{:016X}", self.value)
    }
}

/// TCR_EL1, stage-1 translation control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tcr {
    /// Size offset for the TTBR0 region; VA bits = 64 - T0SZ.
    pub t0sz: u32,
    /// Size offset for the TTBR1 region.
    pub t1sz: u32,
}

impl Tcr {
    pub fn new(t0sz: u32, t1sz: u32) -> Self {
        Self { t0sz, t1sz }
    }

    pub fn va_bits_t0(&self) -> u32 {
        64 - self.t0sz
    }

    pub fn va_bits_t1(&self) -> u32 {
        64 - self.t1sz
    }

    pub fn va_bits(&self, for_ttbr1: bool) -> u32 {
        if for_ttbr1 {
            self.va_bits_t1()
        } else {
            self.va_bits_t0()
        }
    }

    /// First level of the stage-1 walk for the selected region.
    ///
    /// 4KB granule rule: a VA of 40+ bits needs all four levels (start at
    /// L0); 31-39 bits start at L1; 30 or fewer start at L2.
    pub fn starting_level(&self, for_ttbr1: bool) -> usize {
        let va_bits = self.va_bits(for_ttbr1);
        if va_bits >= 40 {
            0
        } else if va_bits >= 31 {
            1
        } else {
            2
        }
    }
}

impl Default for Tcr {
    fn default() -> Self {
        // 48-bit VA on both halves
        Self { t0sz: 16, t1sz: 16 }
    }
}

/// VTCR_EL2, stage-2 translation control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vtcr {
    /// Size offset for the IPA space; IPA bits = 64 - T0SZ.
    pub t0sz: u32,
    /// Starting level of the stage-2 walk.
    pub sl0: u32,
}

impl Vtcr {
    pub fn new(t0sz: u32, sl0: u32) -> Self {
        Self { t0sz, sl0 }
    }

    pub fn ipa_bits(&self) -> u32 {
        64 - self.t0sz
    }

    pub fn starting_level(&self) -> usize {
        self.sl0 as usize
    }
}

impl Default for Vtcr {
    fn default() -> Self {
        Self { t0sz: 16, sl0: 0 }
    }
}

/// Complete register state consumed by one walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterState {
    pub ttbr0_el1: Ttbr,
    pub ttbr1_el1: Ttbr,
    pub vttbr_el2: Ttbr,
    pub tcr_el1: Tcr,
    pub vtcr_el2: Vtcr,
}

impl RegisterState {
    /// Stage-1 table base for the VA half selected by `uses_ttbr1`.
    ///
    /// In a two-stage regime this base is itself an IPA.
    pub fn stage1_table_base(&self, uses_ttbr1: bool) -> u64 {
        if uses_ttbr1 {
            self.ttbr1_el1.baddr()
        } else {
            self.ttbr0_el1.baddr()
        }
    }

    /// Stage-2 table base (a real PA) from VTTBR_EL2.
    pub fn stage2_table_base(&self) -> u64 {
        self.vttbr_el2.baddr()
    }
}
