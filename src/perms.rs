//! Access permission evaluation.
//!
//! Stage 1 distinguishes EL0 and EL1 through AP[7:6] plus the UXN/PXN
//! execute-never bits:
//!
//! | AP | EL1      | EL0      |
//! |----|----------|----------|
//! | 00 | RW       | none     |
//! | 01 | RW       | RW       |
//! | 10 | RO       | none     |
//! | 11 | RO       | RO       |
//!
//! Stage 2 uses S2AP[1:0] (01 = read, 10 = write, 11 = both) and a single
//! XN bit, with no EL split.

use crate::fault::AccessType;

/// Stage-1 permissions expanded to the six EL0/EL1 booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPermissions {
    pub read_el0: bool,
    pub write_el0: bool,
    pub read_el1: bool,
    pub write_el1: bool,
    pub execute_el0: bool,
    pub execute_el1: bool,
}

impl AccessPermissions {
    /// Expand AP[7:6] plus UXN/PXN into the full permission set.
    pub fn from_ap_bits(ap: u64, uxn: bool, pxn: bool) -> Self {
        let (read_el0, write_el0, write_el1) = match ap & 0x3 {
            0b00 => (false, false, true),
            0b01 => (true, true, true),
            0b10 => (false, false, false),
            _ => (true, false, false),
        };
        Self {
            read_el0,
            write_el0,
            read_el1: true,
            write_el1,
            execute_el0: !uxn,
            execute_el1: !pxn,
        }
    }

    pub fn allows(&self, access: AccessType, is_el0: bool) -> bool {
        match (access, is_el0) {
            (AccessType::Read, true) => self.read_el0,
            (AccessType::Read, false) => self.read_el1,
            (AccessType::Write, true) => self.write_el0,
            (AccessType::Write, false) => self.write_el1,
            (AccessType::Execute, true) => self.execute_el0,
            (AccessType::Execute, false) => self.execute_el1,
        }
    }
}

/// Stage-2 permissions (no EL0/EL1 split).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage2Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Stage2Permissions {
    pub fn from_s2ap_bits(s2ap: u64, xn: bool) -> Self {
        Self {
            read: (s2ap & 0b01) != 0,
            write: (s2ap & 0b10) != 0,
            execute: !xn,
        }
    }
}

/// Whether `access` from the given EL is permitted by a stage-1 leaf with
/// the given AP/UXN/PXN.
pub fn check_stage1_access(
    access: AccessType,
    ap: u64,
    uxn: bool,
    pxn: bool,
    is_el0: bool,
) -> bool {
    AccessPermissions::from_ap_bits(ap, uxn, pxn).allows(access, is_el0)
}

/// Whether `access` is permitted by a stage-2 leaf with the given S2AP/XN.
pub fn check_stage2_access(access: AccessType, s2ap: u64, xn: bool) -> bool {
    let perms = Stage2Permissions::from_s2ap_bits(s2ap, xn);
    match access {
        AccessType::Read => perms.read,
        AccessType::Write => perms.write,
        AccessType::Execute => perms.execute,
    }
}
