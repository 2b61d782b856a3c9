//! Fault records for failed translations.
//!
//! Faults are data, not panics: a walker that hits an invalid descriptor or
//! a permission denial returns a `FaultRecord` alongside the partial event
//! trace, and the caller decides how to present it. The record mirrors what
//! hardware would latch: the syndrome class, the stage and level, and the
//! faulting address as it would appear in FAR_EL1 (stage 1, VA) or FAR_EL2
//! (stage 2, IPA).

use core::fmt;

/// The kind of memory access being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
    Execute,
}

impl AccessType {
    pub fn name(&self) -> &'static str {
        match self {
            AccessType::Read => "READ",
            AccessType::Write => "WRITE",
            AccessType::Execute => "EXECUTE",
        }
    }

    pub fn from_name(name: &str) -> Option<AccessType> {
        match name.to_ascii_uppercase().as_str() {
            "READ" => Some(AccessType::Read),
            "WRITE" => Some(AccessType::Write),
            "EXECUTE" => Some(AccessType::Execute),
            _ => None,
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fault classes that can terminate a walk.
///
/// `AddressSize` and `AccessFlag` are part of the taxonomy and serialize
/// like the others, but the current walkers never raise them: output
/// addresses are not checked against the configured PA width, and AF=0 is
/// surfaced in the leaf attributes instead of faulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Translation,
    Permission,
    AddressSize,
    AccessFlag,
}

impl FaultKind {
    pub fn name(&self) -> &'static str {
        match self {
            FaultKind::Translation => "TRANSLATION_FAULT",
            FaultKind::Permission => "PERMISSION_FAULT",
            FaultKind::AddressSize => "ADDRESS_SIZE_FAULT",
            FaultKind::AccessFlag => "ACCESS_FLAG_FAULT",
        }
    }
}

/// Everything needed to reconstruct why a walk stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    pub kind: FaultKind,
    /// Translation stage (1 or 2).
    pub stage: u8,
    /// Table level where the fault was detected (0-3).
    pub level: usize,
    /// The input address that could not be translated.
    pub address: u64,
    pub access_type: Option<AccessType>,
    pub message: String,
    /// Faulting VA, latched for stage-1 faults.
    pub far_el1: Option<u64>,
    /// Faulting IPA, latched for stage-2 faults.
    pub far_el2: Option<u64>,
}

impl FaultRecord {
    /// Translation fault: invalid descriptor during a stage-1 walk.
    pub fn stage1_translation(level: usize, va: u64) -> Self {
        Self {
            kind: FaultKind::Translation,
            stage: 1,
            level,
            address: va,
            access_type: None,
            message: format!("Invalid descriptor at Stage 1 Level {}", level),
            far_el1: Some(va),
            far_el2: None,
        }
    }

    /// Translation fault: invalid descriptor during a stage-2 walk.
    pub fn stage2_translation(level: usize, ipa: u64) -> Self {
        Self {
            kind: FaultKind::Translation,
            stage: 2,
            level,
            address: ipa,
            access_type: None,
            message: format!("Invalid descriptor at Stage 2 Level {}", level),
            far_el1: None,
            far_el2: Some(ipa),
        }
    }

    /// Permission fault on a stage-1 leaf.
    pub fn stage1_permission(
        level: usize,
        va: u64,
        access: AccessType,
        ap: u64,
        uxn: bool,
        pxn: bool,
    ) -> Self {
        Self {
            kind: FaultKind::Permission,
            stage: 1,
            level,
            address: va,
            access_type: Some(access),
            message: format!(
                "{} denied by AP={:02b}, UXN={}, PXN={}",
                access.name(),
                ap,
                uxn,
                pxn
            ),
            far_el1: Some(va),
            far_el2: None,
        }
    }
}

impl fmt::Display for FaultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at Stage {} Level {}: address=0x{:016X} - {}",
            self.kind.name(),
            self.stage,
            self.level,
            self.address,
            self.message
        )
    }
}
