//! Two-stage walk orchestrator.
//!
//! Ties the walkers together for one simulated access:
//!
//! 1. Pick TTBR0 or TTBR1 from the VA's upper bits, and the starting level
//!    from TCR_EL1.
//! 2. Run stage 1 (which runs a stage-2 sub-walk per level).
//! 3. On success, run one more stage-2 walk on the resulting IPA.
//!
//! The walkers return their events through the call chain; this module
//! flattens them into the order the bus would see (each level's stage-2
//! prologue ahead of the stage-1 fetch it enables, the final stage-2 walk
//! last) and assigns event IDs 1..N in that flattened order. IDs exist
//! nowhere else, so composed sub-walks can never produce gaps or
//! duplicates.
//!
//! Worst case with a 4KB granule and 48-bit addresses: 4 levels x 5 fetches
//! for stage 1, plus 4 fetches for the final stage-2 walk, 24 descriptor
//! reads to serve a single load. This is the no-TLB cost that makes the
//! walk worth tracing.

use crate::address::{IntermediatePhysicalAddress, VirtualAddress};
use crate::descriptor::{DescriptorKind, MemoryAttributes};
use crate::fault::{AccessType, FaultRecord};
use crate::perms::AccessPermissions;
use crate::regs::RegisterState;
use crate::stage1::{Stage1WalkResult, Stage1Walker};
use crate::stage2::{Stage2WalkResult, Stage2Walker};
use crate::tables::TableStore;

/// Overall outcome of a two-stage walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    Success,
    /// Stage 1 faulted on its own descriptors.
    S1Fault,
    /// A stage-2 sub-walk faulted while locating a stage-1 table.
    S2Fault,
    /// The final IPA → PA walk faulted.
    S2FinalFault,
}

impl WalkStatus {
    pub fn name(&self) -> &'static str {
        match self {
            WalkStatus::Success => "SUCCESS",
            WalkStatus::S1Fault => "S1_FAULT",
            WalkStatus::S2Fault => "S2_FAULT",
            WalkStatus::S2FinalFault => "S2_FINAL_FAULT",
        }
    }
}

/// One entry of the flattened trace. `event_id` is assigned here and is
/// contiguous from 1 across the whole walk.
#[derive(Debug, Clone)]
pub struct WalkEvent {
    pub event_id: u64,
    pub stage: u8,
    pub level: usize,
    /// What this fetch was for, e.g. "S2 for S1 L1 table @ IPA 0x40001000".
    pub purpose: String,
    /// PA the descriptor was read from.
    pub address: u64,
    pub descriptor_value: u64,
    pub result: DescriptorKind,
    pub output: u64,
}

/// Register values captured at a checkpoint of the walk.
#[derive(Debug, Clone)]
pub struct RegisterSnapshot {
    pub point: &'static str,
    pub va: u64,
    pub ipa: Option<u64>,
    pub pa: Option<u64>,
    /// TTBR0/TTBR1/VTTBR raw values, captured on the "start" snapshot only.
    pub table_bases: Option<[u64; 3]>,
}

/// Everything a single walk produced.
#[derive(Debug, Clone)]
pub struct WalkResult {
    pub status: WalkStatus,
    pub input_va: VirtualAddress,
    pub ipa: Option<u64>,
    pub output_pa: Option<u64>,
    pub events: Vec<WalkEvent>,
    pub total_memory_accesses: u64,
    pub fault: Option<FaultRecord>,
    pub final_permissions: Option<AccessPermissions>,
    pub final_attributes: Option<MemoryAttributes>,
    pub register_snapshots: Vec<RegisterSnapshot>,
    /// Detailed per-stage results, kept for nested rendering.
    pub stage1: Option<Stage1WalkResult>,
    pub stage2_final: Option<Stage2WalkResult>,
}

/// Orchestrates stage-1 and stage-2 walks over borrowed register state and
/// table stores. Stateless between calls; `walk` is a pure function of its
/// inputs.
pub struct PageTableWalker<'a> {
    registers: &'a RegisterState,
    stage1_tables: &'a TableStore,
    stage2_tables: &'a TableStore,
}

impl<'a> PageTableWalker<'a> {
    pub fn new(
        registers: &'a RegisterState,
        stage1_tables: &'a TableStore,
        stage2_tables: &'a TableStore,
    ) -> Self {
        Self {
            registers,
            stage1_tables,
            stage2_tables,
        }
    }

    /// Simulate one memory access end to end.
    pub fn walk(&self, va: VirtualAddress, access_type: AccessType, is_el0: bool) -> WalkResult {
        let regs = self.registers;
        let mut snapshots = vec![RegisterSnapshot {
            point: "start",
            va: va.value(),
            ipa: None,
            pa: None,
            table_bases: Some([
                regs.ttbr0_el1.value,
                regs.ttbr1_el1.value,
                regs.vttbr_el2.value,
            ]),
        }];

        let stage2_walker = Stage2Walker::new(
            regs.stage2_table_base(),
            regs.vtcr_el2.starting_level(),
            self.stage2_tables,
        );

        let uses_ttbr1 = va.uses_ttbr1();
        let stage1_walker = Stage1Walker::new(
            regs.stage1_table_base(uses_ttbr1),
            regs.tcr_el1.starting_level(uses_ttbr1),
            self.stage1_tables,
            &stage2_walker,
        );

        let s1 = stage1_walker.walk(&va, access_type, is_el0);

        // Flatten stage-1 events with their stage-2 prologues, assigning IDs
        let mut events: Vec<WalkEvent> = Vec::new();
        for s1_event in &s1.events {
            for s2_event in &s1_event.stage2_prologue {
                let id = events.len() as u64 + 1;
                events.push(WalkEvent {
                    event_id: id,
                    stage: 2,
                    level: s2_event.level,
                    purpose: format!(
                        "S2 for S1 L{} table @ IPA 0x{:X}",
                        s1_event.level, s1_event.table_base_ipa
                    ),
                    address: s2_event.descriptor_pa,
                    descriptor_value: s2_event.descriptor_value,
                    result: s2_event.kind,
                    output: s2_event.output_address,
                });
            }
            let id = events.len() as u64 + 1;
            events.push(WalkEvent {
                event_id: id,
                stage: 1,
                level: s1_event.level,
                purpose: format!("S1 L{} lookup", s1_event.level),
                address: s1_event.descriptor_pa,
                descriptor_value: s1_event.descriptor_value,
                result: s1_event.kind,
                output: s1_event.output_address,
            });
        }

        if let Err(fault) = &s1.outcome {
            let status = if fault.stage == 2 {
                WalkStatus::S2Fault
            } else {
                WalkStatus::S1Fault
            };
            let total = events.len() as u64;
            let fault = fault.clone();
            return WalkResult {
                status,
                input_va: va,
                ipa: None,
                output_pa: None,
                events,
                total_memory_accesses: total,
                fault: Some(fault),
                final_permissions: None,
                final_attributes: None,
                register_snapshots: snapshots,
                stage1: Some(s1),
                stage2_final: None,
            };
        }

        let output = s1.output().expect("stage-1 outcome checked above");
        let ipa = output.ipa;
        let permissions = output.permissions;
        let attributes = output.attributes;

        snapshots.push(RegisterSnapshot {
            point: "after_s1",
            va: va.value(),
            ipa: Some(ipa),
            pa: None,
            table_bases: None,
        });

        // Final stage-2 walk on the IPA stage 1 produced
        let s2_final =
            stage2_walker.walk(IntermediatePhysicalAddress::new(ipa, va.granule()));
        for s2_event in &s2_final.events {
            let id = events.len() as u64 + 1;
            events.push(WalkEvent {
                event_id: id,
                stage: 2,
                level: s2_event.level,
                purpose: format!("Final S2 L{} for IPA 0x{:X}", s2_event.level, ipa),
                address: s2_event.descriptor_pa,
                descriptor_value: s2_event.descriptor_value,
                result: s2_event.kind,
                output: s2_event.output_address,
            });
        }

        let total = events.len() as u64;

        match &s2_final.outcome {
            Err(fault) => {
                let fault = fault.clone();
                WalkResult {
                    status: WalkStatus::S2FinalFault,
                    input_va: va,
                    ipa: Some(ipa),
                    output_pa: None,
                    events,
                    total_memory_accesses: total,
                    fault: Some(fault),
                    final_permissions: Some(permissions),
                    final_attributes: Some(attributes),
                    register_snapshots: snapshots,
                    stage1: Some(s1),
                    stage2_final: Some(s2_final),
                }
            }
            Ok(pa) => {
                let pa = pa.value();
                snapshots.push(RegisterSnapshot {
                    point: "complete",
                    va: va.value(),
                    ipa: Some(ipa),
                    pa: Some(pa),
                    table_bases: None,
                });
                WalkResult {
                    status: WalkStatus::Success,
                    input_va: va,
                    ipa: Some(ipa),
                    output_pa: Some(pa),
                    events,
                    total_memory_accesses: total,
                    fault: None,
                    final_permissions: Some(permissions),
                    final_attributes: Some(attributes),
                    register_snapshots: snapshots,
                    stage1: Some(s1),
                    stage2_final: Some(s2_final),
                }
            }
        }
    }
}
