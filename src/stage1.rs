//! Stage-1 walker: VA → IPA.
//!
//! The twist that makes stage 1 expensive under virtualization: every
//! stage-1 table address is an IPA, so the walker cannot read a descriptor
//! until a stage-2 sub-walk has turned that IPA into a PA. Each level
//! therefore costs up to five fetches: four stage-2 reads to locate the
//! table, then the stage-1 read itself. The sub-walk's events are kept on
//! the level's event record as a prologue so the trace can be flattened in
//! hardware order later.
//!
//! Table descriptors can tighten permissions for everything below them
//! (UXNTable/PXNTable/APTable). The limits accumulate monotonically on the
//! way down: once an execute-never limit is seen it sticks, and the APTable
//! limit only widens. The leaf AP itself is what gets checked; the
//! accumulated APTable value is tracked but not folded in (see DESIGN.md).

use crate::address::{descriptor_address, IntermediatePhysicalAddress, VirtualAddress};
use crate::defs::LEVEL_COUNT;
use crate::descriptor::{Descriptor, DescriptorKind, MemoryAttributes};
use crate::fault::{AccessType, FaultRecord};
use crate::perms::AccessPermissions;
use crate::stage2::{Stage2Event, Stage2Walker};
use crate::tables::TableStore;

/// One stage-1 descriptor fetch, with the stage-2 fetches that located its
/// table as a prologue.
#[derive(Debug, Clone)]
pub struct Stage1Event {
    pub level: usize,
    /// IPA of the table this level read from (TTBR base or previous level's
    /// next-table output).
    pub table_base_ipa: u64,
    /// PA of the same table, from the nested stage-2 walk. Zero when the
    /// sub-walk faulted.
    pub table_base_pa: u64,
    pub index: u64,
    pub descriptor_pa: u64,
    pub descriptor_value: u64,
    pub kind: DescriptorKind,
    pub output_address: u64,
    /// Stage-2 fetches that translated `table_base_ipa`, in order.
    pub stage2_prologue: Vec<Stage2Event>,
}

/// Successful stage-1 output: the IPA plus the leaf's effective permissions
/// and attributes.
#[derive(Debug, Clone)]
pub struct Stage1Output {
    pub ipa: u64,
    pub permissions: AccessPermissions,
    pub attributes: MemoryAttributes,
    /// Widest APTable value seen on the path down. Informational: the leaf
    /// AP is authoritative for the permission check.
    pub ap_table_limit: u64,
}

/// Result of a stage-1 walk. On failure the fault may come from stage 1
/// itself (invalid descriptor, permission denial) or from a nested stage-2
/// walk; the fault's `stage` field says which.
#[derive(Debug, Clone)]
pub struct Stage1WalkResult {
    pub input_va: VirtualAddress,
    pub events: Vec<Stage1Event>,
    pub outcome: Result<Stage1Output, FaultRecord>,
}

impl Stage1WalkResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn output(&self) -> Option<&Stage1Output> {
        self.outcome.as_ref().ok()
    }

    pub fn fault(&self) -> Option<&FaultRecord> {
        self.outcome.as_ref().err()
    }
}

/// Walks stage-1 tables rooted at a TTBR base IPA, using a stage-2 walker
/// to locate each table in physical memory.
pub struct Stage1Walker<'a> {
    ttbr_base_ipa: u64,
    starting_level: usize,
    tables: &'a TableStore,
    stage2: &'a Stage2Walker<'a>,
}

impl<'a> Stage1Walker<'a> {
    pub fn new(
        ttbr_base_ipa: u64,
        starting_level: usize,
        tables: &'a TableStore,
        stage2: &'a Stage2Walker<'a>,
    ) -> Self {
        Self {
            ttbr_base_ipa,
            starting_level,
            tables,
            stage2,
        }
    }

    /// Translate one VA, recording every fetch (stage-2 prologues included).
    pub fn walk(
        &self,
        va: &VirtualAddress,
        access_type: AccessType,
        is_el0: bool,
    ) -> Stage1WalkResult {
        let mut events: Vec<Stage1Event> = Vec::new();
        let mut current_table_ipa = self.ttbr_base_ipa;

        // Hierarchical permission limits picked up from table descriptors
        let mut uxn_limit = false;
        let mut pxn_limit = false;
        let mut ap_limit: u64 = 0;

        for level in self.starting_level..LEVEL_COUNT {
            let index = va.index(level);

            // The table lives at an IPA; find its PA first.
            let table_ipa = IntermediatePhysicalAddress::new(current_table_ipa, va.granule());
            let s2 = self.stage2.walk(table_ipa);

            let table_pa = match s2.outcome {
                Ok(pa) => pa.value(),
                Err(fault) => {
                    // Record the level we were about to read so the trace
                    // shows where the walk died, then surface the stage-2
                    // fault unchanged.
                    events.push(Stage1Event {
                        level,
                        table_base_ipa: current_table_ipa,
                        table_base_pa: 0,
                        index,
                        descriptor_pa: 0,
                        descriptor_value: 0,
                        kind: DescriptorKind::Invalid,
                        output_address: 0,
                        stage2_prologue: s2.events,
                    });
                    return Stage1WalkResult {
                        input_va: *va,
                        events,
                        outcome: Err(fault),
                    };
                }
            };

            let descriptor_pa = descriptor_address(table_pa, index);
            let descriptor = Descriptor::new(self.tables.read(descriptor_pa));
            let kind = descriptor.kind(level);

            let mut event = Stage1Event {
                level,
                table_base_ipa: current_table_ipa,
                table_base_pa: table_pa,
                index,
                descriptor_pa,
                descriptor_value: descriptor.raw(),
                kind,
                output_address: 0,
                stage2_prologue: s2.events,
            };

            match kind {
                DescriptorKind::Invalid => {
                    events.push(event);
                    return Stage1WalkResult {
                        input_va: *va,
                        events,
                        outcome: Err(FaultRecord::stage1_translation(level, va.value())),
                    };
                }
                DescriptorKind::Table => {
                    current_table_ipa = descriptor.next_table_address();
                    uxn_limit |= descriptor.uxn_table();
                    pxn_limit |= descriptor.pxn_table();
                    ap_limit = ap_limit.max(descriptor.ap_table());
                    event.output_address = current_table_ipa;
                    events.push(event);
                }
                DescriptorKind::Block | DescriptorKind::Page => {
                    let output_base = descriptor.output_address(level);
                    let ipa = if kind == DescriptorKind::Block {
                        output_base | va.block_offset(level)
                    } else {
                        output_base | va.page_offset()
                    };

                    let final_uxn = descriptor.uxn() || uxn_limit;
                    let final_pxn = descriptor.pxn() || pxn_limit;
                    let final_ap = descriptor.ap();

                    let permissions =
                        AccessPermissions::from_ap_bits(final_ap, final_uxn, final_pxn);

                    if !permissions.allows(access_type, is_el0) {
                        events.push(event);
                        return Stage1WalkResult {
                            input_va: *va,
                            events,
                            outcome: Err(FaultRecord::stage1_permission(
                                level,
                                va.value(),
                                access_type,
                                final_ap,
                                final_uxn,
                                final_pxn,
                            )),
                        };
                    }

                    event.output_address = output_base;
                    events.push(event);
                    return Stage1WalkResult {
                        input_va: *va,
                        events,
                        outcome: Ok(Stage1Output {
                            ipa,
                            permissions,
                            attributes: descriptor.leaf_attributes(),
                            ap_table_limit: ap_limit,
                        }),
                    };
                }
            }
        }

        // Unreachable with well-formed levels: L3 never classifies as Table.
        Stage1WalkResult {
            input_va: *va,
            events,
            outcome: Err(FaultRecord::stage1_translation(3, va.value())),
        }
    }
}
