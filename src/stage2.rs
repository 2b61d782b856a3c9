//! Stage-2 walker: IPA → PA.
//!
//! Stage-2 tables live in real physical memory, so this walk is flat: each
//! level is a direct read from the stage-2 table store, no nested
//! translation. The walk starts at the level selected by VTCR_EL2.SL0 and
//! descends until it finds a leaf, an invalid descriptor, or runs past L3.

use crate::address::{descriptor_address, IntermediatePhysicalAddress, PhysicalAddress};
use crate::defs::LEVEL_COUNT;
use crate::descriptor::{Descriptor, DescriptorKind};
use crate::fault::FaultRecord;
use crate::tables::TableStore;

/// One descriptor fetch performed by a stage-2 walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage2Event {
    pub level: usize,
    /// PA of the table this level's descriptor was read from.
    pub table_base_pa: u64,
    pub index: u64,
    pub descriptor_pa: u64,
    pub descriptor_value: u64,
    pub kind: DescriptorKind,
    /// Next table PA for Table descriptors, leaf base for Block/Page,
    /// zero for Invalid.
    pub output_address: u64,
}

/// Outcome of a stage-2 walk: the final PA, or the fault that stopped it.
/// The event list covers every fetch up to and including the faulting one.
#[derive(Debug, Clone)]
pub struct Stage2WalkResult {
    pub input_ipa: u64,
    pub events: Vec<Stage2Event>,
    pub outcome: Result<PhysicalAddress, FaultRecord>,
}

impl Stage2WalkResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn output_pa(&self) -> Option<u64> {
        self.outcome.as_ref().ok().map(PhysicalAddress::value)
    }

    pub fn fault(&self) -> Option<&FaultRecord> {
        self.outcome.as_ref().err()
    }
}

/// Walks stage-2 tables rooted at the VTTBR_EL2 base.
///
/// Holds only borrowed state; one instance serves every stage-2 sub-walk of
/// a translation, including the final IPA → PA pass.
pub struct Stage2Walker<'a> {
    vttbr_base: u64,
    starting_level: usize,
    tables: &'a TableStore,
}

impl<'a> Stage2Walker<'a> {
    pub fn new(vttbr_base: u64, starting_level: usize, tables: &'a TableStore) -> Self {
        Self {
            vttbr_base,
            starting_level,
            tables,
        }
    }

    /// Translate one IPA, recording every descriptor fetch.
    pub fn walk(&self, ipa: IntermediatePhysicalAddress) -> Stage2WalkResult {
        let mut events = Vec::new();
        let mut current_table_pa = self.vttbr_base;

        for level in self.starting_level..LEVEL_COUNT {
            let index = ipa.index(level);
            let descriptor_pa = descriptor_address(current_table_pa, index);
            let descriptor = Descriptor::new(self.tables.read(descriptor_pa));
            let kind = descriptor.kind(level);

            match kind {
                DescriptorKind::Invalid => {
                    events.push(Stage2Event {
                        level,
                        table_base_pa: current_table_pa,
                        index,
                        descriptor_pa,
                        descriptor_value: descriptor.raw(),
                        kind,
                        output_address: 0,
                    });
                    return Stage2WalkResult {
                        input_ipa: ipa.value(),
                        events,
                        outcome: Err(FaultRecord::stage2_translation(level, ipa.value())),
                    };
                }
                DescriptorKind::Table => {
                    let next = descriptor.next_table_address();
                    events.push(Stage2Event {
                        level,
                        table_base_pa: current_table_pa,
                        index,
                        descriptor_pa,
                        descriptor_value: descriptor.raw(),
                        kind,
                        output_address: next,
                    });
                    current_table_pa = next;
                }
                DescriptorKind::Block | DescriptorKind::Page => {
                    let output_base = descriptor.output_address(level);
                    let pa = if kind == DescriptorKind::Block {
                        output_base | ipa.block_offset(level)
                    } else {
                        output_base | ipa.page_offset()
                    };
                    events.push(Stage2Event {
                        level,
                        table_base_pa: current_table_pa,
                        index,
                        descriptor_pa,
                        descriptor_value: descriptor.raw(),
                        kind,
                        output_address: output_base,
                    });
                    return Stage2WalkResult {
                        input_ipa: ipa.value(),
                        events,
                        outcome: Ok(PhysicalAddress(pa)),
                    };
                }
            }
        }

        // L3 always classifies as Page or Invalid, so the loop cannot fall
        // through with well-formed levels; keep the fault for completeness.
        Stage2WalkResult {
            input_ipa: ipa.value(),
            events,
            outcome: Err(FaultRecord::stage2_translation(3, ipa.value())),
        }
    }
}
