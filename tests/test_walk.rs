//! End-to-end walk tests on the success paths.

mod common;

use common::*;
use ptwalk::address::VirtualAddress;
use ptwalk::defs::{PTE_AP_TABLE_SHIFT, PTE_UXN_TABLE_BIT};
use ptwalk::descriptor::DescriptorKind;
use ptwalk::fault::AccessType;
use ptwalk::granule::Granule;
use ptwalk::regs::Vtcr;
use ptwalk::walker::{PageTableWalker, WalkResult, WalkStatus};

fn va48(value: u64) -> VirtualAddress {
    VirtualAddress::new(value, 48, Granule::Kb4)
}

fn assert_event_ids_contiguous(result: &WalkResult) {
    for (i, event) in result.events.iter().enumerate() {
        assert_eq!(event.event_id, i as u64 + 1, "event IDs must be 1..N");
    }
}

#[test]
fn four_level_two_stage_read_succeeds() {
    let s1 = stage1_chain(0b01, false, false);
    let s2 = stage2_identity_for(&s1);
    let regs = registers();
    let walker = PageTableWalker::new(&regs, &s1.store, &s2.store);

    let result = walker.walk(va48(VA_PAGE), AccessType::Read, true);

    assert_eq!(result.status, WalkStatus::Success);
    assert_eq!(result.ipa, Some(0x5000_1030));
    assert_eq!(result.output_pa, Some(0x5000_1030));
    assert_eq!(result.total_memory_accesses, 24);
    assert_eq!(result.events.len(), 24);
    assert!(result.fault.is_none());
    assert_event_ids_contiguous(&result);

    // Each stage-1 level is preceded by its four stage-2 lookups
    for level in 0..4 {
        let group = &result.events[level * 5..level * 5 + 5];
        for (i, event) in group[..4].iter().enumerate() {
            assert_eq!(event.stage, 2);
            assert_eq!(event.level, i);
        }
        assert_eq!(group[4].stage, 1);
        assert_eq!(group[4].level, level);
        assert_eq!(group[4].purpose, format!("S1 L{} lookup", level));
    }

    // First stage-1 fetch reads the TTBR0 root directly
    assert_eq!(result.events[4].address, TTBR0_ROOT);
    assert_eq!(result.events[4].result, DescriptorKind::Table);
    assert_eq!(result.events[4].output, 0x4000_1000);

    // The leaf
    assert_eq!(result.events[19].result, DescriptorKind::Page);
    assert_eq!(result.events[19].output, IPA_LEAF_PAGE);

    // Final stage-2 walk comes last and carries the IPA in its purpose
    for (i, event) in result.events[20..24].iter().enumerate() {
        assert_eq!(event.stage, 2);
        assert_eq!(event.level, i);
        assert_eq!(event.purpose, format!("Final S2 L{} for IPA 0x50001030", i));
    }

    let perms = result.final_permissions.expect("leaf permissions");
    assert!(perms.read_el0 && perms.write_el0 && perms.read_el1 && perms.write_el1);
    assert!(perms.execute_el0 && perms.execute_el1);

    let attrs = result.final_attributes.expect("leaf attributes");
    assert!(attrs.access_flag);

    let points: Vec<_> = result
        .register_snapshots
        .iter()
        .map(|s| s.point)
        .collect();
    assert_eq!(points, ["start", "after_s1", "complete"]);
    assert_eq!(result.register_snapshots[1].ipa, Some(0x5000_1030));
    assert_eq!(result.register_snapshots[2].pa, Some(0x5000_1030));
}

#[test]
fn stage2_prologue_purposes_name_the_table_ipa() {
    let s1 = stage1_chain(0b01, false, false);
    let s2 = stage2_identity_for(&s1);
    let regs = registers();
    let walker = PageTableWalker::new(&regs, &s1.store, &s2.store);

    let result = walker.walk(va48(VA_PAGE), AccessType::Read, true);

    assert_eq!(result.events[0].purpose, "S2 for S1 L0 table @ IPA 0x40000000");
    assert_eq!(result.events[5].purpose, "S2 for S1 L1 table @ IPA 0x40001000");
    assert_eq!(result.events[10].purpose, "S2 for S1 L2 table @ IPA 0x40002000");
    assert_eq!(result.events[15].purpose, "S2 for S1 L3 table @ IPA 0x40003000");
}

#[test]
fn l2_block_unions_block_offset() {
    // VA indices 0/1/1 with a 2MB block at L2; block offset 0x15030
    let va = 0x0000_0000_4021_5030;
    let mut s1 = Stage1Builder::new(TTBR0_ROOT);
    s1.map_block_l2(va, 0x8000_0000, 0b01);

    let mut s2 = Stage2Builder::new(VTTBR_ROOT);
    for addr in s1.table_addresses() {
        s2.map_identity(addr);
    }
    // Cover the 2MB block's whole output range with a 1GB stage-2 block
    s2.map_block_l1(0x8000_0000, 0x8000_0000);

    let regs = registers();
    let walker = PageTableWalker::new(&regs, &s1.store, &s2.store);
    let result = walker.walk(va48(va), AccessType::Read, true);

    assert_eq!(result.status, WalkStatus::Success);
    assert_eq!(result.ipa, Some(0x8001_5030));
    assert_eq!(result.output_pa, Some(0x8001_5030));

    // Three stage-1 levels (L2 leaf), then a two-level final stage-2 walk
    assert_eq!(result.total_memory_accesses, 17);
    let leaf = &result.events[14];
    assert_eq!(leaf.stage, 1);
    assert_eq!(leaf.level, 2);
    assert_eq!(leaf.result, DescriptorKind::Block);
    assert_eq!(leaf.output, 0x8000_0000);
    let final_leaf = result.events.last().unwrap();
    assert_eq!(final_leaf.result, DescriptorKind::Block);
    assert_eq!(final_leaf.level, 1);
    assert_event_ids_contiguous(&result);
}

#[test]
fn upper_region_va_selects_ttbr1() {
    let va = 0xFFFF_FF80_0000_1000;
    let s1 = Stage1Builder::new(TTBR1_ROOT);
    let mut s2 = Stage2Builder::new(VTTBR_ROOT);
    s2.map_identity(TTBR1_ROOT);

    let regs = registers();
    let walker = PageTableWalker::new(&regs, &s1.store, &s2.store);
    let result = walker.walk(va48(va), AccessType::Read, false);

    // The L0 fetch must come from TTBR1's table, at index 0x1FF
    let l0_event = &result.events[4];
    assert_eq!(l0_event.stage, 1);
    assert_eq!(l0_event.level, 0);
    assert_eq!(l0_event.address, TTBR1_ROOT + 8 * 0x1FF);

    // Nothing is mapped there, so the walk faults at stage-1 L0
    assert_eq!(result.status, WalkStatus::S1Fault);
    assert_eq!(result.total_memory_accesses, 5);
}

#[test]
fn stage2_starting_level_follows_sl0() {
    let s1 = stage1_chain(0b01, false, false);
    let s2 = stage2_identity_for(&s1);

    let mut regs = registers();
    regs.vtcr_el2 = Vtcr::new(16, 1);

    // Rebase stage-2 so its L1 table is the starting table: with SL0=1 the
    // walker starts at L1, and the builder's root-level entry 0 points at
    // the L1 table it allocated first.
    let l1_table = 0x1_0000_1000;
    regs.vttbr_el2 = ptwalk::regs::Ttbr::new(l1_table, "VTTBR_EL2");

    let walker = PageTableWalker::new(&regs, &s1.store, &s2.store);
    let result = walker.walk(va48(VA_PAGE), AccessType::Read, true);

    assert_eq!(result.status, WalkStatus::Success);
    // Three stage-2 fetches per sub-walk instead of four
    assert_eq!(result.total_memory_accesses, 4 * 4 + 3);
    assert_eq!(result.events[0].level, 1);
    assert_event_ids_contiguous(&result);
}

#[test]
fn uxn_table_limit_masks_el0_execute() {
    let mut s1 = stage1_chain(0b01, false, false);
    // The L0 table descriptor forbids EL0 execution for the whole subtree
    s1.set_table_bits(VA_PAGE, 0, PTE_UXN_TABLE_BIT);
    let s2 = stage2_identity_for(&s1);

    let regs = registers();
    let walker = PageTableWalker::new(&regs, &s1.store, &s2.store);
    let result = walker.walk(va48(VA_PAGE), AccessType::Read, true);

    assert_eq!(result.status, WalkStatus::Success);
    let perms = result.final_permissions.unwrap();
    assert!(!perms.execute_el0, "UXNTable limit must stick to the leaf");
    assert!(perms.execute_el1);
}

#[test]
fn ap_table_limit_is_tracked_but_leaf_ap_decides() {
    let mut s1 = stage1_chain(0b01, false, false);
    // APTable=0b10 would forbid EL0 access if it were combined
    s1.set_table_bits(VA_PAGE, 0, 0b10 << PTE_AP_TABLE_SHIFT);
    let s2 = stage2_identity_for(&s1);

    let regs = registers();
    let walker = PageTableWalker::new(&regs, &s1.store, &s2.store);
    let result = walker.walk(va48(VA_PAGE), AccessType::Write, true);

    // Leaf AP=01 grants EL0 write; the APTable limit is informational
    assert_eq!(result.status, WalkStatus::Success);
    let s1_result = result.stage1.as_ref().unwrap();
    assert_eq!(s1_result.output().unwrap().ap_table_limit, 0b10);
}

#[test]
fn el0_execute_denied_by_uxn_leaf() {
    let s1 = stage1_chain(0b01, true, false);
    let s2 = stage2_identity_for(&s1);
    let regs = registers();
    let walker = PageTableWalker::new(&regs, &s1.store, &s2.store);

    let result = walker.walk(va48(VA_PAGE), AccessType::Execute, true);
    assert_eq!(result.status, WalkStatus::S1Fault);
    let fault = result.fault.unwrap();
    assert_eq!(fault.kind, ptwalk::fault::FaultKind::Permission);
    assert_eq!(fault.access_type, Some(AccessType::Execute));

    // EL1 execute is still fine
    let result = walker.walk(va48(VA_PAGE), AccessType::Execute, false);
    assert_eq!(result.status, WalkStatus::Success);
}
