//! Permission tables: the AP[7:6] grid, execute-never bits, and S2AP.

use ptwalk::fault::AccessType;
use ptwalk::perms::{
    check_stage1_access, check_stage2_access, AccessPermissions, Stage2Permissions,
};

#[test]
fn ap_grid_matches_architecture() {
    // (ap, el1_r, el1_w, el0_r, el0_w)
    let grid = [
        (0b00, true, true, false, false),
        (0b01, true, true, true, true),
        (0b10, true, false, false, false),
        (0b11, true, false, true, false),
    ];
    for (ap, el1_r, el1_w, el0_r, el0_w) in grid {
        let p = AccessPermissions::from_ap_bits(ap, false, false);
        assert_eq!(p.read_el1, el1_r, "AP={:02b}", ap);
        assert_eq!(p.write_el1, el1_w, "AP={:02b}", ap);
        assert_eq!(p.read_el0, el0_r, "AP={:02b}", ap);
        assert_eq!(p.write_el0, el0_w, "AP={:02b}", ap);
    }
}

#[test]
fn execute_follows_uxn_pxn() {
    let p = AccessPermissions::from_ap_bits(0b01, true, false);
    assert!(!p.execute_el0);
    assert!(p.execute_el1);

    let p = AccessPermissions::from_ap_bits(0b01, false, true);
    assert!(p.execute_el0);
    assert!(!p.execute_el1);
}

#[test]
fn allows_maps_access_type_to_flags() {
    let p = AccessPermissions::from_ap_bits(0b11, false, false);
    assert!(p.allows(AccessType::Read, true));
    assert!(!p.allows(AccessType::Write, true));
    assert!(p.allows(AccessType::Read, false));
    assert!(!p.allows(AccessType::Write, false));
    assert!(p.allows(AccessType::Execute, true));
}

#[test]
fn check_stage1_access_agrees_with_expansion() {
    for ap in 0..4u64 {
        for access in [AccessType::Read, AccessType::Write, AccessType::Execute] {
            for is_el0 in [false, true] {
                for uxn in [false, true] {
                    for pxn in [false, true] {
                        let expanded = AccessPermissions::from_ap_bits(ap, uxn, pxn)
                            .allows(access, is_el0);
                        assert_eq!(
                            check_stage1_access(access, ap, uxn, pxn, is_el0),
                            expanded
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn s2ap_grid() {
    let none = Stage2Permissions::from_s2ap_bits(0b00, false);
    assert!(!none.read && !none.write);

    let ro = Stage2Permissions::from_s2ap_bits(0b01, false);
    assert!(ro.read && !ro.write);

    let wo = Stage2Permissions::from_s2ap_bits(0b10, false);
    assert!(!wo.read && wo.write);

    let rw = Stage2Permissions::from_s2ap_bits(0b11, false);
    assert!(rw.read && rw.write);

    assert!(!Stage2Permissions::from_s2ap_bits(0b11, true).execute);
}

#[test]
fn check_stage2_access_consults_xn_only_for_execute() {
    assert!(check_stage2_access(AccessType::Read, 0b01, true));
    assert!(!check_stage2_access(AccessType::Execute, 0b11, true));
    assert!(check_stage2_access(AccessType::Execute, 0b00, false));
    assert!(!check_stage2_access(AccessType::Write, 0b01, false));
}
