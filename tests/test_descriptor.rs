//! Descriptor classification and field extraction.

use ptwalk::defs::*;
use ptwalk::descriptor::{Descriptor, DescriptorKind, Shareability};

#[test]
fn classification_follows_low_bits_and_level() {
    // bit[0] clear is invalid everywhere, whatever the rest says
    for level in 0..4 {
        assert_eq!(
            Descriptor::new(0xFFFF_FFFF_FFFF_FFFE).kind(level),
            DescriptorKind::Invalid
        );
        assert_eq!(Descriptor::new(0).kind(level), DescriptorKind::Invalid);
    }

    let table_bits = Descriptor::new(0x4000_1000 | 0b11);
    assert_eq!(table_bits.kind(0), DescriptorKind::Table);
    assert_eq!(table_bits.kind(1), DescriptorKind::Table);
    assert_eq!(table_bits.kind(2), DescriptorKind::Table);
    assert_eq!(table_bits.kind(3), DescriptorKind::Page);

    let block_bits = Descriptor::new(0x8000_0000 | 0b01);
    assert_eq!(block_bits.kind(0), DescriptorKind::Invalid);
    assert_eq!(block_bits.kind(1), DescriptorKind::Block);
    assert_eq!(block_bits.kind(2), DescriptorKind::Block);
    assert_eq!(block_bits.kind(3), DescriptorKind::Invalid);
}

#[test]
fn exactly_one_kind_per_word_and_level() {
    let samples = [
        0u64,
        0b01,
        0b10,
        0b11,
        0x4000_0000 | 0b01,
        0x4000_0000 | 0b11,
        u64::MAX,
        u64::MAX - 1,
    ];
    for value in samples {
        for level in 0..4 {
            let d = Descriptor::new(value);
            let kinds = [
                d.kind(level) == DescriptorKind::Invalid,
                d.kind(level) == DescriptorKind::Table,
                d.kind(level) == DescriptorKind::Block,
                d.kind(level) == DescriptorKind::Page,
            ];
            assert_eq!(kinds.iter().filter(|k| **k).count(), 1);
        }
    }
}

#[test]
fn table_descriptor_masks_address_bits() {
    let d = Descriptor::table(0xFFFF_FFFF_FFFF_FFFF);
    assert_eq!(d.next_table_address(), 0x0000_FFFF_FFFF_F000);
    assert!(d.is_valid());
    assert_eq!(d.kind(0), DescriptorKind::Table);
}

#[test]
fn block_output_addresses_are_level_dependent() {
    let raw = 0x0000_0000_DEAD_F000 | 0b01;
    let d = Descriptor::new(raw);
    // L1 keeps bits [47:30] only
    assert_eq!(d.output_address(1), 0x0000_0000_C000_0000);
    // L2 keeps bits [47:21]
    assert_eq!(d.output_address(2), 0x0000_0000_DEA0_0000);

    let page = Descriptor::page(0x5000_1000, 0b01, false, false);
    assert_eq!(page.output_address(3), 0x5000_1000);
}

#[test]
fn stage1_leaf_fields_decode() {
    let value = 0x5000_1000u64
        | (1 << 54) // UXN
        | (1 << 53) // PXN
        | (1 << 11) // nG
        | (1 << 10) // AF
        | (0b10 << 8) // SH
        | (0b11 << 6) // AP
        | (1 << 5) // NS
        | (0b101 << 2) // AttrIndx
        | 0b11;
    let d = Descriptor::new(value);
    assert!(d.uxn());
    assert!(d.pxn());
    assert!(d.ng());
    assert!(d.af());
    assert_eq!(d.sh(), 0b10);
    assert_eq!(d.ap(), 0b11);
    assert!(d.ns());
    assert_eq!(d.attr_index(), 0b101);

    let attrs = d.leaf_attributes();
    assert_eq!(attrs.shareability, Shareability::OuterShareable);
    assert_eq!(attrs.attr_index, 5);
    assert!(attrs.access_flag);
    assert!(attrs.not_global);
    assert!(attrs.non_secure);
}

#[test]
fn table_hierarchical_controls_decode() {
    let value = 0x4000_1000u64
        | (1 << 63) // NSTable
        | (0b10 << 61) // APTable
        | (1 << 60) // UXNTable
        | (1 << 59) // PXNTable
        | 0b11;
    let d = Descriptor::new(value);
    assert!(d.ns_table());
    assert_eq!(d.ap_table(), 0b10);
    assert!(d.uxn_table());
    assert!(d.pxn_table());
    // The control bits must not leak into the table address
    assert_eq!(d.next_table_address(), 0x4000_1000);
}

#[test]
fn stage2_leaf_fields_decode() {
    let d = Descriptor::stage2_page(0x5000_1000, 0b01);
    assert_eq!(d.s2ap(), 0b01);
    assert!(!d.s2_xn());
    assert!(d.af());
    assert_eq!(d.kind(3), DescriptorKind::Page);

    let xn = Descriptor::new(d.raw() | PTE_S2_XN_BIT);
    assert!(xn.s2_xn());
}

#[test]
fn builders_produce_expected_bit_patterns() {
    assert_eq!(Descriptor::table(0x4000_1000).raw(), 0x4000_1000 | 0b11);

    let page = Descriptor::page(0x5000_1000, 0b10, false, false);
    assert_eq!(
        page.raw(),
        0x5000_1000 | (0b10 << 6) | (0b11 << 8) | (1 << 10) | 0b11
    );

    let block = Descriptor::block(0x8000_0000, 0b01);
    assert_eq!(block.kind(2), DescriptorKind::Block);
    assert_eq!(block.output_address(2), 0x8000_0000);

    let s2_block = Descriptor::stage2_block(0x8000_0000, 0b11);
    assert_eq!(s2_block.kind(1), DescriptorKind::Block);
    assert_eq!(s2_block.s2ap(), 0b11);
}

#[test]
fn shareability_covers_all_encodings() {
    assert_eq!(Shareability::from_bits(0b00), Shareability::NonShareable);
    assert_eq!(Shareability::from_bits(0b01), Shareability::Reserved);
    assert_eq!(Shareability::from_bits(0b10), Shareability::OuterShareable);
    assert_eq!(Shareability::from_bits(0b11), Shareability::InnerShareable);
}
