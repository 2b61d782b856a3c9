//! Property tests over the pure slicing and classification functions.

use proptest::prelude::*;

use ptwalk::address::VirtualAddress;
use ptwalk::descriptor::{Descriptor, DescriptorKind};
use ptwalk::granule::{Granule, GRANULE_4KB};
use ptwalk::perms::AccessPermissions;

proptest! {
    /// Reassembling the 4KB-granule indices and page offset reproduces the
    /// low 48 bits of any address.
    #[test]
    fn indices_round_trip_4kb(va in any::<u64>()) {
        let g = &GRANULE_4KB;
        let rebuilt = (g.index(va, 0) << 39)
            | (g.index(va, 1) << 30)
            | (g.index(va, 2) << 21)
            | (g.index(va, 3) << 12)
            | g.page_offset(va);
        prop_assert_eq!(rebuilt, va & ((1u64 << 48) - 1));
    }

    /// Block offsets are always a suffix of the address and never exceed
    /// the block size.
    #[test]
    fn block_offsets_bounded(addr in any::<u64>(), level in 0usize..4) {
        let offset = GRANULE_4KB.block_offset(addr, level);
        prop_assert_eq!(offset & addr, offset);
        let bound = match level {
            1 => 1u64 << 30,
            2 => 1u64 << 21,
            _ => 1u64 << 12,
        };
        prop_assert!(offset < bound);
    }

    /// Every 64-bit word classifies as exactly one descriptor kind at every
    /// level, and invalidity is decided by bit 0 plus block legality.
    #[test]
    fn classification_is_total(value in any::<u64>(), level in 0usize..4) {
        let d = Descriptor::new(value);
        let kind = d.kind(level);
        match kind {
            DescriptorKind::Invalid => {
                let block_encoding = value & 0b11 == 0b01;
                prop_assert!(
                    value & 1 == 0 || (block_encoding && (level == 0 || level == 3))
                );
            }
            DescriptorKind::Table => {
                prop_assert!(value & 0b11 == 0b11 && level < 3);
            }
            DescriptorKind::Page => {
                prop_assert!(value & 0b11 == 0b11 && level == 3);
            }
            DescriptorKind::Block => {
                prop_assert!(value & 0b11 == 0b01 && (level == 1 || level == 2));
            }
        }
    }

    /// A VA either selects TTBR0, selects TTBR1, or is non-canonical;
    /// selection implies canonicality.
    #[test]
    fn region_selection_is_consistent(value in any::<u64>()) {
        let va = VirtualAddress::new(value, 48, Granule::Kb4);
        if va.uses_ttbr1() {
            prop_assert!(va.is_canonical());
            prop_assert_eq!(value >> 48, 0xFFFF);
        }
        if value >> 48 == 0 {
            prop_assert!(va.is_canonical());
            prop_assert!(!va.uses_ttbr1());
        }
    }

    /// EL1 can always read, and EL0 rights never exceed EL1 rights for
    /// reads and writes.
    #[test]
    fn el0_rights_never_exceed_el1(ap in 0u64..4, uxn in any::<bool>(), pxn in any::<bool>()) {
        let p = AccessPermissions::from_ap_bits(ap, uxn, pxn);
        prop_assert!(p.read_el1);
        prop_assert!(!p.write_el0 || p.write_el1);
        prop_assert!(!p.write_el0 || p.read_el0);
    }

    /// Leaf output addresses are aligned to the mapping size.
    #[test]
    fn output_addresses_are_aligned(value in any::<u64>()) {
        let d = Descriptor::new(value | 1);
        if d.kind(1) == DescriptorKind::Block {
            prop_assert_eq!(d.output_address(1) & ((1 << 30) - 1), 0);
        }
        if d.kind(2) == DescriptorKind::Block {
            prop_assert_eq!(d.output_address(2) & ((1 << 21) - 1), 0);
        }
        if d.kind(3) == DescriptorKind::Page {
            prop_assert_eq!(d.output_address(3) & 0xFFF, 0);
        }
    }
}
