//! Terminal rendering of walk traces.
//!
//! Two views: a flat table of every descriptor fetch in bus order, and a
//! tree view that groups each level's stage-2 prologue under the stage-1
//! lookup it served.

use crate::report::{hex64, summary};
use crate::walker::{WalkResult, WalkStatus};

/// Print the event table followed by the summary block.
pub fn print_walk(result: &WalkResult) {
    println!();
    println!(
        "{:>3}  {:>3}  {:>3}  {:<8}  {:<18}  {:<18}  Purpose",
        "ID", "Stg", "Lvl", "Result", "Descriptor PA", "Descriptor"
    );
    println!("{}", "-".repeat(100));
    for event in &result.events {
        println!(
            "{:>3}  {:>3}  {:>3}  {:<8}  {:<18}  {:<18}  {}",
            event.event_id,
            event.stage,
            event.level,
            event.result.name(),
            hex64(event.address),
            hex64(event.descriptor_value),
            event.purpose
        );
    }
    println!();
    println!("{}", summary(result));
}

/// Print the nested tree view: stage-1 levels with their stage-2 prologues,
/// then the final stage-2 walk.
pub fn print_tree(result: &WalkResult) {
    println!();
    println!("Walk tree for VA {}", result.input_va.to_hex());

    if let Some(s1) = &result.stage1 {
        for event in &s1.events {
            println!(
                "S1 L{} lookup (table @ IPA 0x{:X}, index 0x{:03X})",
                event.level, event.table_base_ipa, event.index
            );
            for s2 in &event.stage2_prologue {
                println!(
                    "  S2 L{}: {} {} -> {}",
                    s2.level,
                    s2.kind.name(),
                    hex64(s2.descriptor_pa),
                    hex64(s2.output_address)
                );
            }
            println!(
                "  S1: {} {} -> {}",
                event.kind.name(),
                hex64(event.descriptor_pa),
                hex64(event.output_address)
            );
        }
    }

    if let Some(s2_final) = &result.stage2_final {
        println!("Final S2 walk (IPA 0x{:X})", s2_final.input_ipa);
        for s2 in &s2_final.events {
            println!(
                "  S2 L{}: {} {} -> {}",
                s2.level,
                s2.kind.name(),
                hex64(s2.descriptor_pa),
                hex64(s2.output_address)
            );
        }
    }

    match result.status {
        WalkStatus::Success => {
            if let (Some(ipa), Some(pa)) = (result.ipa, result.output_pa) {
                println!("Result: {} -> IPA {} -> PA {}", result.input_va.to_hex(), hex64(ipa), hex64(pa));
            }
        }
        _ => {
            if let Some(fault) = &result.fault {
                println!("Result: {} ({})", result.status.name(), fault);
            }
        }
    }
    println!();
}
