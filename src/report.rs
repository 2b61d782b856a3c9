//! Result document assembly.
//!
//! Turns a `WalkResult` plus its scenario metadata into the JSON document
//! consumed by the renderers, and into the plain-text summary block. All
//! addresses and descriptor values are formatted `0x%016X` so traces from
//! different runs diff cleanly; the timestamp is the only field that varies
//! between identical runs.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

use crate::scenario::Scenario;
use crate::walker::{RegisterSnapshot, WalkResult, WalkStatus};

pub fn hex64(value: u64) -> String {
    format!("0x{:016X}", value)
}

fn hex64_opt(value: Option<u64>) -> Value {
    match value {
        Some(v) => Value::String(hex64(v)),
        None => Value::Null,
    }
}

/// Build the full result document.
pub fn build_report(scenario: &Scenario, result: &WalkResult, timestamp: &str) -> Value {
    json!({
        "scenario_name": scenario.name,
        "description": scenario.description,
        "timestamp": timestamp,
        "input": {
            "virtual_address": result.input_va.to_hex(),
            "access_type": scenario.access_type.name(),
            "privilege_level": scenario.privilege_level(),
            "va_bits": scenario.va_bits,
            "pa_bits": scenario.pa_bits,
            "source_file": scenario.source_file.as_ref().map(|p| p.display().to_string()),
        },
        "result": {
            "status": result.status.name(),
            "final_pa": hex64_opt(result.output_pa),
            "ipa": hex64_opt(result.ipa),
            "total_memory_accesses": result.total_memory_accesses,
        },
        "walk_trace": {
            "events": result.events.iter().map(|event| json!({
                "event_id": event.event_id,
                "event_type": "T",
                "stage": event.stage,
                "level": event.level,
                "purpose": event.purpose,
                "address": hex64(event.address),
                "descriptor_value": hex64(event.descriptor_value),
                "result": event.result.name(),
                "output": hex64(event.output),
            })).collect::<Vec<_>>(),
            "register_snapshots": result.register_snapshots.iter()
                .map(snapshot_json)
                .collect::<Vec<_>>(),
        },
        "fault": fault_json(result),
        "final_permissions": permissions_json(result),
        "final_attributes": attributes_json(result),
    })
}

fn snapshot_json(snapshot: &RegisterSnapshot) -> Value {
    let mut value = json!({
        "point": snapshot.point,
        "VA": hex64(snapshot.va),
        "IPA": hex64_opt(snapshot.ipa),
        "PA": hex64_opt(snapshot.pa),
    });
    if let Some([ttbr0, ttbr1, vttbr]) = snapshot.table_bases {
        let map = value.as_object_mut().expect("snapshot is an object");
        map.insert("TTBR0_EL1".into(), Value::String(hex64(ttbr0)));
        map.insert("TTBR1_EL1".into(), Value::String(hex64(ttbr1)));
        map.insert("VTTBR_EL2".into(), Value::String(hex64(vttbr)));
    }
    value
}

fn fault_json(result: &WalkResult) -> Value {
    match &result.fault {
        None => Value::Null,
        Some(fault) => json!({
            "fault_type": fault.kind.name(),
            "stage": fault.stage,
            "level": fault.level,
            "address": hex64(fault.address),
            "access_type": fault.access_type.map(|a| a.name()),
            "message": fault.message,
            "FAR_EL1": hex64_opt(fault.far_el1),
            "FAR_EL2": hex64_opt(fault.far_el2),
        }),
    }
}

fn permissions_json(result: &WalkResult) -> Value {
    match &result.final_permissions {
        None => Value::Null,
        Some(perms) => json!({
            "read_el0": perms.read_el0,
            "write_el0": perms.write_el0,
            "read_el1": perms.read_el1,
            "write_el1": perms.write_el1,
            "execute_el0": perms.execute_el0,
            "execute_el1": perms.execute_el1,
        }),
    }
}

fn attributes_json(result: &WalkResult) -> Value {
    match &result.final_attributes {
        None => Value::Null,
        Some(attrs) => json!({
            "shareability": attrs.shareability.name(),
            "attr_index": attrs.attr_index,
            "access_flag": attrs.access_flag,
            "not_global": attrs.not_global,
            "non_secure": attrs.non_secure,
        }),
    }
}

/// Write a JSON document, creating parent directories as needed.
pub fn save_json(value: &Value, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(path, text)
}

/// Human-readable summary of a walk, for terminal output.
pub fn summary(result: &WalkResult) -> String {
    let mut lines: Vec<String> = Vec::new();
    let rule = "=".repeat(60);
    let thin = "-".repeat(60);

    lines.push(rule.clone());
    lines.push("PAGE TABLE WALK SUMMARY".to_string());
    lines.push(rule.clone());

    let va = &result.input_va;
    lines.push(format!("Input VA: {}", va.to_hex()));
    for level in 0..4 {
        lines.push(format!("  L{} Index: 0x{:03X}", level, va.index(level)));
    }
    lines.push(format!("  Page Offset: 0x{:03X}", va.page_offset()));
    lines.push(thin.clone());

    match result.status {
        WalkStatus::Success => {
            lines.push("Translation SUCCESSFUL".to_string());
            if let Some(ipa) = result.ipa {
                lines.push(format!("  IPA: {}", hex64(ipa)));
            }
            if let Some(pa) = result.output_pa {
                lines.push(format!("  PA:  {}", hex64(pa)));
            }
        }
        _ => {
            lines.push(format!("Translation FAILED: {}", result.status.name()));
            if let Some(fault) = &result.fault {
                lines.push(format!("  Fault: {}", fault.kind.name()));
                lines.push(format!("  Stage: {}, Level: {}", fault.stage, fault.level));
                lines.push(format!("  Message: {}", fault.message));
            }
        }
    }

    lines.push(thin);
    lines.push(format!(
        "Total Memory Accesses: {}",
        result.total_memory_accesses
    ));

    if let Some(perms) = &result.final_permissions {
        lines.push("Final Permissions:".to_string());
        lines.push(format!(
            "  EL0: R={}, W={}, X={}",
            perms.read_el0, perms.write_el0, perms.execute_el0
        ));
        lines.push(format!(
            "  EL1: R={}, W={}, X={}",
            perms.read_el1, perms.write_el1, perms.execute_el1
        ));
    }

    lines.push(rule);
    lines.join("\n")
}

/// Current time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn timestamp_utc() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (hour, minute, second) = (rem / 3600, (rem / 60) % 60, rem % 60);

    // Civil-from-days conversion (proleptic Gregorian calendar)
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { year + 1 } else { year };

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year, month, day, hour, minute, second
    )
}
