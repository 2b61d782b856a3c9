//! Scenario file parsing and validation.
//!
//! A scenario is a JSON file describing one simulated access: architecture
//! parameters, register values, the access itself, and pre-populated
//! translation tables for both stages. Everything is validated here, before
//! the engine runs; the walkers assume a well-formed configuration and
//! report only translation-time faults.
//!
//! ```text
//! {
//!   "scenario_name": "...", "description": "...",
//!   "architecture": { "granule_size_kb": 4, "va_bits": 48, ... },
//!   "registers": { "TTBR0_EL1": "0x40000000", "TCR_EL1": {...}, ... },
//!   "memory_access": { "virtual_address": "0x...", "access_type": "READ",
//!                      "privilege_level": "EL0" },
//!   "translation_tables": { "stage1": { "<PA>": {"value": "0x..."} },
//!                           "stage2": { ... } }
//! }
//! ```
//!
//! Descriptor entries may be bare hex strings or objects with a `value`
//! plus optional `type`/`comment` annotations; the annotations are for
//! humans and are not interpreted.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::address::VirtualAddress;
use crate::fault::AccessType;
use crate::granule::Granule;
use crate::regs::{RegisterState, Tcr, Ttbr, Vtcr};
use crate::tables::TableStore;
use crate::walker::{PageTableWalker, WalkResult};

// ── Raw file schema ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    #[serde(default = "default_name")]
    pub scenario_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub architecture: ArchitectureConfig,
    #[serde(default)]
    pub registers: RegisterConfig,
    pub memory_access: MemoryAccessConfig,
    #[serde(default)]
    pub translation_tables: TranslationTablesConfig,
}

fn default_name() -> String {
    "unnamed".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ArchitectureConfig {
    #[serde(default = "default_granule_kb")]
    pub granule_size_kb: u32,
    #[serde(default = "default_va_bits")]
    pub va_bits: u32,
    #[serde(default = "default_pa_bits")]
    pub pa_bits: u32,
    #[serde(default = "default_va_bits")]
    pub ipa_bits: u32,
    #[serde(default = "default_true")]
    pub feat_d128_enabled: bool,
}

fn default_granule_kb() -> u32 {
    4
}

fn default_va_bits() -> u32 {
    48
}

fn default_pa_bits() -> u32 {
    56
}

fn default_true() -> bool {
    true
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            granule_size_kb: 4,
            va_bits: 48,
            pa_bits: 56,
            ipa_bits: 48,
            feat_d128_enabled: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterConfig {
    #[serde(rename = "TTBR0_EL1", default = "default_ttbr0")]
    pub ttbr0_el1: String,
    #[serde(rename = "TTBR1_EL1", default = "default_ttbr1")]
    pub ttbr1_el1: String,
    #[serde(rename = "VTTBR_EL2", default = "default_vttbr")]
    pub vttbr_el2: String,
    #[serde(rename = "TCR_EL1", default)]
    pub tcr_el1: TcrConfig,
    #[serde(rename = "VTCR_EL2", default)]
    pub vtcr_el2: VtcrConfig,
}

fn default_ttbr0() -> String {
    "0x0000000040000000".to_string()
}

fn default_ttbr1() -> String {
    "0x0000000080000000".to_string()
}

fn default_vttbr() -> String {
    "0x0000000100000000".to_string()
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            ttbr0_el1: default_ttbr0(),
            ttbr1_el1: default_ttbr1(),
            vttbr_el2: default_vttbr(),
            tcr_el1: TcrConfig::default(),
            vtcr_el2: VtcrConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TcrConfig {
    #[serde(rename = "T0SZ", default = "default_txsz")]
    pub t0sz: u32,
    #[serde(rename = "T1SZ", default = "default_txsz")]
    pub t1sz: u32,
}

fn default_txsz() -> u32 {
    16
}

impl Default for TcrConfig {
    fn default() -> Self {
        Self { t0sz: 16, t1sz: 16 }
    }
}

#[derive(Debug, Deserialize)]
pub struct VtcrConfig {
    #[serde(rename = "T0SZ", default = "default_txsz")]
    pub t0sz: u32,
    #[serde(rename = "SL0", default)]
    pub sl0: u32,
}

impl Default for VtcrConfig {
    fn default() -> Self {
        Self { t0sz: 16, sl0: 0 }
    }
}

#[derive(Debug, Deserialize)]
pub struct MemoryAccessConfig {
    pub virtual_address: String,
    #[serde(default = "default_access")]
    pub access_type: String,
    #[serde(default = "default_privilege")]
    pub privilege_level: String,
}

fn default_access() -> String {
    "READ".to_string()
}

fn default_privilege() -> String {
    "EL0".to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct TranslationTablesConfig {
    #[serde(default)]
    pub stage1: BTreeMap<String, DescriptorEntry>,
    #[serde(default)]
    pub stage2: BTreeMap<String, DescriptorEntry>,
}

/// One table entry: either a bare hex string or an annotated object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DescriptorEntry {
    Value(String),
    Annotated {
        value: String,
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        comment: Option<String>,
    },
}

impl DescriptorEntry {
    fn value_str(&self) -> &str {
        match self {
            DescriptorEntry::Value(v) => v,
            DescriptorEntry::Annotated { value, .. } => value,
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────────

/// Anything that can go wrong before the engine runs.
#[derive(Debug)]
pub enum ScenarioError {
    NotFound(PathBuf),
    Io(PathBuf, std::io::Error),
    Json(serde_json::Error),
    Config(String),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::NotFound(path) => {
                write!(f, "Scenario file not found: {}", path.display())
            }
            ScenarioError::Io(path, err) => {
                write!(f, "Failed to read {}: {}", path.display(), err)
            }
            ScenarioError::Json(err) => write!(f, "Invalid scenario JSON: {}", err),
            ScenarioError::Config(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl ScenarioError {
    /// True for the error classes the CLI maps to exit code 1.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ScenarioError::NotFound(_) | ScenarioError::Json(_) | ScenarioError::Config(_)
        )
    }
}

/// Parse a hex string ("0x..." or bare digits; decimal accepted).
pub fn parse_hex(value: &str) -> Result<u64, ScenarioError> {
    let trimmed = value.trim();
    let parsed = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(&hex.replace('_', ""), 16)
    } else {
        trimmed.parse::<u64>()
    };
    parsed.map_err(|_| ScenarioError::Config(format!("Malformed hex value: {:?}", value)))
}

// ── Resolved scenario ────────────────────────────────────────────────

/// A validated scenario, ready to walk.
#[derive(Debug)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub granule: Granule,
    pub va_bits: u32,
    pub pa_bits: u32,
    pub ipa_bits: u32,
    pub feat_d128_enabled: bool,
    pub registers: RegisterState,
    pub virtual_address: VirtualAddress,
    pub access_type: AccessType,
    pub is_el0: bool,
    pub stage1_tables: TableStore,
    pub stage2_tables: TableStore,
    pub source_file: Option<PathBuf>,
}

impl Scenario {
    /// Load and validate a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Scenario, ScenarioError> {
        if !path.exists() {
            return Err(ScenarioError::NotFound(path.to_path_buf()));
        }
        let text =
            fs::read_to_string(path).map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;
        let file: ScenarioFile = serde_json::from_str(&text).map_err(ScenarioError::Json)?;
        let mut scenario = Scenario::resolve(file)?;
        scenario.source_file = Some(path.to_path_buf());
        Ok(scenario)
    }

    /// Validate a parsed file and resolve it into typed engine inputs.
    pub fn resolve(file: ScenarioFile) -> Result<Scenario, ScenarioError> {
        let arch = &file.architecture;
        let granule = Granule::from_kb(arch.granule_size_kb).ok_or_else(|| {
            ScenarioError::Config(format!(
                "Invalid granule size: {}KB. Must be 4, 16, or 64.",
                arch.granule_size_kb
            ))
        })?;

        if !(16..=64).contains(&arch.va_bits) {
            return Err(ScenarioError::Config(format!(
                "va_bits out of range: {} (expected 16..=64)",
                arch.va_bits
            )));
        }

        let regs = &file.registers;
        for (name, value) in [
            ("TCR_EL1.T0SZ", regs.tcr_el1.t0sz),
            ("TCR_EL1.T1SZ", regs.tcr_el1.t1sz),
            ("VTCR_EL2.T0SZ", regs.vtcr_el2.t0sz),
        ] {
            if value > 39 {
                return Err(ScenarioError::Config(format!(
                    "{} out of range: {} (expected 0..=39)",
                    name, value
                )));
            }
        }
        if regs.vtcr_el2.sl0 > 2 {
            return Err(ScenarioError::Config(format!(
                "VTCR_EL2.SL0 out of range: {} (expected 0..=2)",
                regs.vtcr_el2.sl0
            )));
        }

        let register_state = RegisterState {
            ttbr0_el1: Ttbr::new(parse_hex(&regs.ttbr0_el1)?, "TTBR0_EL1"),
            ttbr1_el1: Ttbr::new(parse_hex(&regs.ttbr1_el1)?, "TTBR1_EL1"),
            vttbr_el2: Ttbr::new(parse_hex(&regs.vttbr_el2)?, "VTTBR_EL2"),
            tcr_el1: Tcr::new(regs.tcr_el1.t0sz, regs.tcr_el1.t1sz),
            vtcr_el2: Vtcr::new(regs.vtcr_el2.t0sz, regs.vtcr_el2.sl0),
        };

        let access = &file.memory_access;
        let access_type = AccessType::from_name(&access.access_type).ok_or_else(|| {
            ScenarioError::Config(format!("Invalid access type: {}", access.access_type))
        })?;
        let is_el0 = match access.privilege_level.to_ascii_uppercase().as_str() {
            "EL0" => true,
            "EL1" => false,
            other => {
                return Err(ScenarioError::Config(format!(
                    "Invalid privilege level: {}",
                    other
                )))
            }
        };

        let va_value = parse_hex(&access.virtual_address)?;
        let virtual_address = VirtualAddress::new(va_value, arch.va_bits, granule);
        if !virtual_address.is_canonical() {
            return Err(ScenarioError::Config(format!(
                "Virtual address 0x{:016X} is not canonical for {}-bit VAs \
                 (upper bits must be all zero or all one)",
                va_value, arch.va_bits
            )));
        }

        let stage1_tables = build_store(&file.translation_tables.stage1)?;
        let stage2_tables = build_store(&file.translation_tables.stage2)?;

        Ok(Scenario {
            name: file.scenario_name,
            description: file.description,
            granule,
            va_bits: arch.va_bits,
            pa_bits: arch.pa_bits,
            ipa_bits: arch.ipa_bits,
            feat_d128_enabled: arch.feat_d128_enabled,
            registers: register_state,
            virtual_address,
            access_type,
            is_el0,
            stage1_tables,
            stage2_tables,
            source_file: None,
        })
    }

    /// Run the configured access through the engine.
    pub fn run(&self) -> WalkResult {
        let walker = PageTableWalker::new(&self.registers, &self.stage1_tables, &self.stage2_tables);
        walker.walk(self.virtual_address, self.access_type, self.is_el0)
    }

    pub fn privilege_level(&self) -> &'static str {
        if self.is_el0 {
            "EL0"
        } else {
            "EL1"
        }
    }
}

fn build_store(
    entries: &BTreeMap<String, DescriptorEntry>,
) -> Result<TableStore, ScenarioError> {
    let mut store = TableStore::new();
    for (addr, entry) in entries {
        let pa = parse_hex(addr)?;
        let value = parse_hex(entry.value_str())?;
        store.insert(pa, value);
    }
    Ok(store)
}
