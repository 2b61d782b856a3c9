//! ARMv9 two-stage address translation simulator.
//!
//! Simulates the hardware page table walk that turns a virtual address into
//! an intermediate physical address (stage 1) and then into a physical
//! address (stage 2), producing an ordered trace of every descriptor fetch
//! the MMU would perform. Because stage-1 table addresses are themselves
//! IPAs, each stage-1 level embeds a full stage-2 sub-walk; the trace makes
//! that hidden cost visible.
//!
//! The engine is pure: register state and pre-populated translation tables
//! go in, an immutable `WalkResult` comes out. Faults are data in the
//! result, never panics. Scenario ingestion, JSON output, and the
//! terminal/HTML renderers sit on top of the engine and never feed back
//! into it.

pub mod address;
pub mod defs;
pub mod descriptor;
pub mod fault;
pub mod granule;
pub mod perms;
pub mod regs;
pub mod render;
pub mod report;
pub mod scenario;
pub mod stage1;
pub mod stage2;
pub mod tables;
pub mod walker;

pub use address::{IntermediatePhysicalAddress, PhysicalAddress, VirtualAddress};
pub use descriptor::{Descriptor, DescriptorKind};
pub use fault::{AccessType, FaultKind, FaultRecord};
pub use granule::Granule;
pub use perms::{AccessPermissions, Stage2Permissions};
pub use regs::{RegisterState, Tcr, Ttbr, Vtcr};
pub use scenario::{Scenario, ScenarioError};
pub use tables::TableStore;
pub use walker::{PageTableWalker, WalkResult, WalkStatus};
