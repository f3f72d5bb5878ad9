//! Orchestrator - main simulation loop
//!
//! See `engine.rs` for the tick loop and `checkpoint.rs` for snapshots.

pub mod checkpoint;
pub mod engine;

// Re-export main types for convenience
pub use checkpoint::{validate_snapshot, PatientObservation, Snapshot};
pub use engine::{simulate, Orchestrator, SimulationConfig, TickResult, DEFAULT_TICK_BUDGET};
