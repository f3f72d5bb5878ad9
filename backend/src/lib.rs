//! Clinic Simulator Core - Rust Engine
//!
//! Minute-by-minute simulation of patients moving through an
//! occupational-health clinic, with a fully replayable history.
//!
//! # Architecture
//!
//! - **catalog**: Exam durations and precedence rules
//! - **core**: Time management and shared identifiers
//! - **models**: Domain types (Room, Patient, ClinicState, Event)
//! - **policy**: Routing policies (which exam next)
//! - **orchestrator**: Main simulation loop and snapshots
//! - **history**: Per-tick history, reports and the run handle
//! - **preview**: Read-only "what happens next" projection
//! - **persistence** / **cache**: JSON records, fingerprints, memoized runs
//! - **scenario**: Scenario ingestion and seeded generation
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. The tick loop is deterministic: same config + scenario → same history
//! 2. History is append-only; viewers never mutate engine state
//! 3. FFI boundary is minimal and safe

// Module declarations
pub mod cache;
pub mod catalog;
pub mod core;
pub mod error;
pub mod history;
pub mod models;
pub mod orchestrator;
pub mod persistence;
pub mod policy;
pub mod preview;
pub mod rng;
pub mod scenario;

// Re-exports for convenience
pub use catalog::{Exam, ExamCatalog};
pub use core::time::TimeManager;
pub use error::{ClinicError, ClinicResult};
pub use history::{History, PatientObservation, SimulationRun};
pub use models::{
    event::{Event, EventLog},
    patient::{Location, Patient, PatientStatus},
    room::{Room, RoomStatus},
    state::ClinicState,
};
pub use orchestrator::{simulate, Orchestrator, SimulationConfig, Snapshot, TickResult};
pub use policy::{GreedyRoutingPolicy, RoutingConfig, RoutingPolicy};
pub use preview::NextStep;
pub use rng::RngManager;
pub use scenario::{Scenario, ScenarioEntry};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn clinic_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::simulation::PyClinicSimulation>()?;
    Ok(())
}
