//! History persistence and fingerprints
//!
//! A `HistoryRecord` is the on-disk form of a run: one entry per tick, with
//! rooms keyed by exam identifier and patients keyed by patient identifier,
//! so an external viewer can look things up without scanning lists.
//!
//! Fingerprints are SHA-256 digests of canonical JSON (object keys sorted
//! recursively). They identify runs and scenarios independently of map
//! iteration order.

use crate::core::{ExamId, PatientId, Tick};
use crate::history::SimulationRun;
use crate::models::{Event, Location, Patient, PatientStatus, Room};
use crate::orchestrator::Snapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while writing or reading records
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Record Structures
// ============================================================================

/// Serializable record of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub run_id: String,
    pub tick_budget: usize,
    pub ticks: Vec<TickRecord>,
}

/// State of the clinic after one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: Tick,
    pub rooms: BTreeMap<ExamId, RoomRecord>,
    pub patients: BTreeMap<PatientId, PatientRecord>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub occupied: bool,
    pub occupant: Option<PatientId>,
    pub remaining: usize,
    pub queue: Vec<PatientId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub arrival_tick: Tick,
    pub required_exams: Vec<ExamId>,
    pub completed_exams: Vec<ExamId>,
    pub status: PatientStatus,
    pub location: Location,
    pub completion_tick: Option<Tick>,
    pub finalized: bool,
}

impl From<&Room> for RoomRecord {
    fn from(room: &Room) -> Self {
        RoomRecord {
            occupied: !room.is_free(),
            occupant: room.occupant().map(str::to_string),
            remaining: room.remaining(),
            queue: room.queue().iter().cloned().collect(),
        }
    }
}

impl PatientRecord {
    fn new(patient: &Patient, finalized: bool) -> Self {
        PatientRecord {
            arrival_tick: patient.arrival_tick(),
            required_exams: patient.required_exams().to_vec(),
            completed_exams: patient.completed_exams().to_vec(),
            status: patient.status().clone(),
            location: patient.location().clone(),
            completion_tick: patient.completion_tick(),
            finalized,
        }
    }
}

impl From<&Snapshot> for TickRecord {
    fn from(snapshot: &Snapshot) -> Self {
        let rooms = snapshot
            .rooms
            .iter()
            .map(|room| (room.exam_id().to_string(), RoomRecord::from(room)))
            .collect();

        let active = snapshot.active.iter().map(|p| (p, false));
        let finalized = snapshot.finalized.iter().map(|p| (p, true));
        let patients = active
            .chain(finalized)
            .map(|(p, done)| (p.id().to_string(), PatientRecord::new(p, done)))
            .collect();

        TickRecord {
            tick: snapshot.tick,
            rooms,
            patients,
            events: snapshot.events.clone(),
        }
    }
}

impl From<&SimulationRun> for HistoryRecord {
    fn from(run: &SimulationRun) -> Self {
        HistoryRecord {
            run_id: run.run_id.to_string(),
            tick_budget: run.tick_budget,
            ticks: run.history.iter().map(TickRecord::from).collect(),
        }
    }
}

impl HistoryRecord {
    pub fn tick(&self, tick: Tick) -> Option<&TickRecord> {
        self.ticks.get(tick)
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Fingerprint of the recorded ticks, independent of the run id
    pub fn fingerprint(&self) -> Result<String, PersistenceError> {
        fingerprint(&(self.tick_budget, &self.ticks))
    }
}

// ============================================================================
// Fingerprinting
// ============================================================================

/// SHA-256 of the canonical JSON form of `value`, as lowercase hex
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::persistence::fingerprint;
/// use std::collections::HashMap;
///
/// let a: HashMap<&str, u32> = [("x", 1), ("y", 2)].into_iter().collect();
/// let b: HashMap<&str, u32> = [("y", 2), ("x", 1)].into_iter().collect();
/// assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
/// ```
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<String, PersistenceError> {
    let canonical = canonicalize(serde_json::to_value(value)?);
    let json = serde_json::to_string(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Recursively sort object keys
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
