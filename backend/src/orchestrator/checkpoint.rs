//! Checkpoint - per-tick snapshots of the clinic
//!
//! A `Snapshot` is a deep copy of every room, every active patient, every
//! finalized patient and the events of one tick, taken after all phases of
//! that tick have run. Snapshots are never mutated once captured.
//!
//! # Critical Invariants
//!
//! - **Occupancy**: an occupied room has remaining time > 0 and its occupant
//!   is an active patient in service for that exam
//! - **Single placement**: every patient is in at most one room or queue
//! - **No idle queue**: a free room has an empty queue
//! - **Finalization**: finalized patients are done, carry a completion tick,
//!   and are absent from the active set

use crate::core::{PatientId, Tick};
use crate::error::{ClinicError, ClinicResult};
use crate::models::{ClinicState, Event, Patient, PatientStatus, Room};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Immutable capture of the clinic after one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: Tick,

    /// Rooms in catalog order
    pub rooms: Vec<Room>,

    /// Patients still in the clinic, in arrival order
    pub active: Vec<Patient>,

    /// Patients who completed their battery, in completion order
    pub finalized: Vec<Patient>,

    /// Events produced during this tick, in phase order
    pub events: Vec<Event>,
}

/// Where a patient stands in one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientObservation<'a> {
    /// Not arrived yet (or unknown to the run)
    NotYetPresent,
    Active(&'a Patient),
    Finalized(&'a Patient),
}

impl<'a> PatientObservation<'a> {
    pub fn patient(&self) -> Option<&'a Patient> {
        match self {
            PatientObservation::NotYetPresent => None,
            PatientObservation::Active(p) | PatientObservation::Finalized(p) => Some(p),
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, PatientObservation::NotYetPresent)
    }
}

impl Snapshot {
    /// Deep-copy the clinic state
    pub fn capture(tick: Tick, state: &ClinicState, events: Vec<Event>) -> Self {
        Self {
            tick,
            rooms: state.rooms().to_vec(),
            active: state.active_patients().to_vec(),
            finalized: state.finalized_patients().to_vec(),
            events,
        }
    }

    /// Rebuild a clinic state from this snapshot, for read-only projections
    pub fn to_state(&self) -> ClinicState {
        ClinicState::from_parts(
            self.rooms.clone(),
            self.active.clone(),
            self.finalized.clone(),
        )
    }

    pub fn room(&self, exam_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.exam_id() == exam_id)
    }

    pub fn observe(&self, patient_id: &str) -> PatientObservation<'_> {
        if let Some(p) = self.active.iter().find(|p| p.id() == patient_id) {
            return PatientObservation::Active(p);
        }
        if let Some(p) = self.finalized.iter().find(|p| p.id() == patient_id) {
            return PatientObservation::Finalized(p);
        }
        PatientObservation::NotYetPresent
    }

    pub fn occupied_count(&self) -> usize {
        self.rooms.iter().filter(|r| !r.is_free()).count()
    }

    pub fn queued_count(&self) -> usize {
        self.rooms.iter().map(Room::queue_len).sum()
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate snapshot integrity
///
/// Checks room occupancy, queue placement and finalization invariants.
pub fn validate_snapshot(snapshot: &Snapshot) -> ClinicResult<()> {
    let tick = snapshot.tick;
    let fail = |reason: String| ClinicError::InvalidSnapshot { tick, reason };

    let active: HashMap<&str, &Patient> =
        snapshot.active.iter().map(|p| (p.id(), p)).collect();
    if active.len() != snapshot.active.len() {
        return Err(fail("duplicate patient in active set".to_string()));
    }

    // 1. Rooms: occupancy and queues
    let mut placed: HashMap<PatientId, String> = HashMap::new();
    for room in &snapshot.rooms {
        let exam = room.exam_id();

        if let Some(occupant) = room.occupant() {
            if room.remaining() == 0 {
                return Err(fail(format!("{} occupied with no remaining time", exam)));
            }
            let patient = active
                .get(occupant)
                .ok_or_else(|| fail(format!("{} occupant {} is not active", exam, occupant)))?;
            let in_service = matches!(
                patient.status(),
                PatientStatus::InService { exam: e } if e == exam
            );
            if !in_service {
                return Err(fail(format!("{} occupant {} is not in service", exam, occupant)));
            }
            if let Some(prev) = placed.insert(occupant.to_string(), exam.to_string()) {
                return Err(fail(format!("{} placed in {} and {}", occupant, prev, exam)));
            }
        } else if room.queue_len() > 0 {
            return Err(fail(format!("{} is free but has a queue", exam)));
        }

        for queued in room.queue() {
            let patient = active
                .get(queued.as_str())
                .ok_or_else(|| fail(format!("{} queues inactive patient {}", exam, queued)))?;
            let waiting_here = matches!(
                patient.status(),
                PatientStatus::Queued { exam: e } if e == exam
            );
            if !waiting_here {
                return Err(fail(format!("{} queues {} who is not waiting for it", exam, queued)));
            }
            if let Some(prev) = placed.insert(queued.clone(), exam.to_string()) {
                return Err(fail(format!("{} placed in {} and {}", queued, prev, exam)));
            }
        }
    }

    // 2. Every placed patient status is backed by a room
    for patient in &snapshot.active {
        let expects_room = matches!(
            patient.status(),
            PatientStatus::InService { .. } | PatientStatus::Queued { .. }
        );
        if expects_room && !placed.contains_key(patient.id()) {
            return Err(fail(format!("{} is not found in any room", patient.id())));
        }
        if *patient.status() == PatientStatus::Done {
            return Err(fail(format!("{} is done but still active", patient.id())));
        }
    }

    // 3. Finalized patients
    for patient in &snapshot.finalized {
        if active.contains_key(patient.id()) {
            return Err(fail(format!("{} is both active and finalized", patient.id())));
        }
        if patient.completion_tick().is_none() || !patient.has_completed_all() {
            return Err(fail(format!("{} finalized without completing", patient.id())));
        }
    }

    Ok(())
}
