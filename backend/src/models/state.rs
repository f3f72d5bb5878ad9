//! Clinic State
//!
//! Represents the complete mutable state of the clinic during a run:
//! every exam room (in catalog order) plus the active and finalized patients.
//!
//! The state has no behavior beyond validated mutation. The orchestrator is
//! the only writer, and only within the phases of a tick; the routing policy
//! and viewers read it.
//!
//! # Critical Invariants
//!
//! 1. **One room per exam**: rooms are created from the catalog and never
//!    destroyed during a run
//! 2. **Single placement**: a patient is in at most one room or queue
//! 3. **Finalization is final**: a finalized patient never returns to the
//!    active set

use crate::catalog::ExamCatalog;
use crate::core::{ExamId, PatientId, Tick};
use crate::error::{ClinicError, ClinicResult};
use crate::models::patient::Patient;
use crate::models::room::{Room, RoomRelease};
use std::collections::HashMap;

/// Complete clinic state
///
/// # Example
///
/// ```rust
/// use clinic_simulator_core_rs::{ClinicState, ExamCatalog, Patient};
///
/// let catalog = ExamCatalog::occupational_health();
/// let mut state = ClinicState::new(&catalog);
/// assert_eq!(state.num_rooms(), 10);
///
/// state.admit(Patient::new("Patient 1".to_string(), 0, vec!["X-Ray".to_string()]));
/// state.start_service("X-Ray", "Patient 1").unwrap();
/// assert_eq!(state.room("X-Ray").unwrap().occupant(), Some("Patient 1"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClinicState {
    /// Rooms in catalog order
    rooms: Vec<Room>,

    /// Exam ID → position in `rooms`
    room_index: HashMap<ExamId, usize>,

    /// Patients still in the clinic, in arrival order
    active: Vec<Patient>,

    /// Patients who completed their battery, in completion order
    finalized: Vec<Patient>,
}

impl ClinicState {
    /// Create one free room per catalog exam, with no patients
    pub fn new(catalog: &ExamCatalog) -> Self {
        let rooms: Vec<Room> = catalog
            .exams()
            .iter()
            .map(|exam| Room::new(exam.id.clone(), exam.duration))
            .collect();
        let room_index = index_rooms(&rooms);

        Self {
            rooms,
            room_index,
            active: Vec::new(),
            finalized: Vec::new(),
        }
    }

    /// Rebuild a state from captured parts (rooms must be in catalog order)
    pub fn from_parts(rooms: Vec<Room>, active: Vec<Patient>, finalized: Vec<Patient>) -> Self {
        let room_index = index_rooms(&rooms);
        Self {
            rooms,
            room_index,
            active,
            finalized,
        }
    }

    // ========================================================================
    // Rooms
    // ========================================================================

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn num_rooms(&self) -> usize {
        self.rooms.len()
    }

    /// Room serving an exam
    pub fn room(&self, exam_id: &str) -> ClinicResult<&Room> {
        self.room_position(exam_id).map(|i| &self.rooms[i])
    }

    /// Put a patient into service in a free room
    pub fn start_service(&mut self, exam_id: &str, patient_id: &str) -> ClinicResult<()> {
        self.room_mut(exam_id)?.start_service(patient_id)
    }

    /// Queue a patient behind the occupant of a room
    pub fn enqueue(&mut self, exam_id: &str, patient_id: &str) -> ClinicResult<()> {
        self.room_mut(exam_id)?.enqueue(patient_id)
    }

    /// Consume one tick of service; true when the service just finished
    pub fn advance_tick(&mut self, exam_id: &str) -> ClinicResult<bool> {
        self.room_mut(exam_id)?.advance_tick()
    }

    /// Release the finished occupant and promote the queue head
    pub fn release_and_promote(&mut self, exam_id: &str) -> ClinicResult<RoomRelease> {
        self.room_mut(exam_id)?.release_and_promote()
    }

    /// Exam IDs of rooms currently serving someone, in catalog order
    pub fn occupied_rooms(&self) -> Vec<ExamId> {
        self.rooms
            .iter()
            .filter(|room| !room.is_free())
            .map(|room| room.exam_id().to_string())
            .collect()
    }

    /// Patients waiting across all queues
    pub fn total_queued(&self) -> usize {
        self.rooms.iter().map(Room::queue_len).sum()
    }

    // ========================================================================
    // Patients
    // ========================================================================

    /// Add a newly arrived patient to the active set
    pub fn admit(&mut self, patient: Patient) {
        self.active.push(patient);
    }

    pub fn active_patients(&self) -> &[Patient] {
        &self.active
    }

    pub fn finalized_patients(&self) -> &[Patient] {
        &self.finalized
    }

    pub fn num_active(&self) -> usize {
        self.active.len()
    }

    pub fn num_finalized(&self) -> usize {
        self.finalized.len()
    }

    /// Active patient by ID
    pub fn patient(&self, patient_id: &str) -> Option<&Patient> {
        self.active.iter().find(|p| p.id() == patient_id)
    }

    /// Mutable active patient by ID
    pub fn patient_mut(&mut self, patient_id: &str) -> ClinicResult<&mut Patient> {
        self.active
            .iter_mut()
            .find(|p| p.id() == patient_id)
            .ok_or_else(|| ClinicError::PatientNotFound(patient_id.to_string()))
    }

    /// IDs of active patients currently awaiting routing, in arrival order
    pub fn awaiting_patient_ids(&self) -> Vec<PatientId> {
        self.active
            .iter()
            .filter(|p| p.is_awaiting())
            .map(|p| p.id().to_string())
            .collect()
    }

    /// Move every active patient with a complete battery to the finalized set
    ///
    /// Returns the finalized patients' IDs in active (arrival) order.
    pub fn finalize_completed(&mut self, tick: Tick) -> Vec<PatientId> {
        let (done, still_active): (Vec<Patient>, Vec<Patient>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(Patient::has_completed_all);
        self.active = still_active;

        let mut ids = Vec::with_capacity(done.len());
        for mut patient in done {
            patient.finalize(tick);
            ids.push(patient.id().to_string());
            self.finalized.push(patient);
        }
        ids
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn room_position(&self, exam_id: &str) -> ClinicResult<usize> {
        self.room_index
            .get(exam_id)
            .copied()
            .ok_or_else(|| ClinicError::UnknownExam(exam_id.to_string()))
    }

    fn room_mut(&mut self, exam_id: &str) -> ClinicResult<&mut Room> {
        let position = self.room_position(exam_id)?;
        Ok(&mut self.rooms[position])
    }
}

fn index_rooms(rooms: &[Room]) -> HashMap<ExamId, usize> {
    rooms
        .iter()
        .enumerate()
        .map(|(i, room)| (room.exam_id().to_string(), i))
        .collect()
}
