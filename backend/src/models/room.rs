//! Exam room model
//!
//! One room exists per catalog exam. A room is either free or serving exactly
//! one patient, and holds a FIFO line of patients waiting for it.
//!
//! # Critical Invariants
//!
//! 1. **Occupancy**: occupied ⇔ an occupant is set (enforced by `RoomStatus`)
//! 2. **Progress**: an occupant's remaining time is > 0 between ticks
//! 3. **Queue validity**: queued patients are not the occupant and appear once
//! 4. **No idle queue**: a free room has an empty queue

use crate::core::{ExamId, PatientId};
use crate::error::{ClinicError, ClinicResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Room occupancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoomStatus {
    Free,
    Occupied {
        patient_id: PatientId,
        /// Ticks of service left for the occupant
        remaining: usize,
    },
}

/// Outcome of releasing a room at the end of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRelease {
    /// Patient whose exam just finished
    pub released: PatientId,
    /// Queue head that took the room, if anyone was waiting
    pub promoted: Option<PatientId>,
}

/// An exam room with its FIFO waiting line
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::Room;
///
/// let mut room = Room::new("A".to_string(), 2);
/// room.start_service("Patient 1").unwrap();
/// room.enqueue("Patient 2").unwrap();
///
/// assert!(!room.advance_tick().unwrap());
/// assert!(room.advance_tick().unwrap());
///
/// let release = room.release_and_promote().unwrap();
/// assert_eq!(release.released, "Patient 1");
/// assert_eq!(release.promoted.as_deref(), Some("Patient 2"));
/// assert_eq!(room.remaining(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    exam_id: ExamId,
    /// Catalog duration of the exam served here
    duration: usize,
    status: RoomStatus,
    queue: VecDeque<PatientId>,
}

impl Room {
    /// Create a free room with an empty queue
    pub fn new(exam_id: ExamId, duration: usize) -> Self {
        Self {
            exam_id,
            duration,
            status: RoomStatus::Free,
            queue: VecDeque::new(),
        }
    }

    pub fn exam_id(&self) -> &str {
        &self.exam_id
    }

    pub fn duration(&self) -> usize {
        self.duration
    }

    pub fn status(&self) -> &RoomStatus {
        &self.status
    }

    pub fn is_free(&self) -> bool {
        matches!(self.status, RoomStatus::Free)
    }

    /// Patient currently being served
    pub fn occupant(&self) -> Option<&str> {
        match &self.status {
            RoomStatus::Occupied { patient_id, .. } => Some(patient_id),
            RoomStatus::Free => None,
        }
    }

    /// Remaining service time (0 when free)
    pub fn remaining(&self) -> usize {
        match &self.status {
            RoomStatus::Occupied { remaining, .. } => *remaining,
            RoomStatus::Free => 0,
        }
    }

    /// Waiting line, head first
    pub fn queue(&self) -> &VecDeque<PatientId> {
        &self.queue
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Zero-based position of a patient in the waiting line
    pub fn queue_position(&self, patient_id: &str) -> Option<usize> {
        self.queue.iter().position(|p| p == patient_id)
    }

    /// Put a patient into service in a free room
    pub fn start_service(&mut self, patient_id: &str) -> ClinicResult<()> {
        if let Some(current) = self.occupant() {
            return Err(ClinicError::room_state(
                &self.exam_id,
                format!(
                    "cannot start {}: already occupied by {}",
                    patient_id, current
                ),
            ));
        }
        if self.queue_position(patient_id).is_some() {
            return Err(ClinicError::room_state(
                &self.exam_id,
                format!("{} is queued here and must be promoted", patient_id),
            ));
        }

        self.status = RoomStatus::Occupied {
            patient_id: patient_id.to_string(),
            remaining: self.duration,
        };
        Ok(())
    }

    /// Append a patient to the waiting line of an occupied room
    pub fn enqueue(&mut self, patient_id: &str) -> ClinicResult<()> {
        match self.occupant() {
            None => {
                return Err(ClinicError::room_state(
                    &self.exam_id,
                    format!("cannot queue {}: room is free", patient_id),
                ))
            }
            Some(current) if current == patient_id => {
                return Err(ClinicError::room_state(
                    &self.exam_id,
                    format!("{} is already in service here", patient_id),
                ))
            }
            Some(_) => {}
        }
        if self.queue_position(patient_id).is_some() {
            return Err(ClinicError::room_state(
                &self.exam_id,
                format!("{} is already queued", patient_id),
            ));
        }

        self.queue.push_back(patient_id.to_string());
        Ok(())
    }

    /// Consume one tick of service
    ///
    /// Returns true when the service is finished (remaining time reached 0).
    pub fn advance_tick(&mut self) -> ClinicResult<bool> {
        match &mut self.status {
            RoomStatus::Occupied { remaining, .. } => {
                *remaining = remaining.saturating_sub(1);
                Ok(*remaining == 0)
            }
            RoomStatus::Free => Err(ClinicError::room_state(
                &self.exam_id,
                "cannot advance a free room",
            )),
        }
    }

    /// Release a finished occupant and pull the queue head into service
    ///
    /// The promoted patient starts with a fresh remaining time equal to the
    /// exam duration. With nobody waiting the room becomes free.
    pub fn release_and_promote(&mut self) -> ClinicResult<RoomRelease> {
        let released = match &self.status {
            RoomStatus::Occupied {
                patient_id,
                remaining: 0,
            } => patient_id.clone(),
            RoomStatus::Occupied { remaining, .. } => {
                return Err(ClinicError::room_state(
                    &self.exam_id,
                    format!("service still in progress ({} ticks left)", remaining),
                ))
            }
            RoomStatus::Free => {
                return Err(ClinicError::room_state(
                    &self.exam_id,
                    "cannot release a free room",
                ))
            }
        };

        let promoted = self.queue.pop_front();
        self.status = match &promoted {
            Some(next) => RoomStatus::Occupied {
                patient_id: next.clone(),
                remaining: self.duration,
            },
            None => RoomStatus::Free,
        };

        Ok(RoomRelease { released, promoted })
    }
}
