//! Patient model
//!
//! Represents one person moving through the clinic.
//! Each patient has:
//! - Identifier and arrival tick
//! - Required exam battery (fixed at creation)
//! - Completed exams, in completion order (append-only)
//! - Status and current location
//! - Completion tick once every required exam is done

use crate::core::{ExamId, PatientId, Tick};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Patient lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatientStatus {
    /// Not in any room or queue; routed in the next routing phase
    Awaiting,

    /// Waiting in the FIFO queue of a room
    Queued { exam: ExamId },

    /// Being served in a room
    InService { exam: ExamId },

    /// Every required exam completed
    Done,
}

/// Where the patient physically is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "exam", rename_all = "snake_case")]
pub enum Location {
    /// Just arrived, not routed yet
    Reception,
    /// Between exams
    Hallway,
    /// Inside the room of an exam
    Room(ExamId),
    /// In the waiting line of an exam room
    QueueOf(ExamId),
    /// Left the clinic after finishing the battery
    Exit,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Reception => write!(f, "reception"),
            Location::Hallway => write!(f, "hallway"),
            Location::Room(exam) => write!(f, "{}", exam),
            Location::QueueOf(exam) => write!(f, "queue of {}", exam),
            Location::Exit => write!(f, "exit"),
        }
    }
}

/// Errors that can occur during patient transitions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatientError {
    #[error("Patient {patient} does not require exam {exam}")]
    ExamNotRequired { patient: String, exam: String },

    #[error("Patient {patient} already completed exam {exam}")]
    AlreadyCompleted { patient: String, exam: String },

    #[error("Patient {patient} is not in service for exam {exam}")]
    NotInService { patient: String, exam: String },
}

/// A patient and their progress through the exam battery
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::Patient;
///
/// let mut patient = Patient::new(
///     "Patient 1".to_string(),
///     0,
///     vec!["Blood Test".to_string(), "X-Ray".to_string()],
/// );
/// assert_eq!(patient.pending_exams(), vec!["Blood Test", "X-Ray"]);
///
/// patient.begin_service("Blood Test");
/// patient.complete_exam("Blood Test").unwrap();
/// assert_eq!(patient.completed_exams(), ["Blood Test".to_string()]);
/// assert!(!patient.has_completed_all());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    id: PatientId,
    arrival_tick: Tick,
    required_exams: Vec<ExamId>,
    completed_exams: Vec<ExamId>,
    status: PatientStatus,
    location: Location,
    completion_tick: Option<Tick>,
}

impl Patient {
    /// Create a newly arrived patient, awaiting at reception
    pub fn new(id: PatientId, arrival_tick: Tick, required_exams: Vec<ExamId>) -> Self {
        Self {
            id,
            arrival_tick,
            required_exams,
            completed_exams: Vec::new(),
            status: PatientStatus::Awaiting,
            location: Location::Reception,
            completion_tick: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn arrival_tick(&self) -> Tick {
        self.arrival_tick
    }

    pub fn required_exams(&self) -> &[ExamId] {
        &self.required_exams
    }

    pub fn completed_exams(&self) -> &[ExamId] {
        &self.completed_exams
    }

    pub fn status(&self) -> &PatientStatus {
        &self.status
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn completion_tick(&self) -> Option<Tick> {
        self.completion_tick
    }

    /// Total time in the clinic, once finalized
    pub fn elapsed(&self) -> Option<usize> {
        self.completion_tick
            .map(|done| done.saturating_sub(self.arrival_tick))
    }

    pub fn is_awaiting(&self) -> bool {
        self.status == PatientStatus::Awaiting
    }

    pub fn requires(&self, exam_id: &str) -> bool {
        self.required_exams.iter().any(|e| e == exam_id)
    }

    pub fn has_completed(&self, exam_id: &str) -> bool {
        self.completed_exams.iter().any(|e| e == exam_id)
    }

    /// Required exams not yet completed, in battery order
    pub fn pending_exams(&self) -> Vec<&str> {
        self.required_exams
            .iter()
            .filter(|exam| !self.has_completed(exam))
            .map(String::as_str)
            .collect()
    }

    /// "completed/required" progress counter
    pub fn progress(&self) -> (usize, usize) {
        (self.completed_exams.len(), self.required_exams.len())
    }

    pub fn has_completed_all(&self) -> bool {
        self.completed_exams.len() == self.required_exams.len()
    }

    /// Patient entered a room
    pub fn begin_service(&mut self, exam_id: &str) {
        self.status = PatientStatus::InService {
            exam: exam_id.to_string(),
        };
        self.location = Location::Room(exam_id.to_string());
    }

    /// Patient joined the waiting line of a room
    pub fn join_queue(&mut self, exam_id: &str) {
        self.status = PatientStatus::Queued {
            exam: exam_id.to_string(),
        };
        self.location = Location::QueueOf(exam_id.to_string());
    }

    /// Record a finished exam and send the patient back to the hallway
    pub fn complete_exam(&mut self, exam_id: &str) -> Result<(), PatientError> {
        if !self.requires(exam_id) {
            return Err(PatientError::ExamNotRequired {
                patient: self.id.clone(),
                exam: exam_id.to_string(),
            });
        }
        if self.has_completed(exam_id) {
            return Err(PatientError::AlreadyCompleted {
                patient: self.id.clone(),
                exam: exam_id.to_string(),
            });
        }
        match &self.status {
            PatientStatus::InService { exam } if exam == exam_id => {}
            _ => {
                return Err(PatientError::NotInService {
                    patient: self.id.clone(),
                    exam: exam_id.to_string(),
                })
            }
        }

        self.completed_exams.push(exam_id.to_string());
        self.status = PatientStatus::Awaiting;
        self.location = Location::Hallway;
        Ok(())
    }

    /// Mark the battery finished at `tick`
    pub fn finalize(&mut self, tick: Tick) {
        self.completion_tick = Some(tick);
        self.status = PatientStatus::Done;
        self.location = Location::Exit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> Patient {
        Patient::new(
            "Patient 1".to_string(),
            3,
            vec!["A".to_string(), "B".to_string()],
        )
    }

    #[test]
    fn test_new_patient_awaits_at_reception() {
        let p = patient();
        assert!(p.is_awaiting());
        assert_eq!(p.location(), &Location::Reception);
        assert_eq!(p.progress(), (0, 2));
        assert_eq!(p.elapsed(), None);
    }

    #[test]
    fn test_complete_exam_requires_service() {
        let mut p = patient();
        assert_eq!(
            p.complete_exam("A"),
            Err(PatientError::NotInService {
                patient: "Patient 1".to_string(),
                exam: "A".to_string()
            })
        );

        p.begin_service("A");
        p.complete_exam("A").unwrap();
        assert_eq!(p.location(), &Location::Hallway);
        assert_eq!(p.pending_exams(), vec!["B"]);
    }

    #[test]
    fn test_complete_unrequired_exam_rejected() {
        let mut p = patient();
        p.begin_service("C");
        assert!(matches!(
            p.complete_exam("C"),
            Err(PatientError::ExamNotRequired { .. })
        ));
    }

    #[test]
    fn test_finalize_records_elapsed() {
        let mut p = patient();
        p.finalize(18);
        assert_eq!(p.status(), &PatientStatus::Done);
        assert_eq!(p.elapsed(), Some(15));
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::QueueOf("X-Ray".into()).to_string(), "queue of X-Ray");
        assert_eq!(Location::Room("X-Ray".into()).to_string(), "X-Ray");
    }
}
