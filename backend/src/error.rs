//! Error types for the clinic engine
//!
//! Every failure inside the engine is fatal and deterministic: there are no
//! transient or retryable errors in the tick loop. Viewer-facing conditions
//! such as "patient has not arrived yet" are observational states
//! (see `history::PatientObservation`), not errors.

use crate::models::patient::PatientError;
use thiserror::Error;

/// Errors raised by catalog construction, scenario ingestion and the tick loop
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClinicError {
    /// An exam identifier is absent from the catalog
    #[error("Unknown exam: {0}")]
    UnknownExam(String),

    /// A clinic state mutation violated a room invariant (engine bug)
    #[error("Invalid state for room {room}: {reason}")]
    InvalidRoomState { room: String, reason: String },

    /// A scenario entry has no exams
    #[error("Patient {0} has an empty exam battery")]
    EmptyRequiredSet(String),

    /// Two scenario entries share a patient identifier
    #[error("Duplicate patient ID: {0}")]
    DuplicatePatient(String),

    /// An exam is listed twice in one patient's battery
    #[error("Patient {patient} lists exam {exam} more than once")]
    DuplicateExam { patient: String, exam: String },

    /// Configuration validation error
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A patient transition was rejected (engine bug)
    #[error(transparent)]
    InvalidPatientTransition(#[from] PatientError),

    /// A patient referenced by clinic state is not in the active set
    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    /// A captured snapshot breaks a clinic invariant
    #[error("Snapshot at tick {tick} is inconsistent: {reason}")]
    InvalidSnapshot { tick: usize, reason: String },

    /// `tick()` was called after the configured budget ran out
    #[error("Tick budget of {budget} exhausted")]
    BudgetExhausted { budget: usize },
}

impl ClinicError {
    pub(crate) fn room_state(room: &str, reason: impl Into<String>) -> Self {
        ClinicError::InvalidRoomState {
            room: room.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the engine
pub type ClinicResult<T> = Result<T, ClinicError>;
