//! Routing Policy Module
//!
//! Decides which exam an awaiting patient should pursue next.
//!
//! # Overview
//!
//! Each tick, after rooms have advanced and new patients have arrived, every
//! awaiting patient is handed to the routing policy. The policy looks at the
//! patient's pending exams and at current room congestion and returns either
//! the exam to pursue or `None` (patient stays awaiting and is retried on the
//! next tick). Whether the patient starts service or joins a queue is decided
//! by the orchestrator from the room state, not by the policy.
//!
//! # Policy Interface
//!
//! ```rust
//! use clinic_simulator_core_rs::policy::RoutingPolicy;
//! use clinic_simulator_core_rs::{ClinicResult, ClinicState, ExamCatalog, Patient};
//!
//! /// Always picks the first pending exam in battery order
//! struct InOrder;
//!
//! impl RoutingPolicy for InOrder {
//!     fn select_next(
//!         &self,
//!         patient: &Patient,
//!         _state: &ClinicState,
//!         _catalog: &ExamCatalog,
//!     ) -> ClinicResult<Option<String>> {
//!         Ok(patient.pending_exams().first().map(|e| e.to_string()))
//!     }
//! }
//! ```
//!
//! The shipped policy is [`GreedyRoutingPolicy`]: local and greedy, it never
//! plans ahead for global throughput.

use crate::catalog::{ExamCatalog, BLOOD_TEST, OCCUPATIONAL_CONSULT};
use crate::core::ExamId;
use crate::error::ClinicResult;
use crate::models::{ClinicState, Patient, Room};
use serde::{Deserialize, Serialize};

pub mod greedy;

pub use greedy::GreedyRoutingPolicy;

/// Picks the next exam for an awaiting patient
///
/// Implementations must be pure with respect to the state: the same patient
/// and state always give the same answer.
pub trait RoutingPolicy: Send {
    /// Exam the patient should pursue now, or `None` when no exam is
    /// currently viable
    ///
    /// # Errors
    /// `UnknownExam` when the patient references an exam the catalog or the
    /// state does not know.
    fn select_next(
        &self,
        patient: &Patient,
        state: &ClinicState,
        catalog: &ExamCatalog,
    ) -> ClinicResult<Option<ExamId>>;
}

/// Intake and exit exam configuration
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::policy::RoutingConfig;
///
/// let config = RoutingConfig::default();
/// assert_eq!(config.intake.as_deref(), Some("Blood Test"));
/// assert_eq!(config.exit.as_deref(), Some("Occupational Consult"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Exam that must come first when it is part of the battery
    pub intake: Option<ExamId>,

    /// Exam that must come last when it is part of the battery
    pub exit: Option<ExamId>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            intake: Some(BLOOD_TEST.to_string()),
            exit: Some(OCCUPATIONAL_CONSULT.to_string()),
        }
    }
}

impl RoutingConfig {
    /// No intake or exit constraint
    pub fn unconstrained() -> Self {
        Self {
            intake: None,
            exit: None,
        }
    }
}

/// Ticks a newcomer would wait before `room` can serve them
///
/// remaining time of the current service + queue length × exam duration.
/// A free room has a projected wait of 0.
pub fn projected_wait(room: &Room, catalog: &ExamCatalog) -> ClinicResult<usize> {
    let duration = catalog.duration(room.exam_id())?;
    Ok(room.remaining() + room.queue_len() * duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Exam;

    #[test]
    fn test_projected_wait() {
        let catalog = ExamCatalog::new(vec![Exam::new("A", 4)]).unwrap();
        let mut room = Room::new("A".to_string(), 4);
        assert_eq!(projected_wait(&room, &catalog).unwrap(), 0);

        room.start_service("P1").unwrap();
        room.advance_tick().unwrap();
        room.enqueue("P2").unwrap();
        room.enqueue("P3").unwrap();
        assert_eq!(projected_wait(&room, &catalog).unwrap(), 3 + 2 * 4);
    }

    #[test]
    fn test_routing_config_deserializes_partial() {
        let config: RoutingConfig = serde_json::from_str(r#"{"exit": null}"#).unwrap();
        assert_eq!(config.intake.as_deref(), Some(BLOOD_TEST));
        assert_eq!(config.exit, None);
    }
}
