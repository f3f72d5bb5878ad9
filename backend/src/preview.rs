//! "What happens next" projection for one patient
//!
//! Reads a frozen snapshot and answers the question a patient at the clinic
//! would ask: which room am I heading to, how many people are ahead of me,
//! and how long will it take. The snapshot is never mutated.
//!
//! For a queued patient the people ahead are the queue entries before them
//! plus the occupant of the room. An awaiting patient is projected into the
//! room the routing policy would pick on the snapshot, behind its whole
//! queue.

use crate::catalog::ExamCatalog;
use crate::core::ExamId;
use crate::error::{ClinicError, ClinicResult};
use crate::models::{PatientStatus, Room};
use crate::orchestrator::{PatientObservation, Snapshot};
use crate::policy::RoutingPolicy;
use serde::{Deserialize, Serialize};

/// Projected next step of a patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum NextStep {
    /// Patient is not in the snapshot
    NotYetPresent,

    /// Every required exam is complete
    Finished,

    InService { exam: ExamId },

    /// Heading to (or waiting for) a room
    Waiting {
        exam: ExamId,
        /// Patients served before this one, occupant included
        people_ahead: usize,
        /// Ticks until this patient can enter the room
        estimated_wait: usize,
    },

    /// No exam is viable right now; routing is retried next tick
    AwaitingRoom,
}

/// Project the next step of `patient_id` from `snapshot`
///
/// # Errors
/// `UnknownExam` when the snapshot references an exam outside the catalog;
/// `InvalidSnapshot` when a queued patient is missing from their room queue.
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::orchestrator::{simulate, SimulationConfig};
/// use clinic_simulator_core_rs::policy::GreedyRoutingPolicy;
/// use clinic_simulator_core_rs::preview::{next_step, NextStep};
/// use clinic_simulator_core_rs::scenario::{Scenario, ScenarioEntry};
/// use clinic_simulator_core_rs::ExamCatalog;
///
/// let scenario = Scenario::new(vec![
///     ScenarioEntry::new("Patient 1", 0, ["X-Ray"]),
///     ScenarioEntry::new("Patient 2", 0, ["X-Ray"]),
/// ]);
/// let config = SimulationConfig { tick_budget: 20, ..Default::default() };
/// let run = simulate(config, scenario).unwrap();
///
/// let catalog = ExamCatalog::occupational_health();
/// let policy = GreedyRoutingPolicy::default();
/// let snapshot = run.history.snapshot(0).unwrap();
///
/// assert_eq!(
///     next_step(snapshot, "Patient 2", &catalog, &policy).unwrap(),
///     NextStep::Waiting { exam: "X-Ray".to_string(), people_ahead: 1, estimated_wait: 6 },
/// );
/// ```
pub fn next_step(
    snapshot: &Snapshot,
    patient_id: &str,
    catalog: &ExamCatalog,
    policy: &dyn RoutingPolicy,
) -> ClinicResult<NextStep> {
    let patient = match snapshot.observe(patient_id) {
        PatientObservation::NotYetPresent => return Ok(NextStep::NotYetPresent),
        PatientObservation::Finalized(_) => return Ok(NextStep::Finished),
        PatientObservation::Active(patient) => patient,
    };

    match patient.status() {
        PatientStatus::Done => Ok(NextStep::Finished),
        PatientStatus::InService { exam } => Ok(NextStep::InService { exam: exam.clone() }),
        PatientStatus::Queued { exam } => {
            let room = room_of(snapshot, exam)?;
            let position = room.queue_position(patient_id).ok_or_else(|| {
                ClinicError::InvalidSnapshot {
                    tick: snapshot.tick,
                    reason: format!("{} is not in the queue of {}", patient_id, exam),
                }
            })?;
            waiting(room, position, catalog)
        }
        PatientStatus::Awaiting => {
            let state = snapshot.to_state();
            match policy.select_next(patient, &state, catalog)? {
                Some(exam) => {
                    let room = room_of(snapshot, &exam)?;
                    waiting(room, room.queue_len(), catalog)
                }
                None => Ok(NextStep::AwaitingRoom),
            }
        }
    }
}

fn room_of<'s>(snapshot: &'s Snapshot, exam: &str) -> ClinicResult<&'s Room> {
    snapshot
        .room(exam)
        .ok_or_else(|| ClinicError::UnknownExam(exam.to_string()))
}

/// A patient with `queued_ahead` queue entries before them in `room`
fn waiting(room: &Room, queued_ahead: usize, catalog: &ExamCatalog) -> ClinicResult<NextStep> {
    let duration = catalog.duration(room.exam_id())?;
    let occupant = usize::from(!room.is_free());

    Ok(NextStep::Waiting {
        exam: room.exam_id().to_string(),
        people_ahead: queued_ahead + occupant,
        estimated_wait: room.remaining() + queued_ahead * duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Exam;
    use crate::models::{ClinicState, Patient};
    use crate::policy::{GreedyRoutingPolicy, RoutingConfig};

    fn catalog() -> ExamCatalog {
        ExamCatalog::new(vec![
            Exam::new("A", 4),
            Exam::new("B", 9).with_prerequisites(["A"]),
        ])
        .unwrap()
    }

    fn policy() -> GreedyRoutingPolicy {
        GreedyRoutingPolicy::new(RoutingConfig::unconstrained())
    }

    /// P1 in A, P2 and P3 queued for A, P4 awaiting
    fn snapshot() -> Snapshot {
        let catalog = catalog();
        let mut state = ClinicState::new(&catalog);
        for id in ["P1", "P2", "P3", "P4"] {
            state.admit(Patient::new(id.to_string(), 0, vec!["A".to_string()]));
        }

        state.start_service("A", "P1").unwrap();
        state.patient_mut("P1").unwrap().begin_service("A");
        for id in ["P2", "P3"] {
            state.enqueue("A", id).unwrap();
            state.patient_mut(id).unwrap().join_queue("A");
        }
        state.advance_tick("A").unwrap();

        Snapshot::capture(1, &state, Vec::new())
    }

    #[test]
    fn test_queued_patient_counts_occupant() {
        let step = next_step(&snapshot(), "P3", &catalog(), &policy()).unwrap();
        assert_eq!(
            step,
            NextStep::Waiting {
                exam: "A".to_string(),
                people_ahead: 2,
                estimated_wait: 3 + 4,
            }
        );
    }

    #[test]
    fn test_awaiting_patient_goes_behind_whole_queue() {
        let step = next_step(&snapshot(), "P4", &catalog(), &policy()).unwrap();
        assert_eq!(
            step,
            NextStep::Waiting {
                exam: "A".to_string(),
                people_ahead: 3,
                estimated_wait: 3 + 2 * 4,
            }
        );
    }

    #[test]
    fn test_in_service_and_absent() {
        let snapshot = snapshot();
        assert_eq!(
            next_step(&snapshot, "P1", &catalog(), &policy()).unwrap(),
            NextStep::InService {
                exam: "A".to_string()
            }
        );
        assert_eq!(
            next_step(&snapshot, "P9", &catalog(), &policy()).unwrap(),
            NextStep::NotYetPresent
        );
    }

    #[test]
    fn test_free_room_has_no_wait() {
        let catalog = catalog();
        let mut state = ClinicState::new(&catalog);
        state.admit(Patient::new("P1".to_string(), 0, vec!["A".to_string()]));
        let snapshot = Snapshot::capture(0, &state, Vec::new());

        assert_eq!(
            next_step(&snapshot, "P1", &catalog, &policy()).unwrap(),
            NextStep::Waiting {
                exam: "A".to_string(),
                people_ahead: 0,
                estimated_wait: 0,
            }
        );
    }

    #[test]
    fn test_no_viable_exam_awaits_room() {
        // B waits for X, and X is the exit exam: nothing is viable
        let catalog = ExamCatalog::new(vec![
            Exam::new("X", 2),
            Exam::new("B", 3).with_prerequisites(["X"]),
        ])
        .unwrap();
        let policy = GreedyRoutingPolicy::new(RoutingConfig {
            intake: None,
            exit: Some("X".to_string()),
        });
        let mut state = ClinicState::new(&catalog);
        state.admit(Patient::new(
            "P1".to_string(),
            0,
            vec!["B".to_string(), "X".to_string()],
        ));
        let snapshot = Snapshot::capture(0, &state, Vec::new());

        assert_eq!(
            next_step(&snapshot, "P1", &catalog, &policy).unwrap(),
            NextStep::AwaitingRoom
        );
    }
}
