//! Greedy routing policy
//!
//! # Behavior
//!
//! 1. Nothing pending → `None`
//! 2. Intake exam pending and nothing completed yet → intake is the only
//!    candidate
//! 3. Exit exam is the single pending exam → exit is the only candidate
//! 4. Otherwise candidates are the pending exams minus the exit exam, minus
//!    any exam whose prerequisites are still pending for this patient
//!    (prerequisites outside the patient's battery are ignored)
//! 5. Prefer a free candidate room, shortest exam first
//! 6. With every candidate room busy, pick the smallest projected wait
//! 7. No candidate left → `None`, retried next tick
//!
//! Ties in steps 5 and 6 go to the exam declared first in the catalog.

use super::{projected_wait, RoutingConfig, RoutingPolicy};
use crate::catalog::ExamCatalog;
use crate::core::ExamId;
use crate::error::{ClinicError, ClinicResult};
use crate::models::{ClinicState, Patient};

/// Shortest-free-room-first routing with intake/exit and precedence rules
///
/// # Example
///
/// ```
/// use clinic_simulator_core_rs::policy::{GreedyRoutingPolicy, RoutingPolicy};
/// use clinic_simulator_core_rs::{ClinicState, ExamCatalog, Patient};
///
/// let catalog = ExamCatalog::occupational_health();
/// let state = ClinicState::new(&catalog);
/// let policy = GreedyRoutingPolicy::default();
///
/// let patient = Patient::new(
///     "Patient 1".to_string(),
///     0,
///     vec!["X-Ray".to_string(), "Blood Test".to_string(), "Audiometry".to_string()],
/// );
///
/// // Blood Test is the intake exam: it goes first
/// let next = policy.select_next(&patient, &state, &catalog).unwrap();
/// assert_eq!(next.as_deref(), Some("Blood Test"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedyRoutingPolicy {
    config: RoutingConfig,
}

impl GreedyRoutingPolicy {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Exams the patient may pursue right now, before looking at rooms
    ///
    /// Returned in battery order.
    pub fn candidates<'p>(
        &self,
        patient: &'p Patient,
        catalog: &ExamCatalog,
    ) -> ClinicResult<Vec<&'p str>> {
        let pending = patient.pending_exams();
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(intake) = self.config.intake.as_deref() {
            if patient.completed_exams().is_empty() {
                if let Some(&exam) = pending.iter().find(|&&e| e == intake) {
                    return Ok(vec![exam]);
                }
            }
        }

        let exit = self.config.exit.as_deref();
        if let [only] = pending.as_slice() {
            if Some(*only) == exit {
                return Ok(vec![*only]);
            }
        }

        let mut viable = Vec::with_capacity(pending.len());
        for &exam in &pending {
            if Some(exam) == exit {
                continue;
            }
            let gated = catalog
                .precedence_of(exam)?
                .iter()
                .any(|prerequisite| pending.contains(&prerequisite.as_str()));
            if !gated {
                viable.push(exam);
            }
        }
        Ok(viable)
    }
}

impl RoutingPolicy for GreedyRoutingPolicy {
    fn select_next(
        &self,
        patient: &Patient,
        state: &ClinicState,
        catalog: &ExamCatalog,
    ) -> ClinicResult<Option<ExamId>> {
        let candidates = self.candidates(patient, catalog)?;

        // (exam, is free, duration, projected wait, catalog position)
        let mut scored = Vec::with_capacity(candidates.len());
        for exam in candidates {
            let room = state.room(exam)?;
            let position = catalog
                .position(exam)
                .ok_or_else(|| ClinicError::UnknownExam(exam.to_string()))?;
            scored.push((
                exam,
                room.is_free(),
                catalog.duration(exam)?,
                projected_wait(room, catalog)?,
                position,
            ));
        }

        let free_choice = scored
            .iter()
            .filter(|(_, free, ..)| *free)
            .min_by_key(|(_, _, duration, _, position)| (*duration, *position));
        if let Some((exam, ..)) = free_choice {
            return Ok(Some(exam.to_string()));
        }

        Ok(scored
            .iter()
            .min_by_key(|(_, _, _, wait, position)| (*wait, *position))
            .map(|(exam, ..)| exam.to_string()))
    }
}
