//! Run history and reporting
//!
//! `History` is the append-only sequence of per-tick snapshots; index `t`
//! holds the state after tick `t`. Viewers query it by tick and by patient
//! and never mutate it. `SimulationRun` bundles a history with everything
//! needed to interpret it.

use crate::catalog::ExamCatalog;
use crate::core::{ExamId, PatientId, Tick};
use crate::error::{ClinicError, ClinicResult};
use crate::models::{Event, Room};
use crate::orchestrator::{SimulationConfig, Snapshot};
use crate::policy::{GreedyRoutingPolicy, RoutingPolicy};
use crate::preview::{self, NextStep};
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::orchestrator::PatientObservation;

/// Ordered per-tick snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, snapshot: Snapshot) {
        debug_assert_eq!(snapshot.tick, self.snapshots.len());
        self.snapshots.push(snapshot);
    }

    /// Number of recorded ticks
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshot(&self, tick: Tick) -> Option<&Snapshot> {
        self.snapshots.get(tick)
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.snapshots.iter()
    }

    /// Where a patient stands after `tick`
    ///
    /// `NotYetPresent` also covers ticks outside the history.
    pub fn patient_at(&self, tick: Tick, patient_id: &str) -> PatientObservation<'_> {
        self.snapshot(tick)
            .map(|s| s.observe(patient_id))
            .unwrap_or(PatientObservation::NotYetPresent)
    }

    pub fn room_at(&self, tick: Tick, exam_id: &str) -> Option<&Room> {
        self.snapshot(tick).and_then(|s| s.room(exam_id))
    }

    /// Every event of a patient across the run, in order
    pub fn events_for_patient(&self, patient_id: &str) -> Vec<&Event> {
        self.snapshots
            .iter()
            .flat_map(|s| s.events.iter())
            .filter(|e| e.patient_id() == patient_id)
            .collect()
    }

    /// Every event of the run, in order
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.snapshots.iter().flat_map(|s| s.events.iter())
    }

    /// Finalized patients of the last tick, in completion order
    pub fn completion_report(&self) -> Vec<CompletionRecord> {
        let Some(last) = self.last() else {
            return Vec::new();
        };
        last.finalized
            .iter()
            .filter_map(|p| {
                let completion_tick = p.completion_tick()?;
                Some(CompletionRecord {
                    patient_id: p.id().to_string(),
                    arrival_tick: p.arrival_tick(),
                    completion_tick,
                    total_time: completion_tick.saturating_sub(p.arrival_tick()),
                })
            })
            .collect()
    }

    /// Aggregate statistics of the run
    pub fn summary(&self) -> RunSummary {
        let report = self.completion_report();
        let (active, finalized) = self
            .last()
            .map(|s| (s.active.len(), s.finalized.len()))
            .unwrap_or((0, 0));

        let total_times: Vec<usize> = report.iter().map(|r| r.total_time).collect();
        let mean_total_time = if total_times.is_empty() {
            None
        } else {
            Some(total_times.iter().sum::<usize>() as f64 / total_times.len() as f64)
        };

        let room_utilization = match self.snapshots.first() {
            Some(first) => first
                .rooms
                .iter()
                .enumerate()
                .map(|(i, room)| {
                    let busy_ticks = self
                        .snapshots
                        .iter()
                        .filter(|s| s.rooms.get(i).is_some_and(|r| !r.is_free()))
                        .count();
                    RoomUtilization {
                        exam: room.exam_id().to_string(),
                        busy_ticks,
                        utilization: busy_ticks as f64 / self.len() as f64,
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        RunSummary {
            ticks: self.len(),
            patients_arrived: active + finalized,
            patients_finalized: finalized,
            patients_active: active,
            mean_total_time,
            max_total_time: total_times.iter().copied().max(),
            room_utilization,
        }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Final report row of one finalized patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub patient_id: PatientId,
    pub arrival_tick: Tick,
    pub completion_tick: Tick,
    pub total_time: usize,
}

/// Busy time of one room over the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomUtilization {
    pub exam: ExamId,
    /// Ticks after which the room was occupied
    pub busy_ticks: usize,
    /// busy_ticks / ticks, in [0, 1]
    pub utilization: f64,
}

/// Run-level statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: usize,
    pub patients_arrived: usize,
    pub patients_finalized: usize,
    pub patients_active: usize,
    pub mean_total_time: Option<f64>,
    pub max_total_time: Option<usize>,
    pub room_utilization: Vec<RoomUtilization>,
}

/// Result of one simulation, passed explicitly to every consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub run_id: Uuid,
    pub tick_budget: usize,
    pub config: SimulationConfig,

    /// Routed by a policy other than the greedy one of `config.routing`
    #[serde(default)]
    pub custom_policy: bool,

    pub scenario: Scenario,
    pub history: History,
}

impl SimulationRun {
    /// Catalog the run was simulated with
    pub fn catalog(&self) -> ClinicResult<ExamCatalog> {
        ExamCatalog::new(self.config.exams.clone())
    }

    /// What a patient does next, as seen from the snapshot of `tick`
    ///
    /// Projects with the greedy policy of `config.routing`. Ticks outside
    /// the history report `NotYetPresent`.
    ///
    /// # Errors
    /// `InvalidConfig` when the run was routed by a custom policy.
    pub fn next_step(&self, tick: Tick, patient_id: &str) -> ClinicResult<NextStep> {
        if self.custom_policy {
            return Err(ClinicError::InvalidConfig(
                "run was routed by a custom policy; preview it with next_step_with".to_string(),
            ));
        }
        let policy = GreedyRoutingPolicy::new(self.config.routing.clone());
        self.next_step_with(tick, patient_id, &policy)
    }

    /// Same as [`SimulationRun::next_step`] with an explicit routing policy
    pub fn next_step_with(
        &self,
        tick: Tick,
        patient_id: &str,
        policy: &dyn RoutingPolicy,
    ) -> ClinicResult<NextStep> {
        let Some(snapshot) = self.history.snapshot(tick) else {
            return Ok(NextStep::NotYetPresent);
        };
        let catalog = self.catalog()?;
        preview::next_step(snapshot, patient_id, &catalog, policy)
    }
}
