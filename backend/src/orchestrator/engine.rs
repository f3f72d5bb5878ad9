//! Orchestrator Engine
//!
//! Main simulation loop integrating all components:
//! - Room advancement (service completion, queue promotion)
//! - Patient arrivals (from the ingested scenario)
//! - Routing decisions (policy evaluation, service start or queueing)
//! - Completion checks (finalization of finished patients)
//! - Snapshotting (complete per-tick history)
//!
//! # Architecture
//!
//! ```text
//! For each tick t:
//! A. Advance every occupied room; complete finished exams and promote
//!    queue heads into the freed rooms
//! B. Admit the patients scheduled to arrive at t
//! C. Route every awaiting patient: free room → service, busy → queue
//! D. Finalize every patient whose battery is complete
//! S. Append a snapshot of the whole clinic to the history
//! ```
//!
//! Rooms are processed in catalog order, patients in arrival order. Phase C
//! sees the routing decisions already made earlier in the same tick.
//!
//! # Example
//!
//! ```rust
//! use clinic_simulator_core_rs::orchestrator::{Orchestrator, SimulationConfig};
//! use clinic_simulator_core_rs::scenario::{Scenario, ScenarioEntry};
//!
//! let scenario = Scenario::new(vec![
//!     ScenarioEntry::new("Patient 1", 0, ["Blood Test", "X-Ray"]),
//! ]);
//! let config = SimulationConfig { tick_budget: 30, ..Default::default() };
//!
//! let mut orchestrator = Orchestrator::new(config, scenario).unwrap();
//! let first = orchestrator.tick().unwrap();
//! assert_eq!(first.arrivals, 1);
//! assert_eq!(first.services_started, 1);
//!
//! let run = orchestrator.run().unwrap();
//! assert_eq!(run.history.len(), 30);
//! assert_eq!(run.history.completion_report()[0].total_time, 11);
//! ```

use crate::catalog::{default_exams, Exam, ExamCatalog};
use crate::core::time::TimeManager;
use crate::core::{ExamId, PatientId, Tick};
use crate::error::{ClinicError, ClinicResult};
use crate::history::{History, SimulationRun};
use crate::models::event::{Event, EventLog};
use crate::models::{ClinicState, Patient};
use crate::orchestrator::checkpoint::Snapshot;
use crate::policy::{GreedyRoutingPolicy, RoutingConfig, RoutingPolicy};
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Default length of a run: one four-hour morning, in minutes
pub const DEFAULT_TICK_BUDGET: usize = 240;

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete simulation configuration
///
/// Missing fields take their default when deserialized, so a JSON override
/// only needs the fields it changes.
///
/// # Fields
///
/// * `tick_budget` - Number of ticks (minutes) to simulate
/// * `exams` - Exam catalog, in declaration order
/// * `routing` - Intake and exit exams of the routing policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_budget: usize,
    pub exams: Vec<Exam>,
    pub routing: RoutingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_budget: DEFAULT_TICK_BUDGET,
            exams: default_exams(),
            routing: RoutingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Validate the configuration and build its catalog
    ///
    /// # Errors
    /// `InvalidConfig` for a zero budget, an invalid catalog, intake/exit
    /// exams missing from the catalog, an intake exam with prerequisites or
    /// an exit exam that gates another exam; `UnknownExam` for unknown
    /// prerequisites.
    pub fn validate(&self) -> ClinicResult<ExamCatalog> {
        if self.tick_budget == 0 {
            return Err(ClinicError::InvalidConfig(
                "tick_budget must be positive".to_string(),
            ));
        }

        let catalog = ExamCatalog::new(self.exams.clone())?;

        let named = [("intake", &self.routing.intake), ("exit", &self.routing.exit)];
        for (role, exam) in named {
            if let Some(exam) = exam {
                if !catalog.contains(exam) {
                    return Err(ClinicError::InvalidConfig(format!(
                        "{} exam {} is not in the catalog",
                        role, exam
                    )));
                }
            }
        }

        // Intake is routed first and may not be gated
        if let Some(intake) = &self.routing.intake {
            if !catalog.precedence_of(intake)?.is_empty() {
                return Err(ClinicError::InvalidConfig(format!(
                    "intake exam {} cannot declare prerequisites",
                    intake
                )));
            }
        }

        // Exit is routed last and may not gate another exam
        if let Some(exit) = &self.routing.exit {
            if let Some(gated) = catalog.exams().iter().find(|e| e.prerequisites.contains(exit)) {
                return Err(ClinicError::InvalidConfig(format!(
                    "exit exam {} cannot be a prerequisite of {}",
                    exit, gated.id
                )));
            }
        }

        Ok(catalog)
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Main simulation orchestrator
///
/// Owns the clinic state, the clock, the routing policy and the history being
/// built. The state is mutated only inside `tick()`.
///
/// # Determinism
///
/// The loop draws no random numbers: the same configuration and scenario
/// always produce the same history.
pub struct Orchestrator {
    run_id: Uuid,
    config: SimulationConfig,
    catalog: ExamCatalog,
    policy: Box<dyn RoutingPolicy>,
    custom_policy: bool,
    scenario: Scenario,

    /// Scenario entry indices by arrival tick
    arrivals: BTreeMap<Tick, Vec<usize>>,

    state: ClinicState,
    time_manager: TimeManager,

    /// Events of the tick in progress
    event_log: EventLog,

    history: History,
}

/// Counters of a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickResult {
    pub tick: Tick,
    pub exams_completed: usize,
    pub promotions: usize,
    pub arrivals: usize,
    pub services_started: usize,
    pub queued: usize,
    pub finalized: usize,

    /// Patients still in the clinic after the tick
    pub active: usize,
}

impl Orchestrator {
    /// Validate the configuration, ingest the scenario and set up a clinic
    /// with one free room per exam
    ///
    /// Uses the greedy routing policy configured by `config.routing`.
    ///
    /// # Errors
    /// Configuration errors from [`SimulationConfig::validate`] and
    /// ingestion errors from [`Scenario::validate`].
    pub fn new(config: SimulationConfig, scenario: Scenario) -> ClinicResult<Self> {
        let policy = Box::new(GreedyRoutingPolicy::new(config.routing.clone()));
        Self::build(config, scenario, policy, false)
    }

    /// Same as [`Orchestrator::new`] with a custom routing policy
    ///
    /// The resulting run is marked as custom-routed; preview it with
    /// [`SimulationRun::next_step_with`] and the same policy.
    pub fn with_policy(
        config: SimulationConfig,
        scenario: Scenario,
        policy: Box<dyn RoutingPolicy>,
    ) -> ClinicResult<Self> {
        Self::build(config, scenario, policy, true)
    }

    fn build(
        config: SimulationConfig,
        scenario: Scenario,
        policy: Box<dyn RoutingPolicy>,
        custom_policy: bool,
    ) -> ClinicResult<Self> {
        let catalog = config.validate()?;
        scenario.validate(&catalog)?;

        let arrivals = scenario.arrival_schedule();
        if let Some(late) = scenario.last_arrival().filter(|&t| t >= config.tick_budget) {
            log::warn!(
                "Scenario arrival at tick {} falls outside the {}-tick budget",
                late,
                config.tick_budget
            );
        }

        Ok(Self {
            run_id: Uuid::new_v4(),
            state: ClinicState::new(&catalog),
            time_manager: TimeManager::new(config.tick_budget),
            catalog,
            policy,
            custom_policy,
            scenario,
            arrivals,
            event_log: EventLog::new(),
            history: History::new(),
            config,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn current_tick(&self) -> Tick {
        self.time_manager.current_tick()
    }

    pub fn is_finished(&self) -> bool {
        self.time_manager.is_exhausted()
    }

    pub fn state(&self) -> &ClinicState {
        &self.state
    }

    pub fn catalog(&self) -> &ExamCatalog {
        &self.catalog
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Run one tick: phases A to D, then snapshot
    ///
    /// # Errors
    /// `BudgetExhausted` once every tick of the budget has run. Any other
    /// error is an internal inconsistency and leaves the run unusable.
    pub fn tick(&mut self) -> ClinicResult<TickResult> {
        if self.time_manager.is_exhausted() {
            return Err(ClinicError::BudgetExhausted {
                budget: self.time_manager.tick_budget(),
            });
        }

        let tick = self.current_tick();
        let mut result = TickResult {
            tick,
            ..Default::default()
        };

        self.advance_rooms(tick, &mut result)?;
        self.admit_arrivals(tick, &mut result);
        self.route_awaiting(tick, &mut result)?;
        self.finalize_completed(tick, &mut result);

        result.active = self.state.num_active();
        let snapshot = Snapshot::capture(tick, &self.state, self.event_log.drain());
        self.history.push(snapshot);
        self.time_manager.advance_tick();

        log::debug!(
            "tick {}: {} arrived, {} completed, {} started, {} queued, {} finalized, {} active",
            tick,
            result.arrivals,
            result.exams_completed,
            result.services_started + result.promotions,
            result.queued,
            result.finalized,
            result.active
        );

        Ok(result)
    }

    /// Run the remaining ticks of the budget and hand back the run
    pub fn run(mut self) -> ClinicResult<SimulationRun> {
        log::info!(
            "Starting run {}: {} patients, {} rooms, {} ticks",
            self.run_id,
            self.scenario.len(),
            self.catalog.len(),
            self.time_manager.tick_budget()
        );

        while !self.is_finished() {
            self.tick()?;
        }

        log::info!(
            "Finished run {}: {} finalized, {} still active",
            self.run_id,
            self.state.num_finalized(),
            self.state.num_active()
        );
        Ok(self.into_run())
    }

    /// Hand back the run as simulated so far
    pub fn into_run(self) -> SimulationRun {
        SimulationRun {
            run_id: self.run_id,
            tick_budget: self.config.tick_budget,
            custom_policy: self.custom_policy,
            config: self.config,
            scenario: self.scenario,
            history: self.history,
        }
    }

    // ========================================================================
    // Phases
    // ========================================================================

    /// Phase A: consume one tick of service in every occupied room
    fn advance_rooms(&mut self, tick: Tick, result: &mut TickResult) -> ClinicResult<()> {
        for exam in self.state.occupied_rooms() {
            if !self.state.advance_tick(&exam)? {
                continue;
            }

            let release = self.state.release_and_promote(&exam)?;
            self.state
                .patient_mut(&release.released)?
                .complete_exam(&exam)?;
            result.exams_completed += 1;
            self.event_log.log(Event::ExamCompleted {
                tick,
                patient_id: release.released,
                exam: exam.clone(),
            });

            if let Some(promoted) = release.promoted {
                self.state.patient_mut(&promoted)?.begin_service(&exam);
                result.promotions += 1;
                self.event_log.log(Event::PromotedFromQueue {
                    tick,
                    patient_id: promoted,
                    exam,
                });
            }
        }
        Ok(())
    }

    /// Phase B: admit the patients scheduled for this tick
    fn admit_arrivals(&mut self, tick: Tick, result: &mut TickResult) {
        let Some(indices) = self.arrivals.get(&tick) else {
            return;
        };

        for &index in indices {
            let entry = &self.scenario.entries()[index];
            self.state.admit(Patient::new(
                entry.patient_id.clone(),
                tick,
                entry.required_exams.clone(),
            ));
            result.arrivals += 1;
            self.event_log.log(Event::Arrival {
                tick,
                patient_id: entry.patient_id.clone(),
            });
        }
    }

    /// Phase C: route every awaiting patient, in arrival order
    fn route_awaiting(&mut self, tick: Tick, result: &mut TickResult) -> ClinicResult<()> {
        for patient_id in self.state.awaiting_patient_ids() {
            let patient = self
                .state
                .patient(&patient_id)
                .ok_or_else(|| ClinicError::PatientNotFound(patient_id.clone()))?;

            let Some(exam) = self.policy.select_next(patient, &self.state, &self.catalog)? else {
                continue;
            };
            self.place(tick, patient_id, exam, result)?;
        }
        Ok(())
    }

    /// Start service in a free room, or join its queue
    fn place(
        &mut self,
        tick: Tick,
        patient_id: PatientId,
        exam: ExamId,
        result: &mut TickResult,
    ) -> ClinicResult<()> {
        if self.state.room(&exam)?.is_free() {
            self.state.start_service(&exam, &patient_id)?;
            self.state.patient_mut(&patient_id)?.begin_service(&exam);
            result.services_started += 1;
            self.event_log.log(Event::ServiceStarted {
                tick,
                patient_id,
                exam,
            });
        } else {
            self.state.enqueue(&exam, &patient_id)?;
            self.state.patient_mut(&patient_id)?.join_queue(&exam);
            let position = self.state.room(&exam)?.queue_len() - 1;
            result.queued += 1;
            self.event_log.log(Event::Queued {
                tick,
                patient_id,
                exam,
                position,
            });
        }
        Ok(())
    }

    /// Phase D: finalize every patient with a complete battery
    fn finalize_completed(&mut self, tick: Tick, result: &mut TickResult) {
        let count = self.state.finalize_completed(tick).len();
        result.finalized = count;

        // Newly finalized patients sit at the tail of the finalized list
        let finalized = self.state.finalized_patients();
        for patient in &finalized[finalized.len() - count..] {
            self.event_log.log(Event::PatientFinalized {
                tick,
                patient_id: patient.id().to_string(),
                arrival_tick: patient.arrival_tick(),
                elapsed: tick - patient.arrival_tick(),
            });
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("run_id", &self.run_id)
            .field("current_tick", &self.current_tick())
            .field("tick_budget", &self.time_manager.tick_budget())
            .field("active", &self.state.num_active())
            .field("finalized", &self.state.num_finalized())
            .field("snapshots", &self.history.len())
            .finish()
    }
}

/// Validate, ingest and run a whole simulation in one call
pub fn simulate(config: SimulationConfig, scenario: Scenario) -> ClinicResult<SimulationRun> {
    Orchestrator::new(config, scenario)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioEntry;

    fn two_exam_config(budget: usize) -> SimulationConfig {
        SimulationConfig {
            tick_budget: budget,
            exams: vec![Exam::new("A", 5), Exam::new("B", 10)],
            routing: RoutingConfig::unconstrained(),
        }
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = two_exam_config(0);
        assert!(matches!(
            Orchestrator::new(config, Scenario::default()),
            Err(ClinicError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_exit_exam_outside_catalog_rejected() {
        let mut config = two_exam_config(10);
        config.routing.exit = Some("C".to_string());
        assert!(matches!(
            config.validate(),
            Err(ClinicError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_intake_exam_with_prerequisites_rejected() {
        let config = SimulationConfig {
            tick_budget: 10,
            exams: vec![Exam::new("Y", 2), Exam::new("X", 3).with_prerequisites(["Y"])],
            routing: RoutingConfig {
                intake: Some("X".to_string()),
                exit: None,
            },
        };
        assert!(matches!(
            config.validate(),
            Err(ClinicError::InvalidConfig(_))
        ));

        let scenario = Scenario::new(vec![ScenarioEntry::new("P1", 0, ["X", "Y"])]);
        assert!(Orchestrator::new(config, scenario).is_err());
    }

    #[test]
    fn test_exit_exam_gating_another_exam_rejected() {
        let config = SimulationConfig {
            tick_budget: 10,
            exams: vec![Exam::new("X", 2), Exam::new("B", 3).with_prerequisites(["X"])],
            routing: RoutingConfig {
                intake: None,
                exit: Some("X".to_string()),
            },
        };
        assert!(matches!(
            config.validate(),
            Err(ClinicError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_prerequisite_cycle_rejected_at_construction() {
        let config = SimulationConfig {
            tick_budget: 50,
            exams: vec![
                Exam::new("A", 2).with_prerequisites(["B"]),
                Exam::new("B", 3).with_prerequisites(["A"]),
            ],
            routing: RoutingConfig::unconstrained(),
        };
        let scenario = Scenario::new(vec![ScenarioEntry::new("P1", 0, ["A", "B"])]);
        assert!(matches!(
            Orchestrator::new(config, scenario),
            Err(ClinicError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_tick_after_budget_fails() {
        let mut orchestrator = Orchestrator::new(two_exam_config(2), Scenario::default()).unwrap();
        orchestrator.tick().unwrap();
        orchestrator.tick().unwrap();
        assert_eq!(
            orchestrator.tick(),
            Err(ClinicError::BudgetExhausted { budget: 2 })
        );
    }

    #[test]
    fn test_sequential_battery() {
        let scenario = Scenario::new(vec![ScenarioEntry::new("P1", 0, ["A", "B"])]);
        let mut orchestrator = Orchestrator::new(two_exam_config(20), scenario).unwrap();

        let t0 = orchestrator.tick().unwrap();
        assert_eq!((t0.arrivals, t0.services_started), (1, 1));
        assert_eq!(orchestrator.state().room("A").unwrap().remaining(), 5);

        for _ in 1..5 {
            orchestrator.tick().unwrap();
        }
        let t5 = orchestrator.tick().unwrap();
        assert_eq!((t5.exams_completed, t5.services_started), (1, 1));
        assert_eq!(orchestrator.state().room("B").unwrap().remaining(), 10);

        let run = orchestrator.run().unwrap();
        let report = run.history.completion_report();
        assert_eq!(report[0].completion_tick, 15);
        assert_eq!(report[0].total_time, 15);
    }
}
