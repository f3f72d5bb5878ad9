//! PyO3 wrapper for a simulation run

use pyo3::prelude::*;

use super::types::{
    clinic_error_to_py, parse_json, persistence_error_to_py, tick_out_of_range, to_json,
};
use crate::history::SimulationRun;
use crate::orchestrator::{simulate, SimulationConfig};
use crate::persistence::{HistoryRecord, TickRecord};
use crate::scenario::Scenario;

/// Python handle on a finished run
///
/// # Example (from Python)
///
/// ```python
/// from clinic_simulator_core_rs import ClinicSimulation
///
/// scenario = '[{"patient_id": "Patient 1", "arrival_tick": 0, "required_exams": ["X-Ray"]}]'
/// sim = ClinicSimulation.run('{"tick_budget": 30}', scenario)
/// print(sim.num_ticks(), sim.next_step_json(0, "Patient 1"))
/// ```
#[pyclass(name = "ClinicSimulation")]
pub struct PyClinicSimulation {
    run: SimulationRun,
}

#[pymethods]
impl PyClinicSimulation {
    /// Run a simulation from JSON configuration and scenario
    ///
    /// Raises ValueError for invalid input and RuntimeError for engine
    /// failures.
    #[staticmethod]
    fn run(config_json: &str, scenario_json: &str) -> PyResult<Self> {
        let config: SimulationConfig = parse_json("config", config_json)?;
        let scenario: Scenario = parse_json("scenario", scenario_json)?;
        let run = simulate(config, scenario).map_err(clinic_error_to_py)?;
        Ok(Self { run })
    }

    fn run_id(&self) -> String {
        self.run.run_id.to_string()
    }

    fn num_ticks(&self) -> usize {
        self.run.history.len()
    }

    /// Snapshot of one tick, keyed by room and patient identifiers
    fn snapshot_json(&self, tick: usize) -> PyResult<String> {
        let snapshot = self
            .run
            .history
            .snapshot(tick)
            .ok_or_else(|| tick_out_of_range(tick, self.run.history.len()))?;
        to_json(&TickRecord::from(snapshot))
    }

    /// Whole history record
    fn history_json(&self) -> PyResult<String> {
        HistoryRecord::from(&self.run)
            .to_json()
            .map_err(persistence_error_to_py)
    }

    /// Projected next step of a patient at `tick`
    fn next_step_json(&self, tick: usize, patient_id: &str) -> PyResult<String> {
        let step = self
            .run
            .next_step(tick, patient_id)
            .map_err(clinic_error_to_py)?;
        to_json(&step)
    }

    fn summary_json(&self) -> PyResult<String> {
        to_json(&self.run.history.summary())
    }
}
