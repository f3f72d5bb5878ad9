//! Run cache
//!
//! Memoizes whole runs keyed by the fingerprint of their inputs. The loop is
//! deterministic, so a cached run is indistinguishable from a fresh one
//! (apart from its run id). Caching lives outside the loop and never changes
//! its output.

use crate::error::ClinicError;
use crate::history::SimulationRun;
use crate::orchestrator::{simulate, SimulationConfig};
use crate::persistence::{fingerprint, PersistenceError};
use crate::scenario::Scenario;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cannot fingerprint run inputs: {0}")]
    Fingerprint(#[from] PersistenceError),

    #[error(transparent)]
    Simulation(#[from] ClinicError),
}

/// In-memory cache of simulation runs
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::cache::RunCache;
/// use clinic_simulator_core_rs::orchestrator::SimulationConfig;
/// use clinic_simulator_core_rs::scenario::{Scenario, ScenarioEntry};
///
/// let mut cache = RunCache::new();
/// let config = SimulationConfig { tick_budget: 20, ..Default::default() };
/// let scenario = Scenario::new(vec![ScenarioEntry::new("Patient 1", 0, ["X-Ray"])]);
///
/// let first = cache.get_or_run(&config, &scenario).unwrap().run_id;
/// let second = cache.get_or_run(&config, &scenario).unwrap().run_id;
/// assert_eq!(first, second);
/// assert_eq!((cache.hits(), cache.misses()), (1, 1));
/// ```
#[derive(Debug, Default)]
pub struct RunCache {
    runs: HashMap<String, SimulationRun>,
    hits: usize,
    misses: usize,
}

impl RunCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key of a (config, scenario) pair
    pub fn key(config: &SimulationConfig, scenario: &Scenario) -> Result<String, CacheError> {
        Ok(fingerprint(&(config, scenario))?)
    }

    /// Cached run for these inputs, simulating it on a miss
    pub fn get_or_run(
        &mut self,
        config: &SimulationConfig,
        scenario: &Scenario,
    ) -> Result<&SimulationRun, CacheError> {
        let key = Self::key(config, scenario)?;

        if self.runs.contains_key(&key) {
            self.hits += 1;
            log::debug!("Run cache hit for {}", &key[..12]);
        } else {
            self.misses += 1;
            log::debug!("Run cache miss for {}", &key[..12]);
            let run = simulate(config.clone(), scenario.clone())?;
            self.runs.insert(key.clone(), run);
        }

        Ok(&self.runs[&key])
    }

    pub fn contains(&self, config: &SimulationConfig, scenario: &Scenario) -> bool {
        Self::key(config, scenario)
            .map(|key| self.runs.contains_key(&key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }
}
