//! Random scenario generation
//!
//! Builds a `Scenario` from a handful of knobs and a seed. Generation runs
//! once, before the tick loop; the loop itself is fully deterministic given
//! the resulting scenario.
//!
//! # Key Principles
//!
//! 1. **Determinism**: same seed + same config → same scenario
//! 2. **Batteries without repeats**: exams are sampled without replacement
//! 3. **Satisfiable precedence**: a gated exam drawn with none of its
//!    prerequisites gets one random prerequisite appended
//!
//! # Example
//!
//! ```
//! use clinic_simulator_core_rs::scenario::{GeneratorConfig, ScenarioGenerator};
//! use clinic_simulator_core_rs::ExamCatalog;
//!
//! let catalog = ExamCatalog::occupational_health();
//! let config = GeneratorConfig { num_patients: 5, seed: 7, ..Default::default() };
//!
//! let scenario = ScenarioGenerator::new(config, &catalog).unwrap().generate();
//! assert_eq!(scenario.len(), 5);
//! assert_eq!(scenario.entries()[0].patient_id, "Patient 1");
//! assert_eq!(scenario.entries()[0].arrival_tick, 0);
//! scenario.validate(&catalog).unwrap();
//! ```

use super::{Scenario, ScenarioEntry};
use crate::catalog::ExamCatalog;
use crate::core::{ExamId, Tick};
use crate::error::{ClinicError, ClinicResult};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

/// Smallest battery the generator draws, when the catalog allows it
const MIN_BATTERY: usize = 2;

/// Largest accepted mean gap between arrivals, in ticks
pub const MAX_ARRIVAL_INTERVAL: usize = u32::MAX as usize;

/// Spread of the arrival gap around the configured interval
const ARRIVAL_JITTER: i64 = 2;

/// Knobs of the random scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub num_patients: usize,

    /// Mean gap between consecutive arrivals, in ticks
    pub arrival_interval: usize,

    /// Upper bound of the battery size (inclusive)
    pub max_exams_per_patient: usize,

    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_patients: 10,
            arrival_interval: 4,
            max_exams_per_patient: 3,
            seed: 42,
        }
    }
}

/// Seeded scenario generator over a catalog
pub struct ScenarioGenerator<'a> {
    config: GeneratorConfig,
    catalog: &'a ExamCatalog,
    rng: RngManager,
}

impl<'a> ScenarioGenerator<'a> {
    /// # Errors
    /// `InvalidConfig` when `max_exams_per_patient` is below the smallest
    /// battery the catalog allows (2, or 1 for a single-exam catalog), or
    /// when `arrival_interval` exceeds [`MAX_ARRIVAL_INTERVAL`]
    pub fn new(config: GeneratorConfig, catalog: &'a ExamCatalog) -> ClinicResult<Self> {
        let min_battery = MIN_BATTERY.min(catalog.len());
        if config.max_exams_per_patient < min_battery {
            return Err(ClinicError::InvalidConfig(format!(
                "max_exams_per_patient must be at least {}",
                min_battery
            )));
        }
        if config.arrival_interval > MAX_ARRIVAL_INTERVAL {
            return Err(ClinicError::InvalidConfig(format!(
                "arrival_interval must not exceed {}",
                MAX_ARRIVAL_INTERVAL
            )));
        }

        let rng = RngManager::new(config.seed);
        Ok(Self {
            config,
            catalog,
            rng,
        })
    }

    /// Draw the whole scenario
    pub fn generate(&mut self) -> Scenario {
        let mut entries = Vec::with_capacity(self.config.num_patients);
        let mut arrival: Tick = 0;

        for i in 0..self.config.num_patients {
            let exams = self.draw_battery();
            entries.push(ScenarioEntry {
                patient_id: format!("Patient {}", i + 1),
                arrival_tick: arrival,
                required_exams: exams,
            });
            arrival += self.draw_gap();
        }

        log::debug!(
            "Generated {} patients over {} ticks (seed {})",
            entries.len(),
            arrival,
            self.config.seed
        );
        Scenario::new(entries)
    }

    fn draw_battery(&mut self) -> Vec<ExamId> {
        let available = self.catalog.len();
        let max = self.config.max_exams_per_patient.min(available);
        let min = MIN_BATTERY.min(max);
        let size = self.rng.range_inclusive(min as i64, max as i64) as usize;

        let exams = self.catalog.exams();
        let mut battery: Vec<ExamId> = self
            .rng
            .sample_indices(available, size)
            .into_iter()
            .map(|i| exams[i].id.clone())
            .collect();

        // Only exams from the original draw are checked for prerequisites
        let drawn = battery.clone();
        for exam in &drawn {
            let Some(definition) = self.catalog.get(exam) else {
                continue;
            };
            let prerequisites = &definition.prerequisites;
            if prerequisites.is_empty() || prerequisites.iter().any(|p| battery.contains(p)) {
                continue;
            }
            let pick = self.rng.index(prerequisites.len());
            battery.push(prerequisites[pick].clone());
        }

        battery
    }

    fn draw_gap(&mut self) -> Tick {
        let interval = self.config.arrival_interval as i64;
        let gap = self
            .rng
            .range_inclusive(interval - ARRIVAL_JITTER, interval + ARRIVAL_JITTER);
        gap.max(0) as Tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Exam, STRESS_TEST};

    #[test]
    fn test_zero_max_exams_rejected() {
        let catalog = ExamCatalog::occupational_health();
        let config = GeneratorConfig {
            max_exams_per_patient: 0,
            ..Default::default()
        };
        assert!(matches!(
            ScenarioGenerator::new(config, &catalog),
            Err(ClinicError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_exam_batteries_rejected_for_larger_catalogs() {
        let catalog = ExamCatalog::occupational_health();
        let config = GeneratorConfig {
            max_exams_per_patient: 1,
            ..Default::default()
        };
        assert!(matches!(
            ScenarioGenerator::new(config, &catalog),
            Err(ClinicError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_huge_interval_rejected() {
        let catalog = ExamCatalog::occupational_health();
        let config = GeneratorConfig {
            arrival_interval: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(
            ScenarioGenerator::new(config, &catalog),
            Err(ClinicError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_largest_interval_draws_without_overflow() {
        let catalog = ExamCatalog::occupational_health();
        let config = GeneratorConfig {
            num_patients: 3,
            arrival_interval: MAX_ARRIVAL_INTERVAL,
            ..Default::default()
        };
        let scenario = ScenarioGenerator::new(config, &catalog).unwrap().generate();
        let gap = scenario.entries()[1].arrival_tick - scenario.entries()[0].arrival_tick;
        assert!(gap >= MAX_ARRIVAL_INTERVAL - 2);
        assert!(gap <= MAX_ARRIVAL_INTERVAL + 2);
    }

    #[test]
    fn test_gated_exam_gets_a_prerequisite() {
        let catalog = ExamCatalog::occupational_health();
        let config = GeneratorConfig {
            num_patients: 200,
            max_exams_per_patient: 4,
            seed: 3,
            ..Default::default()
        };
        let scenario = ScenarioGenerator::new(config, &catalog).unwrap().generate();
        let prerequisites = catalog.precedence_of(STRESS_TEST).unwrap();

        for entry in scenario.entries() {
            if entry.required_exams.iter().any(|e| e == STRESS_TEST) {
                assert!(entry
                    .required_exams
                    .iter()
                    .any(|e| prerequisites.contains(e)));
            }
        }
    }

    #[test]
    fn test_single_exam_catalog_yields_single_exam_batteries() {
        let catalog = ExamCatalog::new(vec![Exam::new("Only", 3)]).unwrap();
        let config = GeneratorConfig {
            num_patients: 3,
            max_exams_per_patient: 5,
            ..Default::default()
        };
        let scenario = ScenarioGenerator::new(config, &catalog).unwrap().generate();
        assert!(scenario.entries().iter().all(|e| e.required_exams == ["Only"]));
    }

    #[test]
    fn test_small_interval_never_goes_backwards() {
        let catalog = ExamCatalog::occupational_health();
        let config = GeneratorConfig {
            num_patients: 50,
            arrival_interval: 1,
            ..Default::default()
        };
        let scenario = ScenarioGenerator::new(config, &catalog).unwrap().generate();
        let arrivals: Vec<_> = scenario.entries().iter().map(|e| e.arrival_tick).collect();
        assert!(arrivals.windows(2).all(|w| w[0] <= w[1]));
    }
}
