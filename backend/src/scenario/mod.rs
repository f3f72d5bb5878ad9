//! Scenario definition and ingestion
//!
//! A scenario lists who arrives when, and which exams each patient needs.
//! It is produced before the tick loop starts (by hand, from JSON, or by
//! [`generator::ScenarioGenerator`]) and validated once against the catalog.
//!
//! Arrival ordering is not validated: entries are processed in scenario order
//! within each arrival tick.

use crate::catalog::ExamCatalog;
use crate::core::{ExamId, PatientId, Tick};
use crate::error::{ClinicError, ClinicResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub mod generator;

pub use generator::{GeneratorConfig, ScenarioGenerator};

/// One scheduled patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioEntry {
    pub patient_id: PatientId,
    pub arrival_tick: Tick,
    pub required_exams: Vec<ExamId>,
}

impl ScenarioEntry {
    pub fn new<I, S>(patient_id: impl Into<String>, arrival_tick: Tick, exams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patient_id: patient_id.into(),
            arrival_tick,
            required_exams: exams.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered list of scheduled patients
///
/// Serialized as a plain JSON array of entries.
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::scenario::{Scenario, ScenarioEntry};
/// use clinic_simulator_core_rs::ExamCatalog;
///
/// let scenario = Scenario::new(vec![
///     ScenarioEntry::new("Patient 1", 0, ["Blood Test", "X-Ray"]),
///     ScenarioEntry::new("Patient 2", 3, ["Audiometry"]),
/// ]);
/// scenario.validate(&ExamCatalog::occupational_health()).unwrap();
/// assert_eq!(scenario.arrivals_at(3).count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scenario {
    entries: Vec<ScenarioEntry>,
}

impl Scenario {
    pub fn new(entries: Vec<ScenarioEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ScenarioEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, patient_id: &str) -> Option<&ScenarioEntry> {
        self.entries.iter().find(|e| e.patient_id == patient_id)
    }

    /// Entries arriving at `tick`, in scenario order
    pub fn arrivals_at(&self, tick: Tick) -> impl Iterator<Item = &ScenarioEntry> {
        self.entries.iter().filter(move |e| e.arrival_tick == tick)
    }

    /// Check every entry against the catalog
    ///
    /// # Errors
    /// - `EmptyRequiredSet`: an entry lists no exams
    /// - `UnknownExam`: an exam is not in the catalog
    /// - `DuplicateExam`: an exam appears twice in one battery
    /// - `DuplicatePatient`: two entries share a patient identifier
    pub fn validate(&self, catalog: &ExamCatalog) -> ClinicResult<()> {
        let mut seen_patients = HashSet::with_capacity(self.entries.len());

        for entry in &self.entries {
            if entry.required_exams.is_empty() {
                return Err(ClinicError::EmptyRequiredSet(entry.patient_id.clone()));
            }

            let mut seen_exams = HashSet::with_capacity(entry.required_exams.len());
            for exam in &entry.required_exams {
                if !catalog.contains(exam) {
                    return Err(ClinicError::UnknownExam(exam.clone()));
                }
                if !seen_exams.insert(exam.as_str()) {
                    return Err(ClinicError::DuplicateExam {
                        patient: entry.patient_id.clone(),
                        exam: exam.clone(),
                    });
                }
            }

            if !seen_patients.insert(entry.patient_id.as_str()) {
                return Err(ClinicError::DuplicatePatient(entry.patient_id.clone()));
            }
        }

        Ok(())
    }

    /// Entry indices grouped by arrival tick, scenario order kept per tick
    pub(crate) fn arrival_schedule(&self) -> BTreeMap<Tick, Vec<usize>> {
        let mut schedule: BTreeMap<Tick, Vec<usize>> = BTreeMap::new();
        for (index, entry) in self.entries.iter().enumerate() {
            schedule.entry(entry.arrival_tick).or_default().push(index);
        }
        schedule
    }

    /// Last arrival tick, if any patient is scheduled
    pub fn last_arrival(&self) -> Option<Tick> {
        self.entries.iter().map(|e| e.arrival_tick).max()
    }
}

impl From<Vec<ScenarioEntry>> for Scenario {
    fn from(entries: Vec<ScenarioEntry>) -> Self {
        Self::new(entries)
    }
}
