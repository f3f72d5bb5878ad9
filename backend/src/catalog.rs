//! Exam catalog
//!
//! Static mapping of exam identifiers to service duration and precedence
//! rules. The catalog is built once at process start and is read-only
//! afterwards. Declaration order is significant: it fixes room order in the
//! clinic state and breaks ties in the routing policy.

use crate::core::ExamId;
use crate::error::{ClinicError, ClinicResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const ELECTROCARDIOGRAM: &str = "Electrocardiogram";
pub const SPIROMETRY: &str = "Spirometry";
pub const ELECTROENCEPHALOGRAM: &str = "Electroencephalogram";
pub const STRESS_TEST: &str = "Stress Test";
pub const TVI: &str = "TVI";
pub const AUDIOMETRY: &str = "Audiometry";
pub const OPHTHALMOLOGY_CONSULT: &str = "Ophthalmology Consult";
pub const OCCUPATIONAL_CONSULT: &str = "Occupational Consult";
pub const X_RAY: &str = "X-Ray";
pub const BLOOD_TEST: &str = "Blood Test";

/// A single exam type: identifier, service duration and prerequisites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    /// Unique exam identifier; also names the room
    pub id: ExamId,

    /// Service time in minutes (ticks), must be > 0
    pub duration: usize,

    /// Exams that must be completed first, when they are part of the
    /// patient's own battery
    #[serde(default)]
    pub prerequisites: Vec<ExamId>,
}

impl Exam {
    /// Exam with no prerequisites
    pub fn new(id: impl Into<String>, duration: usize) -> Self {
        Self {
            id: id.into(),
            duration,
            prerequisites: Vec::new(),
        }
    }

    /// Builder-style prerequisite declaration
    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }
}

/// Validated, ordered exam catalog
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::catalog::{Exam, ExamCatalog};
///
/// let catalog = ExamCatalog::new(vec![
///     Exam::new("A", 5),
///     Exam::new("B", 10).with_prerequisites(["A"]),
/// ]).unwrap();
///
/// assert_eq!(catalog.duration("B").unwrap(), 10);
/// assert_eq!(catalog.precedence_of("B").unwrap(), ["A".to_string()]);
/// assert!(catalog.duration("C").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExamCatalog {
    exams: Vec<Exam>,
    index: HashMap<ExamId, usize>,
}

impl ExamCatalog {
    /// Build a catalog, validating ids, durations and prerequisite references
    pub fn new(exams: Vec<Exam>) -> ClinicResult<Self> {
        if exams.is_empty() {
            return Err(ClinicError::InvalidConfig(
                "catalog must declare at least one exam".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(exams.len());
        for (position, exam) in exams.iter().enumerate() {
            if exam.duration == 0 {
                return Err(ClinicError::InvalidConfig(format!(
                    "exam {} must have a positive duration",
                    exam.id
                )));
            }
            if index.insert(exam.id.clone(), position).is_some() {
                return Err(ClinicError::InvalidConfig(format!(
                    "duplicate exam ID: {}",
                    exam.id
                )));
            }
        }

        for exam in &exams {
            for prerequisite in &exam.prerequisites {
                if !index.contains_key(prerequisite) {
                    return Err(ClinicError::UnknownExam(prerequisite.clone()));
                }
                if prerequisite == &exam.id {
                    return Err(ClinicError::InvalidConfig(format!(
                        "exam {} lists itself as a prerequisite",
                        exam.id
                    )));
                }
            }
        }

        if let Some(exam) = find_cycle(&exams, &index) {
            return Err(ClinicError::InvalidConfig(format!(
                "prerequisites of {} form a cycle",
                exam
            )));
        }

        Ok(Self { exams, index })
    }

    /// The occupational-health battery offered by the clinic
    pub fn occupational_health() -> Self {
        Self::new(default_exams()).expect("built-in catalog is valid")
    }

    /// Service duration of an exam
    pub fn duration(&self, exam_id: &str) -> ClinicResult<usize> {
        self.require(exam_id).map(|exam| exam.duration)
    }

    /// Declared prerequisites of an exam (empty if none)
    pub fn precedence_of(&self, exam_id: &str) -> ClinicResult<&[ExamId]> {
        self.require(exam_id).map(|exam| exam.prerequisites.as_slice())
    }

    pub fn get(&self, exam_id: &str) -> Option<&Exam> {
        self.index.get(exam_id).map(|&i| &self.exams[i])
    }

    pub fn contains(&self, exam_id: &str) -> bool {
        self.index.contains_key(exam_id)
    }

    /// Declaration position, used as the deterministic tie-break
    pub fn position(&self, exam_id: &str) -> Option<usize> {
        self.index.get(exam_id).copied()
    }

    /// Exam identifiers in declaration order
    pub fn exam_ids(&self) -> impl Iterator<Item = &ExamId> {
        self.exams.iter().map(|exam| &exam.id)
    }

    pub fn exams(&self) -> &[Exam] {
        &self.exams
    }

    pub fn len(&self) -> usize {
        self.exams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }

    fn require(&self, exam_id: &str) -> ClinicResult<&Exam> {
        self.get(exam_id)
            .ok_or_else(|| ClinicError::UnknownExam(exam_id.to_string()))
    }
}

/// First exam found on a prerequisite cycle, if any
///
/// Iterative DFS over the prerequisite graph; ids are already known to be
/// present in `index`.
fn find_cycle<'a>(exams: &'a [Exam], index: &HashMap<ExamId, usize>) -> Option<&'a str> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; exams.len()];
    for root in 0..exams.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        // (exam position, next prerequisite to visit)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::InProgress;

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let Some(prerequisite) = exams[node].prerequisites.get(next) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            let child = index[prerequisite];
            match marks[child] {
                Mark::InProgress => return Some(&exams[child].id),
                Mark::Unvisited => {
                    marks[child] = Mark::InProgress;
                    stack.push((child, 0));
                }
                Mark::Done => {}
            }
        }
    }
    None
}

/// Exams, durations and prerequisites of the default clinic
pub fn default_exams() -> Vec<Exam> {
    vec![
        Exam::new(ELECTROCARDIOGRAM, 8),
        Exam::new(SPIROMETRY, 10),
        Exam::new(ELECTROENCEPHALOGRAM, 20),
        Exam::new(STRESS_TEST, 25).with_prerequisites([
            ELECTROCARDIOGRAM,
            ELECTROENCEPHALOGRAM,
            SPIROMETRY,
            OPHTHALMOLOGY_CONSULT,
        ]),
        Exam::new(TVI, 6),
        Exam::new(AUDIOMETRY, 8),
        Exam::new(OPHTHALMOLOGY_CONSULT, 15),
        Exam::new(OCCUPATIONAL_CONSULT, 12),
        Exam::new(X_RAY, 6),
        Exam::new(BLOOD_TEST, 5),
    ]
}
