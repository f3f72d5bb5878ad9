//! Core primitives: time management and shared identifier types

pub mod time;

/// A simulation tick. One tick = one simulated minute.
pub type Tick = usize;

/// Exam identifier (also names the room that performs the exam)
pub type ExamId = String;

/// Patient identifier as supplied by the scenario
pub type PatientId = String;
