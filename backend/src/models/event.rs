//! Event logging for replay and auditing
//!
//! Every observable state change inside a tick is recorded as an `Event`.
//! Events are logged in the order the phases produce them, so the event
//! list of one tick reads as a narrative of that minute:
//!
//! - **Room advancement**: `ExamCompleted`, `PromotedFromQueue`
//! - **Arrivals**: `Arrival`
//! - **Routing**: `ServiceStarted`, `Queued`
//! - **Completion check**: `PatientFinalized`
//!
//! # Example
//!
//! ```rust
//! use clinic_simulator_core_rs::models::Event;
//!
//! let event = Event::ServiceStarted {
//!     tick: 3,
//!     patient_id: "Patient 1".to_string(),
//!     exam: "X-Ray".to_string(),
//! };
//!
//! assert_eq!(event.tick(), 3);
//! assert_eq!(event.event_type(), "ServiceStarted");
//! assert_eq!(event.exam(), Some("X-Ray"));
//! ```

use crate::core::{ExamId, PatientId, Tick};
use serde::{Deserialize, Serialize};

/// Simulation event capturing a state change
///
/// Every event belongs to exactly one patient and carries its tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Patient entered the clinic at reception
    Arrival { tick: Tick, patient_id: PatientId },

    /// Patient was routed straight into a free room
    ServiceStarted {
        tick: Tick,
        patient_id: PatientId,
        exam: ExamId,
    },

    /// Queue head took over a room released in the same tick
    PromotedFromQueue {
        tick: Tick,
        patient_id: PatientId,
        exam: ExamId,
    },

    /// Patient joined the waiting line of an occupied room
    Queued {
        tick: Tick,
        patient_id: PatientId,
        exam: ExamId,
        /// Zero-based position in the line after joining
        position: usize,
    },

    /// Service finished and the exam was recorded as completed
    ExamCompleted {
        tick: Tick,
        patient_id: PatientId,
        exam: ExamId,
    },

    /// Every required exam is done; the patient left the clinic
    PatientFinalized {
        tick: Tick,
        patient_id: PatientId,
        arrival_tick: Tick,
        elapsed: usize,
    },
}

impl Event {
    pub fn tick(&self) -> Tick {
        match self {
            Event::Arrival { tick, .. }
            | Event::ServiceStarted { tick, .. }
            | Event::PromotedFromQueue { tick, .. }
            | Event::Queued { tick, .. }
            | Event::ExamCompleted { tick, .. }
            | Event::PatientFinalized { tick, .. } => *tick,
        }
    }

    /// Short name of the event variant
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Arrival { .. } => "Arrival",
            Event::ServiceStarted { .. } => "ServiceStarted",
            Event::PromotedFromQueue { .. } => "PromotedFromQueue",
            Event::Queued { .. } => "Queued",
            Event::ExamCompleted { .. } => "ExamCompleted",
            Event::PatientFinalized { .. } => "PatientFinalized",
        }
    }

    pub fn patient_id(&self) -> &str {
        match self {
            Event::Arrival { patient_id, .. }
            | Event::ServiceStarted { patient_id, .. }
            | Event::PromotedFromQueue { patient_id, .. }
            | Event::Queued { patient_id, .. }
            | Event::ExamCompleted { patient_id, .. }
            | Event::PatientFinalized { patient_id, .. } => patient_id,
        }
    }

    /// Exam involved, for room-related events
    pub fn exam(&self) -> Option<&str> {
        match self {
            Event::ServiceStarted { exam, .. }
            | Event::PromotedFromQueue { exam, .. }
            | Event::Queued { exam, .. }
            | Event::ExamCompleted { exam, .. } => Some(exam),
            Event::Arrival { .. } | Event::PatientFinalized { .. } => None,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Arrival { tick, patient_id } => {
                write!(f, "[{}] {} arrived", tick, patient_id)
            }
            Event::ServiceStarted {
                tick,
                patient_id,
                exam,
            } => write!(f, "[{}] {} started {}", tick, patient_id, exam),
            Event::PromotedFromQueue {
                tick,
                patient_id,
                exam,
            } => write!(f, "[{}] {} promoted into {}", tick, patient_id, exam),
            Event::Queued {
                tick,
                patient_id,
                exam,
                position,
            } => write!(
                f,
                "[{}] {} queued for {} (position {})",
                tick,
                patient_id,
                exam,
                position + 1
            ),
            Event::ExamCompleted {
                tick,
                patient_id,
                exam,
            } => write!(f, "[{}] {} completed {}", tick, patient_id, exam),
            Event::PatientFinalized {
                tick,
                patient_id,
                elapsed,
                ..
            } => write!(f, "[{}] {} finished after {} min", tick, patient_id, elapsed),
        }
    }
}

/// Ordered event list with query helpers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_at_tick(&self, tick: Tick) -> Vec<&Event> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_patient(&self, patient_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.patient_id() == patient_id)
            .collect()
    }

    pub fn events_for_exam(&self, exam_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.exam() == Some(exam_id))
            .collect()
    }

    /// Move the logged events out, leaving the log empty
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl From<Vec<Event>> for EventLog {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl Extend<Event> for EventLog {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> EventLog {
        let mut log = EventLog::new();
        log.log(Event::Arrival {
            tick: 0,
            patient_id: "P1".to_string(),
        });
        log.log(Event::ServiceStarted {
            tick: 0,
            patient_id: "P1".to_string(),
            exam: "A".to_string(),
        });
        log.log(Event::Queued {
            tick: 0,
            patient_id: "P2".to_string(),
            exam: "A".to_string(),
            position: 0,
        });
        log.log(Event::ExamCompleted {
            tick: 5,
            patient_id: "P1".to_string(),
            exam: "A".to_string(),
        });
        log
    }

    #[test]
    fn test_queries() {
        let log = sample_log();
        assert_eq!(log.len(), 4);
        assert_eq!(log.events_at_tick(0).len(), 3);
        assert_eq!(log.events_for_patient("P1").len(), 3);
        assert_eq!(log.events_for_exam("A").len(), 3);
        assert_eq!(log.events_of_type("Queued").len(), 1);
    }

    #[test]
    fn test_drain_empties_log() {
        let mut log = sample_log();
        let events = log.drain();
        assert_eq!(events.len(), 4);
        assert!(log.is_empty());
    }

    #[test]
    fn test_serialized_with_type_tag() {
        let event = Event::PatientFinalized {
            tick: 15,
            patient_id: "P1".to_string(),
            arrival_tick: 0,
            elapsed: 15,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PatientFinalized");
        assert_eq!(json["elapsed"], 15);
    }

    #[test]
    fn test_display_is_one_based_queue_position() {
        let event = Event::Queued {
            tick: 2,
            patient_id: "P2".to_string(),
            exam: "X-Ray".to_string(),
            position: 0,
        };
        assert_eq!(event.to_string(), "[2] P2 queued for X-Ray (position 1)");
    }
}
