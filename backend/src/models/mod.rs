//! Domain models for the clinic simulator

pub mod event;
pub mod patient;
pub mod room;
pub mod state;

// Re-exports
pub use event::{Event, EventLog};
pub use patient::{Location, Patient, PatientError, PatientStatus};
pub use room::{Room, RoomRelease, RoomStatus};
pub use state::ClinicState;
