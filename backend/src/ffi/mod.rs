//! Python bindings
//!
//! The boundary is deliberately narrow: configuration and scenarios enter as
//! JSON strings, snapshots and previews leave as JSON strings. No engine type
//! crosses into Python.

pub mod simulation;
pub mod types;
