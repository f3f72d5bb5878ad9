//! Conversions at the Python boundary

use pyo3::exceptions::{PyIndexError, PyRuntimeError, PyValueError};
use pyo3::PyErr;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ClinicError;
use crate::persistence::PersistenceError;

/// Map an engine error onto the closest Python exception
///
/// Input problems (configuration, scenario) raise `ValueError`; anything
/// raised by the tick loop itself raises `RuntimeError`.
pub fn clinic_error_to_py(err: ClinicError) -> PyErr {
    match err {
        ClinicError::UnknownExam(_)
        | ClinicError::EmptyRequiredSet(_)
        | ClinicError::DuplicatePatient(_)
        | ClinicError::DuplicateExam { .. }
        | ClinicError::InvalidConfig(_) => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

pub fn persistence_error_to_py(err: PersistenceError) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

/// Parse a JSON argument, raising `ValueError` naming the argument
pub fn parse_json<T: DeserializeOwned>(name: &str, json: &str) -> Result<T, PyErr> {
    serde_json::from_str(json).map_err(|e| PyValueError::new_err(format!("invalid {}: {}", name, e)))
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, PyErr> {
    serde_json::to_string(value).map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

pub fn tick_out_of_range(tick: usize, len: usize) -> PyErr {
    PyIndexError::new_err(format!("tick {} outside history of {} ticks", tick, len))
}
