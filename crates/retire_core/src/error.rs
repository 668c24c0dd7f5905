//! Error taxonomy for the simulation engine.
//!
//! Mirrors the failure semantics in the specification: validation errors are
//! surfaced and non-retriable, numerical failures are counted and contained,
//! worker failures are retried once, and configuration errors fail fast at
//! startup. Nothing in this module swallows an error silently.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// A single field-level validation failure, surfaced to callers verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Top-level error type for everything that can go wrong running the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or out-of-range input parameters. Non-retriable.
    #[error("{0} validation error(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// A batch's non-finite trial rate exceeded the 0.1% tolerance.
    #[error("numerical failure rate {rate:.4}% exceeds tolerance ({non_finite}/{total} trials)")]
    NumericalFailureRateExceeded {
        non_finite: usize,
        total: usize,
        rate: f64,
    },

    /// The caller's wall-clock budget was exceeded and partial results were
    /// not permitted.
    #[error("simulation exceeded the allotted time budget")]
    Timeout,

    /// A parallel worker could not be spawned or failed twice in a row.
    #[error("worker execution failed: {0}")]
    Worker(String),

    /// A required bundle (e.g. the CMA version) was missing and has no
    /// built-in fallback. Fails fast at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    #[must_use]
    pub fn validation(errors: Vec<FieldError>) -> Self {
        EngineError::Validation(errors)
    }
}
