//! Error reporting boundary
//!
//! The engine always returns `Result`. This layer decides what a caller
//! sees when an operation fails: a structured report, or a bare failure.

use serde::Serialize;

use crate::error::{CoreError, Result};

/// How failures surface at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Surface a structured `ErrorReport`
    #[default]
    Report,

    /// Swallow the error, leaving only a failed outcome
    Silent,
}

impl ErrorMode {
    /// `true` → `Report`, `false` → `Silent`
    pub fn from_flag(report: bool) -> Self {
        if report {
            ErrorMode::Report
        } else {
            ErrorMode::Silent
        }
    }
}

/// Serializable description of a failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error: bool,
    pub kind: String,
    pub message: String,
}

impl ErrorReport {
    pub fn from_error(err: &CoreError) -> Self {
        Self {
            error: true,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    /// `{"error":true,"kind":"...","message":"..."}`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Result of an operation after the boundary policy was applied
#[derive(Debug)]
pub enum Outcome<T> {
    /// The operation succeeded
    Done(T),

    /// The operation failed and `ErrorMode::Silent` dropped the error
    Failed,

    /// The operation failed and `ErrorMode::Report` kept the report
    Reported(ErrorReport),
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Failed | Outcome::Reported(_) => None,
        }
    }
}

/// Apply the boundary policy to an engine result
pub fn settle<T>(result: Result<T>, mode: ErrorMode) -> Outcome<T> {
    match (result, mode) {
        (Ok(value), _) => Outcome::Done(value),
        (Err(_), ErrorMode::Silent) => Outcome::Failed,
        (Err(err), ErrorMode::Report) => Outcome::Reported(ErrorReport::from_error(&err)),
    }
}
