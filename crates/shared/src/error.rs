use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller bug: missing or malformed session id. No workflow state change.
    Validation,
    /// Duplicate-submission guard hit; informational, not a failure state.
    AlreadyInProgress,
    /// Network-level failure before the service produced a response.
    Transport,
    /// The service ran and reported failure; message is service-provided.
    Job,
    /// Results requested before or without a successful trigger.
    NotFound,
    /// Configured deadline expired before the pipeline completed.
    Timeout,
}

/// Normalized failure surfaced by the analysis pipeline: always a
/// human-readable message plus a machine-checkable kind.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct AnalysisError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AnalysisError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn job(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Job, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_and_message() {
        let err = AnalysisError::job("capacity exceeded");
        assert_eq!(err.to_string(), "Job: capacity exceeded");
        assert_eq!(err.kind, ErrorKind::Job);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_value(ErrorKind::AlreadyInProgress).expect("serialize");
        assert_eq!(json, "already_in_progress");
    }
}
