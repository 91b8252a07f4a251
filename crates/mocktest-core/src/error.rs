//! Engine error types.
//!
//! `SessionError` covers caller mistakes against a session. `LoadError` and
//! `SubmitError` are raised by the collaborators at the engine's edges and
//! are defined here so the runner and the CLI can classify them without
//! string matching.

use std::sync::Arc;

use thiserror::Error;

use crate::model::OptionLabel;
use crate::report::Report;
use crate::session::SessionStatus;

/// Errors returned by session operations.
///
/// A failed operation never changes session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `start` was called with an empty question set or a zero duration.
    #[error("invalid session configuration: {0}")]
    InvalidConfiguration(String),

    /// A position outside `0..len` was addressed.
    #[error("position {position} is out of range for {len} questions")]
    InvalidPosition { position: usize, len: usize },

    /// The label is not one of the addressed question's options.
    #[error("option {option} is not available for question at position {position}")]
    InvalidOption { position: usize, option: OptionLabel },

    /// The operation is not valid in the session's current state.
    #[error("session is {status}, expected {expected}")]
    InvalidState {
        status: SessionStatus,
        expected: SessionStatus,
    },
}

/// Errors from a question set provider.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No question set exists for the exam identifier.
    #[error("exam not found: {0}")]
    NotFound(String),

    /// The backend answered with an error status.
    #[error("backend rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The payload could not be parsed into questions.
    #[error("failed to parse question set: {0}")]
    Parse(String),
}

impl LoadError {
    /// Returns `true` if retrying the same fetch cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, LoadError::NotFound(_) | LoadError::Parse(_))
    }
}

/// Errors from a report sink.
///
/// By the time one of these is raised the report has already been computed;
/// the failure is about delivery only.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The backend answered with an error status.
    #[error("backend rejected report (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// Writing the report locally failed.
    #[error("failed to store report: {0}")]
    Io(String),
}

impl SubmitError {
    /// Returns `true` if retrying delivery cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, SubmitError::Rejected { status, .. } if (400..500).contains(status) && *status != 429)
    }
}

/// Errors from driving a whole attempt through [`crate::runner::ExamRunner`].
#[derive(Debug, Error)]
pub enum RunError {
    /// Questions could not be loaded; no session was created.
    #[error("failed to load questions: {0}")]
    Load(#[from] LoadError),

    /// The session could not be started.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The command stream closed before the attempt was submitted.
    #[error("session abandoned before submission")]
    Abandoned,

    /// The report was produced but could not be delivered.
    ///
    /// The report is carried along so delivery can be retried without
    /// scoring the attempt again.
    #[error("report delivery failed: {source}")]
    Delivery {
        report: Arc<Report>,
        #[source]
        source: SubmitError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_permanence() {
        assert!(LoadError::NotFound("x".into()).is_permanent());
        assert!(LoadError::Parse("bad".into()).is_permanent());
        assert!(!LoadError::Network("reset".into()).is_permanent());
        assert!(!LoadError::Timeout(30).is_permanent());
    }

    #[test]
    fn submit_error_permanence() {
        let bad_request = SubmitError::Rejected {
            status: 400,
            message: "bad".into(),
        };
        let throttled = SubmitError::Rejected {
            status: 429,
            message: "slow down".into(),
        };
        let server = SubmitError::Rejected {
            status: 503,
            message: "down".into(),
        };
        assert!(bad_request.is_permanent());
        assert!(!throttled.is_permanent());
        assert!(!server.is_permanent());
        assert!(!SubmitError::Io("disk full".into()).is_permanent());
    }

    #[test]
    fn session_error_messages() {
        let err = SessionError::InvalidPosition {
            position: 7,
            len: 5,
        };
        assert_eq!(err.to_string(), "position 7 is out of range for 5 questions");

        let err = SessionError::InvalidState {
            status: SessionStatus::Submitted,
            expected: SessionStatus::InProgress,
        };
        assert_eq!(err.to_string(), "session is submitted, expected in_progress");
    }
}
