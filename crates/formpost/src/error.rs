//! Error types for the submission pipeline.
//!
//! Three families of errors exist, matching the three collaborators a
//! submission touches:
//!
//! - [`SubmissionError`]: fatal errors that stop a submission. These are
//!   always logged and reported through the error notification, but never
//!   escape [`SubmissionHandler::submit`](crate::SubmissionHandler::submit).
//! - [`StoreError`]: failures raised by a spreadsheet backend.
//! - [`NotifyError`]: failures raised by a notifier. Notification errors are
//!   never fatal and never propagated past the handler.

use core::fmt;

/// A result type defaulting to [`SubmissionError`].
pub type Result<T, E = SubmissionError> = core::result::Result<T, E>;

/// The stage of the submission state machine.
///
/// A submission moves `Idle → Validating → Extracting → Persisting →
/// Notifying → Done`. [`Stage::Error`] is absorbing and is reachable from
/// `Validating`, `Extracting` and `Persisting`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    Validating,
    Extracting,
    Persisting,
    Notifying,
    Done,
    Error,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Extracting => "extracting",
            Self::Persisting => "persisting",
            Self::Notifying => "notifying",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal errors that abort a submission.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum SubmissionError {
    /// The target label in answer position 1 is not in the target table.
    #[error("Validation error: unknown target selection {label:?}")]
    Validation { label: String },

    /// The answer sequence is too short to carry the required header slots.
    #[error("Validation error: expected at least {expected} answers, got {actual}")]
    MissingHeader { expected: usize, actual: usize },

    /// The spreadsheet or the target worksheet does not exist.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// The store could not be read or rejected a write. Rows appended before
    /// the failure stay committed.
    #[error("Persistence error after {persisted} row(s): {source}")]
    Persistence {
        persisted: usize,
        #[source]
        source: StoreError,
    },
}

impl SubmissionError {
    /// The stage in which this error arose.
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Validation { .. } | Self::MissingHeader { .. } => Stage::Validating,
            Self::NotFound { .. } | Self::Persistence { .. } => Stage::Persisting,
        }
    }
}

/// Errors produced by spreadsheet backends.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The spreadsheet id does not resolve to a spreadsheet.
    #[error("spreadsheet {id:?} not found")]
    SpreadsheetNotFound { id: String },

    /// The backend could not be reached.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The backend refused the request.
    #[error("store rejected request: {reason}")]
    Rejected { reason: String },

    /// The backend answered with a payload that could not be interpreted.
    #[error("malformed store response: {reason}")]
    Malformed { reason: String },

    /// The id column already holds the largest representable id.
    #[error("id space exhausted in worksheet {worksheet:?}")]
    IdSpaceExhausted { worksheet: String },
}

/// Errors produced while dispatching a notification.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotifyError {
    /// No notification channel is configured.
    #[error("notifications are disabled")]
    Disabled,

    /// The request never produced a response.
    #[error("notification transport error: {reason}")]
    Transport { reason: String },

    /// The webhook answered with a non-success status.
    #[error("notification rejected with status {0}")]
    Status(u16),

    /// The payload could not be rendered.
    #[error("notification payload error: {reason}")]
    Payload { reason: String },
}
