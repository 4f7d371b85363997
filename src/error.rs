//! Typed error taxonomy for the core.
//!
//! Every public operation returns [`Result<T>`] instead of throwing. The
//! variant families mirror the five error kinds described in the save/load
//! and generation contracts: validation, I/O, format, resource lookup, and
//! cancellation (which is not actually an error, see [`BuildOutcome`]).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Out-of-range arguments, invalid chunk size, duplicate id registration.
    #[error("validation error in `{what}`: {message}")]
    Validation { what: String, message: String },

    /// Stream read/write failure, missing file, permission.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad magic, bad type tag, unresolved string-cache id, schema mismatch,
    /// voxel-blob size mismatch.
    #[error("format error: {0}")]
    Format(String),

    /// Unknown noise generator / feature placement / distribution control /
    /// parameter id that could not fall back to `default`.
    #[error("unknown {kind} id: `{id}`")]
    UnknownResource { kind: &'static str, id: String },
}

impl CoreError {
    pub fn validation(what: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            what: what.into(),
            message: message.into(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        CoreError::Format(message.into())
    }

    pub fn unknown_resource(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::UnknownResource {
            kind,
            id: id.into(),
        }
    }
}

/// Outcome of a cancellable, long-running build (mesh generation, a
/// pre-generation task). Cancellation is not an error: callers match on a
/// distinct "canceled" variant instead of treating an aborted build as a
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome<T> {
    Completed(T),
    Canceled,
}

impl<T> BuildOutcome<T> {
    pub fn is_canceled(&self) -> bool {
        matches!(self, BuildOutcome::Canceled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            BuildOutcome::Completed(v) => Some(v),
            BuildOutcome::Canceled => None,
        }
    }
}
