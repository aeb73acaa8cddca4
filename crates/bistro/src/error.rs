//! Error types for the restaurant service.
//!
//! Only construction and lifecycle misuse surface as [`Error`]. Transient
//! unavailability (an empty or full counter, a delivery with no waiting table
//! in range) is reported through `Option`/`Result` values that hand ownership
//! of the dish back to the caller, and cancellation is reported by the
//! counter's own [`CounterError`].
//!
//! [`CounterError`]: crate::CounterError

use crate::Lifecycle;
use thiserror::Error;

/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `bistro` can emit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The configuration record was rejected before any task was launched.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A lifecycle operation was attempted from a state that does not allow
    /// it, e.g. starting a restaurant twice.
    #[error("Cannot {operation} a restaurant that is {state}")]
    InvalidState {
        operation: &'static str,
        state: Lifecycle,
    },

    /// The table id does not exist in the registry.
    #[error("Unknown table {id}")]
    UnknownTable { id: usize },

    /// `start` was called outside of a Tokio runtime.
    #[error("No Tokio runtime to launch tasks on")]
    MissingRuntime,
}

impl Error {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
