//! Error types for the popup configuration protocol.

use thiserror::Error;

/// Failures surfaced by the popup configuration protocol.
///
/// There are only two kinds. [`ConfigError::Internal`] marks a
/// programming-contract violation by the surrounding host code and is fatal
/// to the current call, not to the whole connection. [`ConfigError::UserRejected`]
/// is the normal, non-exceptional outcome of the user abandoning the popup
/// before completing a selection; callers must treat it as an expected result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The protocol was misused by the caller, e.g. a payload was supplied
    /// for an event type that does not accept one, or a link-URL request
    /// arrived with no provider configured.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The popup went away before the user completed the pending selection.
    #[error("Request rejected")]
    UserRejected,
}
