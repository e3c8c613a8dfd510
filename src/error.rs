//! Error types for the LKDR client

use thiserror::Error;

use crate::transport::{ErrorCode, RemoteError};

/// Main error type for LKDR client operations
#[derive(Error, Debug)]
pub enum LkdrError {
    /// Invalid client configuration (missing collaborator, empty field)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The remote service rejected the request with a structured code/message
    #[error("Remote error: {0}")]
    Remote(RemoteError),

    /// The remote service returned a non-success status with no decodable body
    #[error("Unexpected status: {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    /// Network error during an HTTP request
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Session store failure during load or persist
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Challenge provider failed to produce a captcha solution
    #[error("Challenge error: {0}")]
    Challenge(String),

    /// Code provider failed to produce a confirmation code
    #[error("Confirmation error: {0}")]
    Confirmation(String),

    /// Ambient cancellation observed at a suspension point
    #[error("Operation cancelled")]
    Cancelled,

    /// A failure annotated with the step that produced it
    #[error("{step}: {source}")]
    Step {
        /// Name of the step that failed (e.g. "authorize", "refresh token")
        step: &'static str,
        /// Underlying failure
        source: Box<LkdrError>,
    },
}

/// Result type alias for LKDR client operations
pub type Result<T> = std::result::Result<T, LkdrError>;

impl LkdrError {
    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a challenge provider error
    pub fn challenge(msg: impl Into<String>) -> Self {
        Self::Challenge(msg.into())
    }

    /// Create a confirmation provider error
    pub fn confirmation(msg: impl Into<String>) -> Self {
        Self::Confirmation(msg.into())
    }

    /// Wrap this error with the name of the step that produced it
    #[must_use]
    pub fn in_step(self, step: &'static str) -> Self {
        Self::Step {
            step,
            source: Box::new(self),
        }
    }

    /// The machine-readable code of the underlying remote rejection, if any.
    ///
    /// Sees through any number of [`LkdrError::Step`] wrappers.
    #[must_use]
    pub fn remote_code(&self) -> Option<&ErrorCode> {
        match self {
            Self::Remote(remote) => Some(&remote.code),
            Self::Step { source, .. } => source.remote_code(),
            _ => None,
        }
    }

    /// Whether the error (possibly step-wrapped) is a cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Step { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Extension for wrapping the error side of a [`Result`] with a step name
pub(crate) trait ResultExt<T> {
    /// Annotate a failure with the step that produced it
    fn in_step(self, step: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn in_step(self, step: &'static str) -> Result<T> {
        self.map_err(|e| e.in_step(step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_code_sees_through_step_wrapping() {
        let err = LkdrError::Remote(RemoteError {
            code: ErrorCode::from("blocked.captcha"),
            message: String::new(),
        })
        .in_step("start sms challenge")
        .in_step("authorize");

        assert_eq!(
            err.remote_code().map(ErrorCode::as_str),
            Some("blocked.captcha")
        );
    }

    #[test]
    fn remote_code_absent_for_other_errors() {
        let err = LkdrError::storage("disk full").in_step("update session");
        assert!(err.remote_code().is_none());
    }

    #[test]
    fn provider_constructors_map_to_their_variants() {
        assert!(matches!(
            LkdrError::challenge("captcha prompt failed"),
            LkdrError::Challenge(_)
        ));
        assert!(matches!(
            LkdrError::confirmation("stdin closed"),
            LkdrError::Confirmation(_)
        ));
    }

    #[test]
    fn step_wrapping_prefixes_display() {
        let err = LkdrError::Cancelled.in_step("execute request");
        assert_eq!(err.to_string(), "execute request: Operation cancelled");
        assert!(err.is_cancelled());
    }
}
