//! Transport layer for the LKDR HTTP API
//!
//! This module provides the transport abstraction used by the client and the
//! auth engine, plus the structured remote-error shape the service returns on
//! non-success statuses. The default implementation is [`HttpTransport`].

pub mod http;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;

use crate::error::{LkdrError, Result};

/// Base URL of the LKDR API
pub const BASE_URL: &str = "https://mco.nalog.ru/api";

/// Transport trait for issuing calls against the LKDR API
///
/// Every endpoint is a JSON-in/JSON-out POST. Auth endpoints are called
/// without a bearer credential; business endpoints carry the current access
/// token.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a call to `path` with an optional bearer credential.
    ///
    /// # Errors
    /// Returns [`LkdrError::Remote`] when the service answers a non-success
    /// status with a decodable code/message body, [`LkdrError::UnexpectedStatus`]
    /// when the body is not decodable, or a network/decoding error.
    async fn call(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: serde_json::Value,
    ) -> Result<serde_json::Value>;
}

/// Machine-readable error code returned by the service.
///
/// The set of codes is open; the two known ones are exposed as constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(String);

impl ErrorCode {
    /// An SMS challenge for this phone is still outstanding. Not fatal during
    /// authorization: the user can still supply the code tied to it.
    pub const SMS_VERIFICATION_NOT_EXPIRED: &'static str =
        "registration.sms.verification.not.expired";

    /// The captcha solution was rejected
    pub const BLOCKED_CAPTCHA: &'static str = "blocked.captcha";

    /// The code as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the "verification not expired" code
    #[must_use]
    pub fn is_sms_verification_not_expired(&self) -> bool {
        self.0 == Self::SMS_VERIFICATION_NOT_EXPIRED
    }
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured error body returned by the service on non-success statuses
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(self.code.as_str())
        } else {
            write!(f, "{} ({})", self.code, self.message)
        }
    }
}

/// Encode `body`, issue the call racing the cancellation token, decode the
/// response.
///
/// Cancellation drops the in-flight request future and surfaces
/// [`LkdrError::Cancelled`].
pub(crate) async fn call_json<I, O>(
    transport: &dyn Transport,
    cancel: &CancellationToken,
    path: &str,
    bearer: Option<&str>,
    body: &I,
) -> Result<O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    let body = serde_json::to_value(body)?;
    let response = tokio::select! {
        // An already-cancelled token must win even when the call is
        // immediately ready.
        biased;
        () = cancel.cancelled() => return Err(LkdrError::Cancelled),
        response = transport.call(path, bearer, body) => response?,
    };
    Ok(serde_json::from_value(response)?)
}

pub use http::HttpTransport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display_with_message() {
        let err = RemoteError {
            code: ErrorCode::from("blocked.captcha"),
            message: "captcha rejected".to_string(),
        };
        assert_eq!(err.to_string(), "blocked.captcha (captcha rejected)");
    }

    #[test]
    fn remote_error_display_without_message() {
        let err = RemoteError {
            code: ErrorCode::from(ErrorCode::SMS_VERIFICATION_NOT_EXPIRED),
            message: String::new(),
        };
        assert_eq!(err.to_string(), ErrorCode::SMS_VERIFICATION_NOT_EXPIRED);
        assert!(err.code.is_sms_verification_not_expired());
    }

    #[test]
    fn remote_error_decodes_without_message_field() {
        let err: RemoteError = serde_json::from_str(r#"{"code":"blocked.captcha"}"#).unwrap();
        assert_eq!(err.code.as_str(), "blocked.captcha");
        assert!(err.message.is_empty());
    }
}
