//! The access/refresh token pair for one phone number

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::DateTimeTz;

/// Access/refresh token pair with expiries for one phone number.
///
/// A session is either fully absent (phone never authorized) or fully
/// populated; every renewal replaces it wholesale. The serde field names
/// match the token endpoint's wire shape, so verify/refresh responses
/// decode directly into a `Session` and the file store persists the same
/// shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for business calls
    #[serde(rename = "token")]
    pub access_token: String,

    /// Instant at/after which the access token must not be used
    #[serde(rename = "tokenExpireIn")]
    pub access_token_expires_at: DateTimeTz,

    /// Token for obtaining a new pair without re-authorization
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,

    /// Refresh token expiry; absent means the service did not bound it
    #[serde(
        rename = "refreshTokenExpiresIn",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token_expires_at: Option<DateTimeTz>,
}

impl Session {
    /// Whether the access token expires within `margin` of `now`
    pub(crate) fn access_expires_within(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        self.access_token_expires_at.0 < now + margin
    }

    /// Whether the refresh token has a known expiry within `margin` of `now`.
    ///
    /// An unknown expiry counts as not expiring; the service will still
    /// reject a dead refresh token, which surfaces as a refresh failure.
    pub(crate) fn refresh_expires_within(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        self.refresh_token_expires_at
            .is_some_and(|expires_at| expires_at.0 < now + margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(access_secs: i64, refresh_secs: Option<i64>) -> (Session, DateTime<Utc>) {
        let now = Utc::now();
        let session = Session {
            access_token: "at".into(),
            access_token_expires_at: DateTimeTz(now + TimeDelta::seconds(access_secs)),
            refresh_token: "rt".into(),
            refresh_token_expires_at: refresh_secs
                .map(|secs| DateTimeTz(now + TimeDelta::seconds(secs))),
        };
        (session, now)
    }

    #[test]
    fn access_expiry_respects_margin() {
        let margin = TimeDelta::minutes(5);
        let (fresh, now) = session(600, None);
        assert!(!fresh.access_expires_within(now, margin));
        let (stale, now) = session(1, None);
        assert!(stale.access_expires_within(now, margin));
    }

    #[test]
    fn unbounded_refresh_never_expires() {
        let margin = TimeDelta::minutes(5);
        let (unbounded, now) = session(1, None);
        assert!(!unbounded.refresh_expires_within(now, margin));
        let (bounded, now) = session(1, Some(60));
        assert!(bounded.refresh_expires_within(now, margin));
    }

    #[test]
    fn wire_roundtrip_preserves_optional_expiry() {
        let json = r#"{
            "refreshToken": "rt",
            "token": "at",
            "tokenExpireIn": "2024-05-01T12:30:45.123Z"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert!(session.refresh_token_expires_at.is_none());

        let out = serde_json::to_value(&session).unwrap();
        assert_eq!(out["token"], "at");
        assert!(out.get("refreshTokenExpiresIn").is_none());
    }
}
