//! Wire types for the SMS challenge and token endpoints.
//!
//! Crate-internal: callers interact with these flows only through the
//! session providers and the client surface.

use serde::{Deserialize, Serialize};

use super::datetime::OffsetDateTime;
use super::device::DeviceInfo;

/// Body for `POST /v2/auth/challenge/sms/start`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartChallengeRequest<'a> {
    pub device_info: &'a DeviceInfo,
    pub phone: &'a str,
    pub captcha_token: &'a str,
}

/// Response from the challenge start endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct StartChallengeResponse {
    pub challenge_token: String,
    pub challenge_token_expires_in: Option<OffsetDateTime>,
    pub challenge_token_expires_in_sec: Option<i64>,
}

/// Body for `POST /v1/auth/challenge/sms/verify`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyChallengeRequest<'a> {
    pub device_info: &'a DeviceInfo,
    pub phone: &'a str,
    pub challenge_token: &'a str,
    pub code: &'a str,
}

/// Body for `POST /v1/auth/token`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenRequest<'a> {
    pub device_info: &'a DeviceInfo,
    pub refresh_token: &'a str,
}
