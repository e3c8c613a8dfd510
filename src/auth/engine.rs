//! Session renewal decisions and the challenge/verify/refresh sequences

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::{LkdrError, Result, ResultExt};
use crate::providers::{ChallengeProvider, CodeProvider};
use crate::transport::{Transport, call_json};
use crate::types::DeviceInfo;
use crate::types::auth::{RefreshTokenRequest, StartChallengeRequest, StartChallengeResponse, VerifyChallengeRequest};

use super::cache::SessionEntry;
use super::session::Session;
use super::Clock;

const START_CHALLENGE_PATH: &str = "/v2/auth/challenge/sms/start";
const VERIFY_CHALLENGE_PATH: &str = "/v1/auth/challenge/sms/verify";
const REFRESH_TOKEN_PATH: &str = "/v1/auth/token";

/// Captcha site identifier the login page is registered under
const CAPTCHA_SITE_KEY: &str = "hfU4TD7fJUI7XcP5qRphKWgnIR5t9gXAxTRqdQJk";

/// Origin page the captcha solution must be scoped to
const CAPTCHA_PAGE_URL: &str = "https://lkdr.nalog.ru/login";

/// Lookahead treating a token as expired before its literal expiry, to avoid
/// races with in-flight use
fn expiry_margin() -> TimeDelta {
    TimeDelta::minutes(5)
}

/// What to do with the cached session for this call
enum SessionPlan {
    /// Token pair still fresh, use as-is without any remote call
    Reuse(Session),
    /// Access token expiring, refresh token still good
    Refresh(Session),
    /// No session, or the refresh token itself is expiring
    Authorize,
}

/// Evaluate the decision rule against `now` plus the safety margin
fn plan(cached: Option<Session>, now: DateTime<Utc>) -> SessionPlan {
    let margin = expiry_margin();
    match cached {
        None => SessionPlan::Authorize,
        Some(session) if session.refresh_expires_within(now, margin) => SessionPlan::Authorize,
        Some(session) if session.access_expires_within(now, margin) => {
            SessionPlan::Refresh(session)
        }
        Some(session) => SessionPlan::Reuse(session),
    }
}

/// Drives the authorization state machine for one client.
///
/// Stateless between calls apart from its collaborators; all per-phone state
/// lives in the cache slot the caller passes in, which it must hold for the
/// whole sequence.
pub(crate) struct AuthEngine {
    transport: Arc<dyn Transport>,
    challenge_provider: Option<Arc<dyn ChallengeProvider>>,
    code_provider: Arc<dyn CodeProvider>,
    clock: Arc<dyn Clock>,
    device_info: DeviceInfo,
    cancel: CancellationToken,
}

impl AuthEngine {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        challenge_provider: Option<Arc<dyn ChallengeProvider>>,
        code_provider: Arc<dyn CodeProvider>,
        clock: Arc<dyn Clock>,
        device_info: DeviceInfo,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            challenge_provider,
            code_provider,
            clock,
            device_info,
            cancel,
        }
    }

    /// Produce a usable session for `phone`, renewing through `entry` when
    /// the decision rule requires it.
    ///
    /// The caller holds `entry` (and with it the per-phone lock) for the
    /// duration, so at most one renewal sequence runs per phone.
    pub(crate) async fn session(&self, phone: &str, entry: &mut SessionEntry) -> Result<Session> {
        let cached = entry.get().await.in_step("load session")?;

        let renewed = match plan(cached, self.clock.now()) {
            SessionPlan::Reuse(session) => return Ok(session),
            SessionPlan::Refresh(stale) => {
                tracing::debug!(phone, "access token expiring, refreshing");
                self.refresh(&stale.refresh_token)
                    .await
                    .in_step("refresh token")?
            }
            SessionPlan::Authorize => {
                tracing::debug!(phone, "no usable session, running sms authorization");
                self.authorize(phone).await.in_step("authorize")?
            }
        };

        entry.set(renewed.clone()).await.in_step("update session")?;
        Ok(renewed)
    }

    /// Full authorization: captcha, challenge start, confirmation code,
    /// verify. No partial success is ever persisted; the caller writes the
    /// returned session through the cache.
    async fn authorize(&self, phone: &str) -> Result<Session> {
        let challenge_provider = self
            .challenge_provider
            .as_deref()
            .ok_or_else(|| LkdrError::invalid_config("challenge provider not set"))?;

        let captcha_token = self
            .with_cancel(challenge_provider.solve(
                self.device_info.user_agent(),
                CAPTCHA_SITE_KEY,
                CAPTCHA_PAGE_URL,
            ))
            .await
            .in_step("get captcha token")?;

        let start = StartChallengeRequest {
            device_info: &self.device_info,
            phone,
            captcha_token: &captcha_token,
        };

        let challenge_token = match call_json::<_, StartChallengeResponse>(
            self.transport.as_ref(),
            &self.cancel,
            START_CHALLENGE_PATH,
            None,
            &start,
        )
        .await
        {
            Ok(response) => response.challenge_token,
            // A challenge is already outstanding for this phone; the user
            // can still supply the code tied to it, so proceed to verify.
            Err(err)
                if err
                    .remote_code()
                    .is_some_and(|code| code.is_sms_verification_not_expired()) =>
            {
                tracing::warn!(phone, "sms verification still pending, reusing outstanding challenge");
                String::new()
            }
            Err(err) => return Err(err.in_step("start sms challenge")),
        };

        // May block indefinitely on a human; only the ambient cancellation
        // token bounds it.
        let code = self
            .with_cancel(self.code_provider.code(phone))
            .await
            .in_step("get confirmation code")?;

        let verify = VerifyChallengeRequest {
            device_info: &self.device_info,
            phone,
            challenge_token: &challenge_token,
            code: &code,
        };

        call_json(
            self.transport.as_ref(),
            &self.cancel,
            VERIFY_CHALLENGE_PATH,
            None,
            &verify,
        )
        .await
        .in_step("verify code")
    }

    /// Exchange the refresh token for a new pair. Failures propagate; the
    /// stale session stays cached and the next call re-evaluates it.
    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let request = RefreshTokenRequest {
            device_info: &self.device_info,
            refresh_token,
        };
        call_json(
            self.transport.as_ref(),
            &self.cancel,
            REFRESH_TOKEN_PATH,
            None,
            &request,
        )
        .await
    }

    /// Race `fut` against the ambient cancellation token. Cancellation drops
    /// the provider future and surfaces [`LkdrError::Cancelled`].
    async fn with_cancel<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            // An already-cancelled token must win even when `fut` is
            // immediately ready.
            biased;
            () = self.cancel.cancelled() => Err(LkdrError::Cancelled),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DateTimeTz;

    fn session(access_secs: i64, refresh_secs: Option<i64>, now: DateTime<Utc>) -> Session {
        Session {
            access_token: "at".into(),
            access_token_expires_at: DateTimeTz(now + TimeDelta::seconds(access_secs)),
            refresh_token: "rt".into(),
            refresh_token_expires_at: refresh_secs
                .map(|secs| DateTimeTz(now + TimeDelta::seconds(secs))),
        }
    }

    #[test]
    fn no_session_authorizes() {
        let now = Utc::now();
        assert!(matches!(plan(None, now), SessionPlan::Authorize));
    }

    #[test]
    fn expiring_refresh_token_authorizes() {
        let now = Utc::now();
        // Access token fine, refresh token inside the margin
        let cached = session(3600, Some(60), now);
        assert!(matches!(plan(Some(cached), now), SessionPlan::Authorize));
    }

    #[test]
    fn expiring_access_token_refreshes() {
        let now = Utc::now();
        let cached = session(1, Some(86_400), now);
        assert!(matches!(plan(Some(cached), now), SessionPlan::Refresh(_)));
    }

    #[test]
    fn expiring_access_with_unbounded_refresh_refreshes() {
        let now = Utc::now();
        let cached = session(1, None, now);
        assert!(matches!(plan(Some(cached), now), SessionPlan::Refresh(_)));
    }

    #[test]
    fn fresh_session_is_reused() {
        let now = Utc::now();
        let cached = session(600, Some(86_400), now);
        assert!(matches!(plan(Some(cached), now), SessionPlan::Reuse(_)));
    }

    #[test]
    fn expiry_exactly_at_margin_is_still_usable() {
        let now = Utc::now();
        // Strict comparison: expiry at now + margin is not "within" it
        let cached = session(5 * 60, None, now);
        assert!(matches!(plan(Some(cached), now), SessionPlan::Reuse(_)));
    }
}
