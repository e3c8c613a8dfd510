//! Session lifecycle for the LKDR client
//!
//! # Overview
//!
//! Every business call goes through the same lazy evaluation:
//!
//! 1. Look up the cached session for the phone number (loading from the
//!    [`SessionStore`](crate::SessionStore) on first access).
//! 2. If the refresh token is missing or expires within the safety margin,
//!    run the full SMS authorization sequence (captcha, challenge start,
//!    confirmation code, verify).
//! 3. Else if the access token expires within the safety margin, refresh it.
//! 4. Else reuse the cached session without any remote call.
//!
//! Renewed sessions are written through the cache to the store before use;
//! a failed persist leaves the cache on the pre-renewal session. All
//! sequences for one phone number are serialized by a per-phone lock, so
//! concurrent calls never race a stale refresh against a fresh
//! authorization. Calls for different phone numbers proceed in parallel.
//!
//! A failed refresh is not retried as a full authorization within the same
//! call; the error propagates, and the next call re-evaluates the (still
//! stale) session from step 1.

mod cache;
mod engine;
mod session;

use chrono::{DateTime, Utc};

pub use cache::SessionCache;
pub use session::Session;

pub(crate) use cache::SessionEntry;
pub(crate) use engine::AuthEngine;

/// Source of "now" for session expiry decisions.
///
/// Engine-owned instead of ambient so tests can pin the clock.
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// System wall clock, the default for production clients
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
