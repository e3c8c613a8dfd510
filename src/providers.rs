//! Trait-based collaborator definitions for the authorization flow.
//!
//! The client drives authorization through three narrow capability traits:
//! durable session storage, captcha solving, and out-of-band confirmation
//! code retrieval. Production and test implementations are interchangeable.
//!
//! # Example: stdin code entry
//!
//! ```no_run
//! use async_trait::async_trait;
//! use lkdr_client::{CodeProvider, Result};
//!
//! struct StdinCode;
//!
//! #[async_trait]
//! impl CodeProvider for StdinCode {
//!     async fn code(&self, phone: &str) -> Result<String> {
//!         println!("Enter confirmation code for {phone}: ");
//!         let mut line = String::new();
//!         std::io::stdin().read_line(&mut line)?;
//!         Ok(line.trim().to_string())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::auth::Session;
use crate::error::Result;

/// Durable storage for sessions, keyed by phone number.
///
/// The store is the source of truth across process restarts; the in-process
/// cache never holds a session the store has not accepted. Implementations
/// must replace whole entries atomically.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session for `phone`, or `None` if the phone was
    /// never authorized.
    ///
    /// # Errors
    /// Returns a storage error if the backing medium cannot be read.
    async fn load(&self, phone: &str) -> Result<Option<Session>>;

    /// Persist `session` for `phone`. `None` removes the entry
    /// (session invalidation).
    ///
    /// # Errors
    /// Returns a storage error if the write does not become durable.
    async fn persist(&self, phone: &str, session: Option<&Session>) -> Result<()>;
}

/// Solves the anti-bot captcha gating challenge start.
///
/// The returned token is single-use and scoped to the presented user agent,
/// site key, and page URL.
#[async_trait]
pub trait ChallengeProvider: Send + Sync {
    /// Produce a captcha solution token.
    ///
    /// # Errors
    /// Returns an error if the captcha cannot be solved.
    async fn solve(&self, user_agent: &str, site_key: &str, page_url: &str) -> Result<String>;
}

/// Obtains the SMS confirmation code for a phone number.
///
/// This call represents a human or external side channel and may block
/// indefinitely; the client imposes no timeout. It races the call against
/// the ambient cancellation token, so blocking implementations should be
/// cancel-safe (the future is dropped on cancellation).
#[async_trait]
pub trait CodeProvider: Send + Sync {
    /// Return the confirmation code sent to `phone`.
    ///
    /// # Errors
    /// Returns an error if the code cannot be obtained.
    async fn code(&self, phone: &str) -> Result<String>;
}
