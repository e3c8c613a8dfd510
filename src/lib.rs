//! # LKDR client for Rust
//!
//! Async client for the LKDR receipt-verification service (`mco.nalog.ru`).
//! SMS challenge authentication, persistent session caching, receipt queries.
//! Tokio-based, strongly typed.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use lkdr_client::{Client, CodeProvider, FileSessionStore, Result};
//! use lkdr_client::types::{FiscalDataRequest, ReceiptRequest};
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
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .device_id("my-stable-device-id")
//!         .user_agent("Mozilla/5.0")
//!         .session_store(Arc::new(FileSessionStore::default_path()))
//!         .code_provider(Arc::new(StdinCode))
//!         .build()?;
//!
//!     let page = client
//!         .receipts("+79990000000", &ReceiptRequest::builder().limit(1).build())
//!         .await?;
//!
//!     if let Some(receipt) = page.receipts.first() {
//!         let detail = client
//!             .fiscal_data("+79990000000", &FiscalDataRequest::new(&receipt.key))
//!             .await?;
//!         println!("{} items", detail.items.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Session lifecycle
//!
//! Sessions (access + refresh token pairs) are cached in memory and written
//! through to a [`SessionStore`], so a process restart does not force
//! re-authorization. On each call the client reuses, refreshes, or fully
//! re-authorizes the session for the phone number, with a 5-minute safety
//! margin before literal expiry. Full authorization needs a
//! [`ChallengeProvider`] (captcha solution) and a [`CodeProvider`] (the SMS
//! code); refresh and reuse need neither. See the [`auth`] module for the
//! decision rule and its guarantees.
//!
//! Renewal sequences for one phone number are serialized; calls for
//! different phone numbers run fully in parallel.
//!
//! ## Architecture
//!
//! - [`client`]: business surface ([`Client`], [`ClientBuilder`])
//! - [`auth`]: session type, write-through cache, renewal state machine
//! - [`providers`]: collaborator traits ([`SessionStore`],
//!   [`ChallengeProvider`], [`CodeProvider`])
//! - [`storage`]: JSON-file [`SessionStore`] implementation
//! - [`transport`]: HTTP layer and the structured remote-error shape
//! - [`types`]: wire types for receipts, device metadata, timestamps
//! - [`error`]: error taxonomy and step annotation
//!
//! ## Cancellation
//!
//! Every client holds a `tokio_util::sync::CancellationToken` (builder
//! override via [`ClientBuilder::cancellation_token`]). Every suspension
//! point (network calls, captcha solving, code retrieval) races the token;
//! cancelling it aborts in-flight work with [`LkdrError::Cancelled`].
//!
//! ## Logging
//!
//! This crate uses [`tracing`](https://crates.io/crates/tracing) for
//! structured logging. Events are always emitted but are zero-cost when no
//! subscriber is attached. To see logs, attach a subscriber in your
//! application:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! ## Error handling
//!
//! All fallible operations return [`Result<T, LkdrError>`](Result). Every
//! failure is annotated with the step that produced it, and remote
//! rejections keep their machine-readable code:
//!
//! ```no_run
//! # use lkdr_client::LkdrError;
//! # fn example(err: LkdrError) {
//! if let Some(code) = err.remote_code() {
//!     eprintln!("service rejected the call: {code}");
//! } else {
//!     eprintln!("error: {err}");
//! }
//! # }
//! ```
//!
//! The client never retries on its own; callers decide whether to retry the
//! whole business call.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod client;
pub mod error;
pub mod providers;
pub mod storage;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use auth::{Clock, Session, SessionCache, SystemClock};
pub use client::{Client, ClientBuilder};
pub use error::{LkdrError, Result};
pub use futures::StreamExt;
pub use providers::{ChallengeProvider, CodeProvider, SessionStore};
pub use storage::FileSessionStore;
pub use transport::{ErrorCode, HttpTransport, RemoteError, Transport};
pub use types::{
    Brand, Date, DateTimeTz, DeviceInfo, FiscalDataItem, FiscalDataRequest, FiscalDataResponse,
    MskDateTime, Receipt, ReceiptRequest, ReceiptResponse,
};

/// Version of the client library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
