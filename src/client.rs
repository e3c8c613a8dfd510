//! Client for the LKDR receipt API
//!
//! [`Client`] is the business surface: receipt list and fiscal detail
//! queries, each keyed by phone number. Every call is routed through the
//! session lifecycle in [`crate::auth`]; callers never handle tokens
//! directly.

use std::sync::Arc;

use async_stream::try_stream;
use futures::Stream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::auth::{AuthEngine, Clock, SessionCache, SystemClock};
use crate::error::{LkdrError, Result, ResultExt};
use crate::providers::{ChallengeProvider, CodeProvider, SessionStore};
use crate::transport::{HttpTransport, Transport, call_json};
use crate::types::{
    DeviceInfo, FiscalDataRequest, FiscalDataResponse, Receipt, ReceiptRequest, ReceiptResponse,
};

const RECEIPT_PATH: &str = "/v1/receipt";
const FISCAL_DATA_PATH: &str = "/v1/receipt/fiscal_data";

/// Builder for [`Client`]
///
/// Required: device ID, user agent, session store, code provider. The
/// challenge provider is only needed once a phone actually has to
/// authorize, so it stays optional here and is validated lazily.
#[derive(Default)]
pub struct ClientBuilder {
    device_id: Option<String>,
    user_agent: Option<String>,
    session_store: Option<Arc<dyn SessionStore>>,
    code_provider: Option<Arc<dyn CodeProvider>>,
    challenge_provider: Option<Arc<dyn ChallengeProvider>>,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    cancellation_token: Option<CancellationToken>,
}

impl ClientBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable device identifier presented to the service
    #[must_use]
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// User agent presented to the service and to the captcha provider
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Durable session storage
    #[must_use]
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Confirmation code source (human or side channel)
    #[must_use]
    pub fn code_provider(mut self, provider: Arc<dyn CodeProvider>) -> Self {
        self.code_provider = Some(provider);
        self
    }

    /// Captcha solver for full authorization
    #[must_use]
    pub fn challenge_provider(mut self, provider: Arc<dyn ChallengeProvider>) -> Self {
        self.challenge_provider = Some(provider);
        self
    }

    /// Custom transport (defaults to [`HttpTransport`] against production)
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Custom clock (defaults to the system clock)
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Ambient cancellation token observed at every suspension point
    #[must_use]
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns [`LkdrError::InvalidConfig`] when a required field is missing
    /// or empty.
    pub fn build(self) -> Result<Client> {
        let device_id = self
            .device_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LkdrError::invalid_config("device id is required"))?;
        let user_agent = self
            .user_agent
            .filter(|ua| !ua.is_empty())
            .ok_or_else(|| LkdrError::invalid_config("user agent is required"))?;
        let session_store = self
            .session_store
            .ok_or_else(|| LkdrError::invalid_config("session store is required"))?;
        let code_provider = self
            .code_provider
            .ok_or_else(|| LkdrError::invalid_config("code provider is required"))?;

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::new()));
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cancel = self.cancellation_token.unwrap_or_default();
        let device_info = DeviceInfo::web(device_id, user_agent);

        Ok(Client {
            engine: AuthEngine::new(
                Arc::clone(&transport),
                self.challenge_provider,
                code_provider,
                clock,
                device_info,
                cancel.clone(),
            ),
            cache: SessionCache::new(session_store),
            transport,
            cancel,
        })
    }
}

/// Client for the LKDR receipt API
///
/// Cheap to share behind an `Arc`; calls for distinct phone numbers run
/// fully in parallel, calls for one phone serialize their session renewal.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use lkdr_client::{Client, CodeProvider, FileSessionStore, Result};
/// use lkdr_client::types::ReceiptRequest;
///
/// struct StdinCode;
///
/// #[async_trait]
/// impl CodeProvider for StdinCode {
///     async fn code(&self, phone: &str) -> Result<String> {
///         println!("Enter confirmation code for {phone}: ");
///         let mut line = String::new();
///         std::io::stdin().read_line(&mut line)?;
///         Ok(line.trim().to_string())
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let client = Client::builder()
///         .device_id("my-device")
///         .user_agent("Mozilla/5.0")
///         .session_store(Arc::new(FileSessionStore::default_path()))
///         .code_provider(Arc::new(StdinCode))
///         .build()?;
///
///     let page = client
///         .receipts("+79990000000", &ReceiptRequest::builder().limit(1).build())
///         .await?;
///     println!("{} receipts", page.receipts.len());
///     Ok(())
/// }
/// ```
pub struct Client {
    engine: AuthEngine,
    cache: SessionCache,
    transport: Arc<dyn Transport>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Create a builder
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Fetch a page of receipts for `phone`.
    ///
    /// # Errors
    /// Propagates authorization, transport, and storage failures, each
    /// annotated with the step that produced it.
    pub async fn receipts(&self, phone: &str, request: &ReceiptRequest) -> Result<ReceiptResponse> {
        self.execute_authorized(phone, RECEIPT_PATH, request).await
    }

    /// Fetch the full fiscal document for a receipt key.
    ///
    /// # Errors
    /// Propagates authorization, transport, and storage failures, each
    /// annotated with the step that produced it.
    pub async fn fiscal_data(
        &self,
        phone: &str,
        request: &FiscalDataRequest,
    ) -> Result<FiscalDataResponse> {
        self.execute_authorized(phone, FISCAL_DATA_PATH, request)
            .await
    }

    /// Stream receipts page by page, starting from `request` and advancing
    /// its offset until the service reports no further pages.
    pub fn receipts_stream<'a>(
        &'a self,
        phone: &'a str,
        request: ReceiptRequest,
    ) -> impl Stream<Item = Result<Receipt>> + 'a {
        try_stream! {
            let mut request = request;
            loop {
                let page = self.receipts(phone, &request).await?;
                if page.receipts.is_empty() {
                    break;
                }
                let has_more = page.has_more;
                for receipt in page.receipts {
                    yield receipt;
                }
                if !has_more {
                    break;
                }
                request.offset += request.limit;
            }
        }
    }

    /// Drop the stored session for `phone` (store and cache), forcing a
    /// full authorization on the next call.
    ///
    /// # Errors
    /// Propagates a store persist failure; the cached session is kept in
    /// that case.
    pub async fn invalidate_session(&self, phone: &str) -> Result<()> {
        self.cache.invalidate(phone).await
    }

    /// The ambient cancellation token; cancel it to abort in-flight and
    /// future calls
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Obtain a usable session under the per-phone lock, release the lock,
    /// then issue the business call with the bearer credential.
    async fn execute_authorized<I, O>(&self, phone: &str, path: &str, body: &I) -> Result<O>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let session = {
            let mut entry = self.cache.entry(phone).await;
            self.engine.session(phone, &mut entry).await?
        };

        call_json(
            self.transport.as_ref(),
            &self.cancel,
            path,
            Some(&session.access_token),
            body,
        )
        .await
        .in_step("execute request")
    }
}
