//! Default reqwest-backed transport

use async_trait::async_trait;

use super::{BASE_URL, RemoteError, Transport};
use crate::error::{LkdrError, Result};

/// HTTP transport posting JSON to the LKDR API
///
/// Reusable across calls; `reqwest::Client` pools connections internally.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport against the production base URL
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Create a transport against a custom base URL (test servers, proxies)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a transport reusing an existing `reqwest::Client`
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let mut request = self
            .http
            .post(format!("{}{path}", self.base_url))
            .header("Content-Type", "application/json;charset=UTF-8")
            .json(&body);

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            // The service answers errors as {"code": ..., "message": ...};
            // anything else degrades to a bare status error.
            let text = response.text().await.unwrap_or_default();
            if let Ok(remote) = serde_json::from_str::<RemoteError>(&text) {
                tracing::debug!(%status, code = %remote.code, "remote rejection");
                return Err(LkdrError::Remote(remote));
            }
            return Err(LkdrError::UnexpectedStatus(status));
        }

        Ok(response.json().await?)
    }
}
