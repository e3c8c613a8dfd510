//! Device metadata sent with every authentication request

use serde::Serialize;

/// Application version reported to the service
const APP_VERSION: &str = "1.0.0";

/// Source type for web-originated sessions
const SOURCE_TYPE_WEB: &str = "WEB";

/// Browser-level metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDetails {
    /// User agent string the session presents to the service
    pub user_agent: String,
}

/// Device descriptor the service associates with issued sessions.
///
/// The service keys outstanding SMS challenges to this descriptor, so the
/// same device ID and user agent must be presented across challenge start,
/// verify, and refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Reported application version
    pub app_version: String,
    /// Browser-level metadata
    pub meta_details: MetaDetails,
    /// Caller-chosen stable device identifier
    pub source_device_id: String,
    /// Session source type
    pub source_type: String,
}

impl DeviceInfo {
    /// Build the descriptor for a web session with the fixed app version
    /// and source type the service expects
    #[must_use]
    pub fn web(device_id: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            app_version: APP_VERSION.to_string(),
            meta_details: MetaDetails {
                user_agent: user_agent.into(),
            },
            source_device_id: device_id.into(),
            source_type: SOURCE_TYPE_WEB.to_string(),
        }
    }

    /// The user agent presented by this device
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.meta_details.user_agent
    }
}
