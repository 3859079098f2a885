//! Backend client construction and shared request plumbing.

use crate::events::AuthEventBus;
use crate::{ApiError, ApiResult};
use stockpulse_config_and_utils::Config;
use url::Url;

/// Client for the hosted backend's auth and row endpoints.
///
/// All requests carry the `apikey` header; operations that act on behalf of
/// a user additionally carry `Authorization: Bearer <access_token>`.
#[derive(Debug, Clone)]
pub struct BackendClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) anon_key: String,
    events: AuthEventBus,
}

impl BackendClient {
    /// Create a client from the loaded configuration.
    ///
    /// Fails with [`ApiError::NotConfigured`] when the backend URL or anon
    /// key is missing, so callers can render a "not configured" state
    /// instead of crashing.
    pub fn new(config: &Config) -> ApiResult<Self> {
        let (base_url, anon_key) = config
            .backend_credentials()
            .map_err(|e| ApiError::NotConfigured(e.to_string()))?;

        Ok(Self::from_parts(base_url, anon_key))
    }

    /// Create a client from explicit coordinates (tests, tooling).
    pub fn from_parts(base_url: Url, anon_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            anon_key: anon_key.into(),
            events: AuthEventBus::default(),
        }
    }

    /// The auth event bus for this client.
    pub fn events(&self) -> &AuthEventBus {
        &self.events
    }

    /// Build an auth endpoint URL, e.g. `auth_url("token")`.
    pub(crate) fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base(), endpoint)
    }

    /// Build the row endpoint URL for a table.
    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base(), table)
    }

    fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}
