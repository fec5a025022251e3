//! Client settings
//!
//! Everything the API client needs to know about its environment.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Default backend location.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Settings for the API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL every request path is resolved against.
    pub base_url: String,
    /// Namespace of the durable storage; logout wipes all of it.
    pub storage_namespace: String,
    /// Whether a refresh response may replace the stored refresh token.
    pub rotate_refresh_token: bool,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User-Agent header value.
    pub user_agent: String,
    /// Route the user is sent to when the session ends.
    pub login_redirect: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            storage_namespace: "classdesk".to_string(),
            rotate_refresh_token: true,
            timeout_ms: 30_000,
            user_agent: concat!("Classdesk/", env!("CARGO_PKG_VERSION")).to_string(),
            login_redirect: "/login".to_string(),
        }
    }
}

impl ClientSettings {
    /// Parses and checks the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or is not http(s).
    pub fn base_url(&self) -> DomainResult<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DomainError::InvalidUrl(format!(
                "unsupported scheme {}: {}",
                url.scheme(),
                self.base_url
            )));
        }
        Ok(url)
    }

    /// Validates every field that can be invalid.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> DomainResult<()> {
        self.base_url()?;
        if self.storage_namespace.trim().is_empty()
            || self
                .storage_namespace
                .contains(['/', '\\', '.'])
        {
            return Err(DomainError::InvalidPath(format!(
                "storage namespace must be a plain name, got {:?}",
                self.storage_namespace
            )));
        }
        Ok(())
    }
}
