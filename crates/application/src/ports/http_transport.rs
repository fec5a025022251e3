//! HTTP transport port

use async_trait::async_trait;
use classdesk_domain::request::{Headers, HttpMethod};
use classdesk_domain::response::ApiResponse;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// A fully resolved request, ready to put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL including the query string.
    pub url: Url,
    /// Final header set, credentials included.
    pub headers: Headers,
    /// JSON body, if any.
    pub body: Option<Value>,
}

/// Failures where no HTTP response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The configured timeout.
        timeout_ms: u64,
    },

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request could not be encoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Port for executing HTTP requests.
///
/// Implementations return every HTTP response, including 4xx and 5xx, as
/// `Ok`. Only failures without a response are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received.
    async fn execute(&self, request: OutgoingRequest) -> Result<ApiResponse, TransportError>;
}
