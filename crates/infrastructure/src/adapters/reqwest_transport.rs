//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. Every HTTP response is
//! handed back as-is, including 4xx and 5xx; status handling belongs to the
//! API client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use classdesk_application::ports::{HttpTransport, OutgoingRequest, TransportError};
use classdesk_domain::ClientSettings;
use classdesk_domain::request::{Header, Headers, HttpMethod};
use classdesk_domain::response::ApiResponse;
use reqwest::{Client, Method};

/// HTTP transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout_ms: u64,
}

impl ReqwestTransport {
    /// Creates a transport configured from `settings`.
    ///
    /// Configuration:
    /// - Request timeout: `settings.timeout_ms`
    /// - Follow redirects: up to 10
    /// - User-Agent: `settings.user_agent`
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(settings: &ClientSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_millis(settings.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            client,
            timeout_ms: settings.timeout_ms,
        })
    }

    /// Creates a transport over an existing reqwest client.
    #[must_use]
    pub const fn with_client(client: Client, timeout_ms: u64) -> Self {
        Self { client, timeout_ms }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }
        if error.is_connect() {
            return TransportError::ConnectionFailed(error.to_string());
        }
        if error.is_builder() {
            return TransportError::InvalidRequest(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: OutgoingRequest) -> Result<ApiResponse, TransportError> {
        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), request.url);
        for header in request.headers.iter() {
            builder = builder.header(header.name.as_str(), header.value.as_str());
        }
        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            builder = builder.body(bytes);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout_ms))?;

        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                Header::new(name.as_str(), value.to_str().unwrap_or("<binary>"))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(format!("failed to read body: {e}")))?
            .to_vec();

        Ok(ApiResponse::new(status, headers, body).with_duration(start.elapsed()))
    }
}
