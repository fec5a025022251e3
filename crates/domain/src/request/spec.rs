//! API request specification

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use super::{Headers, HttpMethod};
use crate::error::{DomainError, DomainResult};

/// A single call against the backend, relative to the configured base URL.
///
/// The request is kept in this unsent form so it can be replayed after a
/// token refresh with a different `Authorization` header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Unique identifier, used to correlate log lines across replays.
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL (e.g. `/schools/1/classes`).
    pub path: String,
    /// Query parameters in insertion order.
    #[serde(default)]
    pub query: Vec<(String, String)>,
    /// Per-call header overrides.
    #[serde(default)]
    pub headers: Headers,
    /// JSON body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// When set, the request is sent without credentials and a 401 is not
    /// treated as an expired session (login, refresh, password reset).
    #[serde(default)]
    pub skip_auth: bool,
}

impl ApiRequest {
    /// Creates a request with the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: None,
            skip_auth: false,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Creates a PATCH request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header override.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Marks the request as anonymous.
    #[must_use]
    pub const fn without_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    /// Resolves the full URL against `base`.
    ///
    /// The base path is preserved: `http://h/api/v1` + `/auth/me` gives
    /// `http://h/api/v1/auth/me`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is an absolute URL or the result does not
    /// parse.
    pub fn url(&self, base: &Url) -> DomainResult<Url> {
        let path = self.path.trim();
        if path.contains("://") {
            return Err(DomainError::InvalidPath(format!(
                "expected a path relative to the base URL, got {path}"
            )));
        }

        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {joined}")))?;

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }
}
