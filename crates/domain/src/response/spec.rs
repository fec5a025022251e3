//! Response specification type
//!
//! Contains types for representing backend responses including status
//! codes, headers, body and the `detail` convention used for errors.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::Headers;

/// HTTP status code with semantic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// 401 Unauthorized.
    pub const UNAUTHORIZED: Self = Self(401);
    /// 403 Forbidden.
    pub const FORBIDDEN: Self = Self(403);
    /// 404 Not Found.
    pub const NOT_FOUND: Self = Self(404);

    /// Creates a new `StatusCode`.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if this is a 2xx success status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is a 4xx client error status.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a 5xx server error status.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.0 >= 500 && self.0 < 600
    }

    /// Returns the canonical reason phrase for common status codes.
    #[must_use]
    pub const fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// The `detail` member of a backend error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDetail {
    /// A human-readable message, shown to the user verbatim.
    Message(String),
    /// Structured field errors (a list or object), passed through untouched.
    Fields(Value),
}

/// A response received from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: Headers,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Round-trip time.
    pub duration: Duration,
}

impl ApiResponse {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: impl Into<StatusCode>, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            status: status.into(),
            headers,
            body,
            duration: Duration::ZERO,
        }
    }

    /// Sets the measured round-trip time.
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns the body as lossy UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON.
    ///
    /// An empty body is read as `null`, so `()` and `Option<T>` targets work
    /// for `204 No Content` style responses.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(Value::Null);
        }
        serde_json::from_slice(&self.body)
    }

    /// Extracts the `detail` member of an error body, if any.
    #[must_use]
    pub fn detail(&self) -> Option<ErrorDetail> {
        let value: Value = serde_json::from_slice(&self.body).ok()?;
        match value.get("detail")? {
            Value::String(message) => Some(ErrorDetail::Message(message.clone())),
            Value::Null => None,
            fields @ (Value::Array(_) | Value::Object(_)) => {
                Some(ErrorDetail::Fields(fields.clone()))
            }
            other => Some(ErrorDetail::Message(other.to_string())),
        }
    }
}
