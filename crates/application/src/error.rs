//! Application error types
//!
//! [`ApiError`] is what callers of the API client see. Its variants follow
//! the backend status codes; the coordinator decides per variant whether to
//! refresh, notify or end the session.

use classdesk_domain::response::{ApiResponse, ErrorDetail, StatusCode};
use classdesk_domain::{DomainError, Notification};
use serde_json::Value;
use thiserror::Error;

use crate::ports::TransportError;

/// Shown when a 403 carries no `detail`.
pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action";
/// Shown when a 404 carries no `detail`.
pub const NOT_FOUND_MESSAGE: &str = "Resource not found";
/// Shown when a 5xx carries no `detail`.
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later";
/// Shown when no response was received.
pub const NETWORK_FAILURE_MESSAGE: &str = "Network error. Please check your connection";
/// Shown once when the session cannot be recovered.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Errors returned by the API client.
///
/// The type is `Clone` so a single refresh failure can be handed to every
/// request waiting on that refresh.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The access token was rejected; recovered by refreshing when possible.
    #[error("access token expired")]
    AuthorizationExpired,

    /// The session could not be recovered. The session has been cleared.
    #[error("authorization failed: {message}")]
    AuthorizationFailed {
        /// What went wrong.
        message: String,
    },

    /// 403.
    #[error("{message}")]
    PermissionDenied {
        /// Backend `detail` or the generic message.
        message: String,
    },

    /// 404.
    #[error("{message}")]
    NotFound {
        /// Backend `detail` or the generic message.
        message: String,
    },

    /// 5xx.
    #[error("{message}")]
    ServerError {
        /// HTTP status.
        status: u16,
        /// Backend `detail` or the generic message.
        message: String,
    },

    /// No response was received.
    #[error("network failure: {0}")]
    NetworkFailure(#[from] TransportError),

    /// 4xx with structured field errors, passed through untouched.
    #[error("validation failed with status {status}")]
    Validation {
        /// HTTP status (normally 422).
        status: u16,
        /// The `detail` value as sent by the backend.
        errors: Value,
    },

    /// Any other 4xx.
    #[error("{message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Backend `detail` or the reason phrase.
        message: String,
    },

    /// A success body did not match the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] DomainError),
}

impl ApiError {
    /// Classifies a non-success response.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Self {
        let detail = response.detail();
        let status = response.status;

        if let Some(ErrorDetail::Fields(errors)) = detail {
            if status.is_client_error() && status != StatusCode::UNAUTHORIZED {
                return Self::Validation {
                    status: status.as_u16(),
                    errors,
                };
            }
            return Self::classify(status, None);
        }

        let message = match detail {
            Some(ErrorDetail::Message(message)) => Some(message),
            _ => None,
        };
        Self::classify(status, message)
    }

    /// Classifies a non-success response to a request sent without
    /// credentials. A 401 there means the submitted secret was wrong, not
    /// that a session expired.
    #[must_use]
    pub fn from_anonymous_response(response: &ApiResponse) -> Self {
        if response.status != StatusCode::UNAUTHORIZED {
            return Self::from_response(response);
        }
        let message = match response.detail() {
            Some(ErrorDetail::Message(message)) => message,
            _ => response.status.reason_phrase().to_string(),
        };
        Self::Rejected {
            status: StatusCode::UNAUTHORIZED.as_u16(),
            message,
        }
    }

    fn classify(status: StatusCode, message: Option<String>) -> Self {
        match status.as_u16() {
            401 => Self::AuthorizationExpired,
            403 => Self::PermissionDenied {
                message: message.unwrap_or_else(|| PERMISSION_DENIED_MESSAGE.to_string()),
            },
            404 => Self::NotFound {
                message: message.unwrap_or_else(|| NOT_FOUND_MESSAGE.to_string()),
            },
            code if status.is_server_error() => Self::ServerError {
                status: code,
                message: message.unwrap_or_else(|| SERVER_ERROR_MESSAGE.to_string()),
            },
            code => Self::Rejected {
                status: code,
                message: message.unwrap_or_else(|| status.reason_phrase().to_string()),
            },
        }
    }

    /// Returns the HTTP status behind this error, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::AuthorizationExpired => Some(401),
            Self::PermissionDenied { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::ServerError { status, .. }
            | Self::Validation { status, .. }
            | Self::Rejected { status, .. } => Some(*status),
            Self::AuthorizationFailed { .. }
            | Self::NetworkFailure(_)
            | Self::Decode(_)
            | Self::InvalidRequest(_) => None,
        }
    }

    /// Returns true for the two authorization kinds.
    #[must_use]
    pub const fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::AuthorizationExpired | Self::AuthorizationFailed { .. }
        )
    }

    /// The notification raised when this error reaches a caller.
    ///
    /// Authorization errors notify once when the session ends, and
    /// validation errors are left to the form that sent them.
    #[must_use]
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Self::PermissionDenied { message }
            | Self::NotFound { message }
            | Self::ServerError { message, .. }
            | Self::Rejected { message, .. } => Some(Notification::error(message.clone())),
            Self::NetworkFailure(_) => Some(Notification::error(NETWORK_FAILURE_MESSAGE)),
            Self::AuthorizationExpired
            | Self::AuthorizationFailed { .. }
            | Self::Validation { .. }
            | Self::Decode(_)
            | Self::InvalidRequest(_) => None,
        }
    }
}

/// Result type alias for API client operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use classdesk_domain::request::Headers;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn response(status: u16, body: &Value) -> ApiResponse {
        ApiResponse::new(status, Headers::new(), serde_json::to_vec(body).unwrap())
    }

    #[test]
    fn test_generic_messages_by_status() {
        let forbidden = ApiError::from_response(&response(403, &json!({})));
        assert_eq!(forbidden.to_string(), PERMISSION_DENIED_MESSAGE);

        let missing = ApiError::from_response(&response(404, &json!({})));
        assert_eq!(missing.to_string(), NOT_FOUND_MESSAGE);

        let server = ApiError::from_response(&ApiResponse::new(
            500,
            Headers::new(),
            b"Internal Server Error".to_vec(),
        ));
        assert_eq!(server.to_string(), SERVER_ERROR_MESSAGE);
        assert_eq!(server.status(), Some(500));
    }

    #[test]
    fn test_detail_is_verbatim() {
        let error = ApiError::from_response(&response(
            403,
            &json!({"detail": "User account is not active"}),
        ));
        assert!(matches!(error, ApiError::PermissionDenied { .. }));
        assert_eq!(
            error.notification(),
            Some(Notification::error("User account is not active"))
        );
    }

    #[test]
    fn test_field_errors_are_validation() {
        let errors = json!([{"loc": ["body", "email"], "msg": "value is not a valid email"}]);
        let error =
            ApiError::from_response(&response(422, &json!({ "detail": errors.clone() })));

        match error {
            ApiError::Validation { status, errors: got } => {
                assert_eq!(status, 422);
                assert_eq!(got, errors);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_unauthorized_is_expired() {
        let error =
            ApiError::from_response(&response(401, &json!({"detail": "Not authenticated"})));
        assert!(matches!(error, ApiError::AuthorizationExpired));
        assert!(error.is_authorization());
        assert_eq!(error.notification(), None);
    }

    #[test]
    fn test_anonymous_unauthorized_is_rejected() {
        let error = ApiError::from_anonymous_response(&response(
            401,
            &json!({"detail": "Incorrect email or password"}),
        ));
        match &error {
            ApiError::Rejected { status, message } => {
                assert_eq!(*status, 401);
                assert_eq!(message, "Incorrect email or password");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(!error.is_authorization());
        assert!(error.notification().is_some());
    }

    #[test]
    fn test_other_client_errors_are_rejected() {
        let error = ApiError::from_response(&response(
            409,
            &json!({"detail": "School slug already exists"}),
        ));
        match &error {
            ApiError::Rejected { status, message } => {
                assert_eq!(*status, 409);
                assert_eq!(message, "School slug already exists");
            }
            other => panic!("expected rejection, got {other:?}"),
        }

        let bare = ApiError::from_response(&response(429, &json!({})));
        assert_eq!(bare.to_string(), "Too Many Requests");
    }

    #[test]
    fn test_network_failure_notifies() {
        let error = ApiError::from(TransportError::ConnectionFailed("refused".to_string()));
        assert_eq!(
            error.notification(),
            Some(Notification::error(NETWORK_FAILURE_MESSAGE))
        );
    }
}
