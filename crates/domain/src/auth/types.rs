//! Request and response bodies of the `/auth` endpoints

use serde::{Deserialize, Serialize};

use crate::session::{TokenPair, User};

/// Body of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Restricts the lookup to one school when the email exists in several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_slug: Option<String>,
}

impl Credentials {
    /// Creates credentials without a school slug.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            school_slug: None,
        }
    }

    /// Scopes the login to a school.
    #[must_use]
    pub fn with_school(mut self, slug: impl Into<String>) -> Self {
        self.school_slug = Some(slug.into());
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .field("school_slug", &self.school_slug)
            .finish()
    }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// New access token.
    pub access_token: String,
    /// New refresh token.
    pub refresh_token: String,
    /// Token scheme, normally `bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// The authenticated user.
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl LoginResponse {
    /// Splits the response into the user and the token pair.
    #[must_use]
    pub fn into_parts(self) -> (User, TokenPair) {
        (
            self.user,
            TokenPair::new(self.access_token, self.refresh_token),
        )
    }
}

/// Body of `POST /auth/refresh`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token being exchanged.
    pub refresh_token: String,
}

impl std::fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshRequest")
            .field(
                "refresh_token",
                &crate::session::token_preview(&self.refresh_token),
            )
            .finish()
    }
}

/// Response of `POST /auth/refresh`.
///
/// Some backends rotate the refresh token, others only issue a new access
/// token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token.
    pub access_token: String,
    /// Rotated refresh token, if the backend issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl RefreshResponse {
    /// Builds the token pair to store.
    ///
    /// The rotated refresh token is only taken when `rotate` is set and the
    /// backend sent one; otherwise `current_refresh` is kept.
    #[must_use]
    pub fn into_tokens(self, current_refresh: &str, rotate: bool) -> TokenPair {
        let refresh_token = match self.refresh_token {
            Some(rotated) if rotate => rotated,
            _ => current_refresh.to_string(),
        };
        TokenPair::new(self.access_token, refresh_token)
    }
}

/// Body of `POST /auth/register`: a new school and its first admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name of the school.
    pub school_name: String,
    /// URL-safe unique school identifier.
    pub school_slug: String,
    /// Admin email.
    pub email: String,
    /// Admin password.
    pub password: String,
    /// Admin given name.
    pub first_name: String,
    /// Admin family name.
    pub last_name: String,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Country.
    pub country: String,
}

/// School summary returned at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredSchool {
    /// School identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unique slug.
    pub slug: String,
    /// Verification status, `pending` right after registration.
    pub status: String,
}

/// Response of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Human-readable outcome.
    pub message: String,
    /// The created school.
    pub school: RegisteredSchool,
    /// The created admin user.
    pub user: User,
}

/// Body of `POST /auth/change-password`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    /// Password currently in use.
    pub current_password: String,
    /// Replacement password.
    pub new_password: String,
}

/// Body of `POST /auth/reset-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    /// Account email the reset link is sent to.
    pub email: String,
}

/// Body of `POST /auth/reset-password/confirm`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmResetRequest {
    /// Token from the reset email.
    pub token: String,
    /// Replacement password.
    pub new_password: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_login_response_parts() {
        let response: LoginResponse = serde_json::from_value(json!({
            "access_token": "T1",
            "refresh_token": "R1",
            "user": {"id": "1", "email": "a@b.com"}
        }))
        .unwrap();

        assert_eq!(response.token_type, "bearer");
        let (user, tokens) = response.into_parts();
        assert_eq!(user.id, "1");
        assert_eq!(tokens, TokenPair::new("T1", "R1"));
    }

    #[test]
    fn test_refresh_keeps_current_token_when_not_rotated() {
        let response: RefreshResponse =
            serde_json::from_value(json!({"access_token": "T2"})).unwrap();
        assert_eq!(response.into_tokens("R1", true), TokenPair::new("T2", "R1"));
    }

    #[test]
    fn test_refresh_rotation_flag() {
        let response = RefreshResponse {
            access_token: "T2".to_string(),
            refresh_token: Some("R2".to_string()),
        };
        assert_eq!(
            response.clone().into_tokens("R1", true),
            TokenPair::new("T2", "R2")
        );
        assert_eq!(response.into_tokens("R1", false), TokenPair::new("T2", "R1"));
    }

    #[test]
    fn test_credentials_wire_format() {
        let body = serde_json::to_value(Credentials::new("a@b.com", "x")).unwrap();
        assert_eq!(body, json!({"email": "a@b.com", "password": "x"}));

        let scoped = serde_json::to_value(Credentials::new("a@b.com", "x").with_school("kigali"))
            .unwrap();
        assert_eq!(scoped["school_slug"], "kigali");
        assert!(!format!("{:?}", Credentials::new("a@b.com", "x")).contains("\"x\""));
    }
}
