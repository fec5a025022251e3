//! Account operations against the `/auth` endpoints.

use std::sync::Arc;

use classdesk_domain::Notification;
use classdesk_domain::auth::{
    ChangePasswordRequest, ConfirmResetRequest, Credentials, LoginResponse, RegisterRequest,
    RegisterResponse, ResetPasswordRequest,
};
use classdesk_domain::request::ApiRequest;
use classdesk_domain::session::{User, UserPatch};
use serde_json::Value;

use crate::client::{ApiClient, json_body};
use crate::error::ApiResult;

/// Shown after a user-initiated logout.
pub const LOGGED_OUT_MESSAGE: &str = "Logged out successfully";

/// Login, registration and password management.
///
/// Session state lives in the client's [`TokenStore`](super::TokenStore);
/// this service only talks to the backend and records the outcome there.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    /// Creates a service issuing requests through `client`.
    #[must_use]
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Exchanges credentials for a session and stores it.
    ///
    /// # Errors
    ///
    /// Returns the backend rejection (wrong credentials, inactive account)
    /// or a transport failure. The stored session is untouched on error.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<User> {
        let request = ApiRequest::post("/auth/login")
            .with_body(json_body(credentials)?)
            .without_auth();
        let response: LoginResponse = self.client.request(request).await?;

        let (user, tokens) = response.into_parts();
        self.client
            .store()
            .login(user.clone(), tokens.access_token, tokens.refresh_token)
            .await;
        Ok(user)
    }

    /// Registers a new school with its first admin. Does not log in: new
    /// schools start out pending verification.
    ///
    /// # Errors
    ///
    /// Returns the backend rejection (slug or email taken, invalid fields).
    pub async fn register(&self, registration: &RegisterRequest) -> ApiResult<RegisterResponse> {
        let request = ApiRequest::post("/auth/register")
            .with_body(json_body(registration)?)
            .without_auth();
        self.client.request(request).await
    }

    /// Ends the session locally. The backend keeps no session to revoke.
    pub async fn logout(&self) {
        self.client.store().logout().await;
        self.client.notify(Notification::success(LOGGED_OUT_MESSAGE));
    }

    /// Renews the access token, joining a refresh already in flight.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationFailed` if the session could not be renewed.
    pub async fn refresh(&self) -> ApiResult<String> {
        self.client.refresh().await
    }

    /// Fetches the authenticated user and merges it into the stored session.
    ///
    /// # Errors
    ///
    /// Returns the request error; the stored user is untouched on error.
    pub async fn current_user(&self) -> ApiResult<User> {
        let user: User = self.client.get("/auth/me").await?;
        self.client
            .store()
            .update_user(&UserPatch::from(user.clone()))
            .await;
        Ok(user)
    }

    /// Changes the password of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns the backend rejection, e.g. a wrong current password.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        let body = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        let _: Value = self.client.post("/auth/change-password", &body).await?;
        Ok(())
    }

    /// Asks the backend to email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn reset_password(&self, email: &str) -> ApiResult<()> {
        let request = ApiRequest::post("/auth/reset-password")
            .with_body(json_body(&ResetPasswordRequest {
                email: email.to_string(),
            })?)
            .without_auth();
        self.client.send(&request).await?;
        Ok(())
    }

    /// Completes a password reset with the emailed token.
    ///
    /// # Errors
    ///
    /// Returns the backend rejection, e.g. an expired reset token.
    pub async fn confirm_reset(&self, token: &str, new_password: &str) -> ApiResult<()> {
        let request = ApiRequest::post("/auth/reset-password/confirm")
            .with_body(json_body(&ConfirmResetRequest {
                token: token.to_string(),
                new_password: new_password.to_string(),
            })?)
            .without_auth();
        self.client.send(&request).await?;
        Ok(())
    }
}
