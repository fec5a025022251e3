//! Authenticated request coordinator.
//!
//! [`ApiClient`] attaches the current access token to every request and
//! recovers from an expired token by refreshing it once, however many
//! requests fail at the same time. Requests that failed during a refresh are
//! replayed with the new token after it lands.

use std::sync::Arc;

use classdesk_domain::auth::{RefreshRequest, RefreshResponse};
use classdesk_domain::request::{ApiRequest, Headers};
use classdesk_domain::response::{ApiResponse, StatusCode};
use classdesk_domain::session::token_preview;
use classdesk_domain::{ClientSettings, DomainError, Notification};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::auth::{RefreshGate, RefreshOutcome, Ticket, TokenStore};
use crate::error::{ApiError, ApiResult, SESSION_EXPIRED_MESSAGE};
use crate::ports::{
    HttpTransport, LoginRedirect, NoRedirect, Notifier, OutgoingRequest, SilentNotifier,
};

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Encodes a request body as JSON.
pub(crate) fn json_body<B: Serialize + ?Sized>(body: &B) -> ApiResult<Value> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::InvalidRequest(DomainError::InvalidBody(e.to_string())))
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    transport: Arc<dyn HttpTransport>,
    store: Arc<TokenStore>,
    settings: ClientSettings,
    notifier: Arc<dyn Notifier>,
    redirect: Arc<dyn LoginRedirect>,
}

impl ApiClientBuilder {
    /// Uses `settings` instead of the defaults.
    #[must_use]
    pub fn settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets where user-visible notifications go.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sets what happens when the session ends.
    #[must_use]
    pub fn login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = redirect;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is invalid.
    pub fn build(self) -> ApiResult<ApiClient> {
        let base_url = self.settings.base_url()?;
        Ok(ApiClient {
            transport: self.transport,
            store: self.store,
            gate: RefreshGate::new(),
            base_url,
            rotate_refresh_token: self.settings.rotate_refresh_token,
            user_agent: self.settings.user_agent,
            notifier: self.notifier,
            redirect: self.redirect,
        })
    }
}

/// HTTP client for the backend API with transparent token refresh.
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    store: Arc<TokenStore>,
    gate: RefreshGate,
    base_url: Url,
    rotate_refresh_token: bool,
    user_agent: String,
    notifier: Arc<dyn Notifier>,
    redirect: Arc<dyn LoginRedirect>,
}

impl ApiClient {
    /// Starts building a client over `transport` and `store`.
    #[must_use]
    pub fn builder(transport: Arc<dyn HttpTransport>, store: Arc<TokenStore>) -> ApiClientBuilder {
        ApiClientBuilder {
            transport,
            store,
            settings: ClientSettings::default(),
            notifier: Arc::new(SilentNotifier),
            redirect: Arc::new(NoRedirect),
        }
    }

    /// The session store requests are authenticated from.
    #[must_use]
    pub const fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// The base URL request paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns true while a token refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.gate.is_refreshing()
    }

    /// Number of refresh calls started by this client.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.gate.refresh_count()
    }

    /// Shows a notification through the configured notifier.
    pub fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    /// GETs `path` and decodes the body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if the body is not a `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(ApiRequest::get(path)).await
    }

    /// POSTs `body` to `path` and decodes the response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if the body is not a `T`.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(ApiRequest::post(path).with_body(json_body(body)?))
            .await
    }

    /// PUTs `body` to `path` and decodes the response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if the body is not a `T`.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(ApiRequest::put(path).with_body(json_body(body)?))
            .await
    }

    /// PATCHes `path` with `body` and decodes the response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if the body is not a `T`.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(ApiRequest::patch(path).with_body(json_body(body)?))
            .await
    }

    /// DELETEs `path` and decodes the response. An empty body decodes as
    /// `null`, so `()` works for `T`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if the body is not a `T`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(ApiRequest::delete(path)).await
    }

    /// Sends `request` and decodes the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if the body is not a `T`.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.send(&request).await?;
        response.json().map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Sends `request` and returns the successful response.
    ///
    /// A 401 on an authenticated request is recovered by refreshing the
    /// access token and replaying the request once. Errors that reach the
    /// caller raise a notification first when their kind has one.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for any non-success outcome.
    pub async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let result = self.execute(request).await;
        if let Err(error) = &result
            && let Some(notification) = error.notification()
        {
            self.notifier.notify(notification);
        }
        result
    }

    /// Refreshes the access token now, joining a refresh already in flight.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationFailed` if the session could not be renewed; the
    /// session has been cleared in that case.
    pub async fn refresh(&self) -> ApiResult<String> {
        self.recover(self.gate.epoch()).await
    }

    async fn execute(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        if request.skip_auth {
            let response = self.dispatch(request, None).await?;
            if response.status.is_success() {
                return Ok(response);
            }
            return Err(ApiError::from_anonymous_response(&response));
        }

        // The epoch must be read before the token it guards.
        let epoch = self.gate.epoch();
        let token = self.store.access_token().await;
        let response = self.dispatch(request, token.as_deref()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return into_result(response);
        }

        tracing::debug!(request_id = %request.id, "access token rejected");
        let token = self.recover(epoch).await?;
        let response = self.dispatch(request, Some(&token)).await?;
        if response.status == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                request_id = %request.id,
                "request rejected again after token refresh"
            );
            self.end_session().await;
            return Err(ApiError::AuthorizationFailed {
                message: "request was rejected after a token refresh".to_string(),
            });
        }
        into_result(response)
    }

    /// Obtains a token to replay with after a 401 seen at `seen_epoch`.
    async fn recover(&self, seen_epoch: u64) -> ApiResult<String> {
        match self.gate.enter(seen_epoch) {
            Ticket::Leader(leader) => {
                let outcome = self.refresh_session().await;
                if outcome.is_err() {
                    self.end_session().await;
                }
                let released = leader.settle(&outcome);
                tracing::debug!(released, "refresh settled");
                outcome
            }
            Ticket::Follower(waiter) => waiter.wait().await,
            Ticket::Superseded => self.current_token().await,
        }
    }

    async fn refresh_session(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.store.refresh_token().await else {
            tracing::warn!("no refresh token held");
            return Err(ApiError::AuthorizationFailed {
                message: "no refresh token available".to_string(),
            });
        };
        tracing::debug!(
            refresh_token = %token_preview(&refresh_token),
            "refreshing access token"
        );

        let body = json_body(&RefreshRequest {
            refresh_token: refresh_token.clone(),
        })?;
        let request = ApiRequest::post(REFRESH_PATH)
            .with_body(body)
            .without_auth();

        let response = self
            .dispatch(&request, None)
            .await
            .map_err(|e| refresh_failed(&e))?;
        if !response.status.is_success() {
            return Err(refresh_failed(&ApiError::from_anonymous_response(
                &response,
            )));
        }
        let refreshed: RefreshResponse = response
            .json()
            .map_err(|e| refresh_failed(&ApiError::Decode(e.to_string())))?;

        let tokens = refreshed.into_tokens(&refresh_token, self.rotate_refresh_token);
        let access_token = tokens.access_token.clone();
        if self.store.replace_tokens_if(&refresh_token, tokens).await {
            tracing::info!("access token refreshed");
            return Ok(access_token);
        }

        // The session was replaced or cleared while the refresh was in flight.
        tracing::debug!("session changed during refresh, discarding refreshed tokens");
        self.current_token().await
    }

    async fn current_token(&self) -> ApiResult<String> {
        self.store
            .access_token()
            .await
            .ok_or_else(|| ApiError::AuthorizationFailed {
                message: "session ended before the request could be replayed".to_string(),
            })
    }

    /// Clears the session and sends the user to the login entry point.
    async fn end_session(&self) {
        if self.store.logout().await {
            self.notifier
                .notify(Notification::error(SESSION_EXPIRED_MESSAGE));
        }
        self.redirect.redirect_to_login();
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> ApiResult<ApiResponse> {
        let url = request.url(&self.base_url)?;

        let mut headers = Headers::new();
        headers.set("Accept", "application/json");
        if request.body.is_some() {
            headers.set("Content-Type", "application/json");
        }
        headers.set("User-Agent", self.user_agent.as_str());
        for header in request.headers.iter() {
            headers.set(header.name.as_str(), header.value.as_str());
        }
        match token {
            Some(token) => headers.set("Authorization", format!("Bearer {token}")),
            // Authenticated requests carry the session's credentials or none.
            None if !request.skip_auth => headers.remove("Authorization"),
            None => {}
        }

        tracing::debug!(
            request_id = %request.id,
            method = %request.method,
            url = %url,
            authenticated = token.is_some(),
            "dispatching request"
        );

        let response = self
            .transport
            .execute(OutgoingRequest {
                method: request.method,
                url,
                headers,
                body: request.body.clone(),
            })
            .await?;

        tracing::debug!(
            request_id = %request.id,
            status = %response.status,
            elapsed_ms = response.duration.as_millis(),
            "response received"
        );
        Ok(response)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

fn into_result(response: ApiResponse) -> ApiResult<ApiResponse> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::from_response(&response))
    }
}

fn refresh_failed(cause: &ApiError) -> ApiError {
    tracing::warn!(error = %cause, "token refresh failed");
    ApiError::AuthorizationFailed {
        message: format!("token refresh failed: {cause}"),
    }
}
