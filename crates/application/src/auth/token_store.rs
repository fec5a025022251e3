//! Session storage with durable persistence.
//!
//! The [`TokenStore`] is the single source of truth for the access token,
//! refresh token and user identity. Every mutation is written through to a
//! [`SessionStorage`] so the session survives restarts.

use std::sync::Arc;

use classdesk_domain::session::{
    PersistedSession, SESSION_SCHEMA_VERSION, SESSION_STORAGE_KEY, Session, TokenPair, User,
    UserPatch,
};
use tokio::sync::{Mutex, RwLock, broadcast};

use crate::ports::{SessionStorage, StorageError};

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 16;

/// Changes to the session, broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user logged in.
    LoggedIn {
        /// Identifier of the user.
        user_id: String,
    },
    /// The token pair was replaced.
    TokensRefreshed,
    /// The user record changed.
    UserUpdated,
    /// The session was cleared.
    LoggedOut,
}

/// Thread-safe session store with write-through persistence.
pub struct TokenStore {
    session: RwLock<Session>,
    storage: Arc<dyn SessionStorage>,
    /// Serializes mutate-then-persist so storage sees writes in memory order.
    writes: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl TokenStore {
    /// Creates an empty store backed by `storage`. Nothing is loaded.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_session(storage, Session::default())
    }

    fn with_session(storage: Arc<dyn SessionStorage>, session: Session) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session: RwLock::new(session),
            storage,
            writes: Mutex::new(()),
            events,
        }
    }

    /// Creates a store from the previously persisted session, if any.
    ///
    /// Missing, unreadable or malformed data yields an unauthenticated store.
    /// No network call is made.
    pub async fn rehydrate(storage: Arc<dyn SessionStorage>) -> Self {
        let session = match Self::load(storage.as_ref()).await {
            Ok(Some(session)) => {
                tracing::debug!(
                    authenticated = session.is_authenticated(),
                    "rehydrated persisted session"
                );
                session
            }
            Ok(None) => Session::default(),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable persisted session");
                Session::default()
            }
        };
        Self::with_session(storage, session)
    }

    async fn load(storage: &dyn SessionStorage) -> Result<Option<Session>, StorageError> {
        let Some(bytes) = storage.load(SESSION_STORAGE_KEY).await? else {
            return Ok(None);
        };
        let persisted: PersistedSession = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        if persisted.version != SESSION_SCHEMA_VERSION {
            return Err(StorageError::Serialization(format!(
                "unsupported session version {}",
                persisted.version
            )));
        }
        Ok(Some(persisted.state))
    }

    /// Replaces the whole session with a freshly authenticated one.
    pub async fn login(&self, user: User, access_token: String, refresh_token: String) {
        let user_id = user.id.clone();
        let session = Session::authenticated(user, TokenPair::new(access_token, refresh_token));

        let guard = self.writes.lock().await;
        *self.session.write().await = session.clone();
        self.persist(&session).await;
        drop(guard);

        tracing::info!(user_id = %user_id, "session started");
        self.emit(SessionEvent::LoggedIn { user_id });
    }

    /// Clears the session and wipes the whole storage namespace.
    ///
    /// Safe to call when already logged out. Returns whether there was
    /// anything to clear.
    pub async fn logout(&self) -> bool {
        let guard = self.writes.lock().await;
        let was_present = {
            let mut session = self.session.write().await;
            let was_present = *session != Session::default();
            session.clear();
            was_present
        };
        if let Err(e) = self.storage.clear().await {
            tracing::warn!(error = %e, "failed to wipe session storage");
        }
        drop(guard);

        if was_present {
            tracing::info!("session ended");
            self.emit(SessionEvent::LoggedOut);
        }
        was_present
    }

    /// Replaces the token pair, keeping the user.
    pub async fn set_tokens(&self, access_token: String, refresh_token: String) {
        let guard = self.writes.lock().await;
        let snapshot = {
            let mut session = self.session.write().await;
            session.set_tokens(TokenPair::new(access_token, refresh_token));
            session.clone()
        };
        self.persist(&snapshot).await;
        drop(guard);

        self.emit(SessionEvent::TokensRefreshed);
    }

    /// Replaces the token pair only if the stored refresh token is still
    /// `expected_refresh`.
    ///
    /// Used by the refresh flow so a logout (or a new login) that happened
    /// while the refresh was in flight is not overwritten. Returns whether
    /// the tokens were stored.
    pub async fn replace_tokens_if(&self, expected_refresh: &str, tokens: TokenPair) -> bool {
        let guard = self.writes.lock().await;
        let snapshot = {
            let mut session = self.session.write().await;
            if session.refresh_token() != Some(expected_refresh) {
                return false;
            }
            session.set_tokens(tokens);
            session.clone()
        };
        self.persist(&snapshot).await;
        drop(guard);

        self.emit(SessionEvent::TokensRefreshed);
        true
    }

    /// Shallow-merges `patch` into the user. No-op if there is no user.
    pub async fn update_user(&self, patch: &UserPatch) {
        let guard = self.writes.lock().await;
        let snapshot = {
            let mut session = self.session.write().await;
            if !session.update_user(patch) {
                return;
            }
            session.clone()
        };
        self.persist(&snapshot).await;
        drop(guard);

        self.emit(SessionEvent::UserUpdated);
    }

    /// Returns a copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Returns the current access token.
    pub async fn access_token(&self) -> Option<String> {
        self.session.read().await.access_token().map(String::from)
    }

    /// Returns the current refresh token.
    pub async fn refresh_token(&self) -> Option<String> {
        self.session.read().await.refresh_token().map(String::from)
    }

    /// Returns the current user.
    pub async fn user(&self) -> Option<User> {
        self.session.read().await.user().cloned()
    }

    /// Returns true if tokens and user are all present.
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }

    /// Subscribes to session changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn persist(&self, session: &Session) {
        let bytes = match serde_json::to_vec(&PersistedSession::new(session.clone())) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode session");
                return;
            }
        };
        if let Err(e) = self.storage.save(SESSION_STORAGE_KEY, &bytes).await {
            tracing::warn!(error = %e, "failed to persist session");
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
