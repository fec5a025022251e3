//! Session and user identity types.
//!
//! A [`Session`] is the authenticated state of the current user: the token
//! pair plus the identity record returned at login. It is persisted as a
//! [`PersistedSession`] envelope under [`SESSION_STORAGE_KEY`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Storage key the session is persisted under.
pub const SESSION_STORAGE_KEY: &str = "auth-storage";

/// Current layout version of the persisted session envelope.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Identity record of the authenticated user.
///
/// Backend fields this type does not model are kept in `extra` so that a
/// persisted session round-trips them unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier. Accepts numeric ids on the wire.
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Login email.
    pub email: String,
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Tenant the user belongs to.
    #[serde(
        default,
        deserialize_with = "optional_id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub school_id: Option<String>,
    /// Role names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    /// Any other fields sent by the backend.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Creates a user with only the required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            school_id: None,
            roles: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Returns "First Last" when a name is known, otherwise the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => self.email.clone(),
        }
    }
}

/// A partial user record; present fields overwrite the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    /// New email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New tenant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    /// Replacement role list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Extra fields, merged key by key.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserPatch {
    /// Shallow-merges this patch into `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email.clone_from(email);
        }
        if let Some(first_name) = &self.first_name {
            user.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = Some(last_name.clone());
        }
        if let Some(school_id) = &self.school_id {
            user.school_id = Some(school_id.clone());
        }
        if let Some(roles) = &self.roles {
            user.roles.clone_from(roles);
        }
        for (key, value) in &self.extra {
            user.extra.insert(key.clone(), value.clone());
        }
    }
}

impl From<User> for UserPatch {
    /// Every field of `user` except the id, which is never patched.
    fn from(user: User) -> Self {
        Self {
            email: Some(user.email),
            first_name: user.first_name,
            last_name: user.last_name,
            school_id: user.school_id,
            roles: Some(user.roles),
            extra: user.extra,
        }
    }
}

/// Access and refresh token pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived credential attached to outgoing requests.
    pub access_token: String,
    /// Longer-lived credential exchanged for a new access token.
    pub refresh_token: String,
}

impl TokenPair {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &token_preview(&self.access_token))
            .field("refresh_token", &token_preview(&self.refresh_token))
            .finish()
    }
}

/// Returns a loggable preview of a token (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.len() > 12 && token.is_char_boundary(8) {
        format!("{}...", &token[..8])
    } else {
        "***".to_string()
    }
}

/// Authenticated state of the current user.
///
/// `is_authenticated` is derived: it holds exactly when both tokens and the
/// user record are present.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

impl Session {
    /// Creates a fully authenticated session.
    #[must_use]
    pub fn authenticated(user: User, tokens: TokenPair) -> Self {
        Self {
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            user: Some(user),
        }
    }

    /// Returns true if both tokens and the user are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some() && self.user.is_some()
    }

    /// Returns the access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Returns the refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns the user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Replaces the token pair, keeping the user.
    pub fn set_tokens(&mut self, tokens: TokenPair) {
        self.access_token = Some(tokens.access_token);
        self.refresh_token = Some(tokens.refresh_token);
    }

    /// Merges `patch` into the user. Returns false if there is no user.
    pub fn update_user(&mut self, patch: &UserPatch) -> bool {
        match self.user.as_mut() {
            Some(user) => {
                patch.apply_to(user);
                true
            }
            None => false,
        }
    }

    /// Drops tokens and user.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_deref().map(token_preview))
            .field(
                "refresh_token",
                &self.refresh_token.as_deref().map(token_preview),
            )
            .field("user", &self.user)
            .field("is_authenticated", &self.is_authenticated())
            .finish()
    }
}

/// On-disk envelope for a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Layout version, see [`SESSION_SCHEMA_VERSION`].
    pub version: u32,
    /// The persisted state.
    pub state: Session,
}

impl PersistedSession {
    /// Wraps a session in the current envelope version.
    #[must_use]
    pub const fn new(state: Session) -> Self {
        Self {
            version: SESSION_SCHEMA_VERSION,
            state,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}
