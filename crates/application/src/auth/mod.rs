//! Session state and token refresh.
//!
//! - [`TokenStore`]: the persisted session, single source of truth for tokens
//! - [`RefreshGate`]: single-flight coordination of refresh calls
//! - [`AuthService`]: login, registration and password endpoints

mod refresh_gate;
mod service;
mod token_store;

pub use refresh_gate::{Leader, RefreshGate, RefreshOutcome, Ticket, Waiter};
pub use service::{AuthService, LOGGED_OUT_MESSAGE};
pub use token_store::{SessionEvent, TokenStore};
