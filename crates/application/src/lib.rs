//! Classdesk Application - Session handling and the API client
//!
//! This crate holds the authenticated request coordinator and the ports it
//! needs from the outside world. Adapters live in the infrastructure crate.

pub mod auth;
pub mod client;
pub mod error;
pub mod ports;

pub use auth::{AuthService, RefreshGate, SessionEvent, TokenStore};
pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, ApiResult};
