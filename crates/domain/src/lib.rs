//! Classdesk Domain - Core types
//!
//! This crate defines the domain model for the Classdesk API client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod notification;
pub mod request;
pub mod response;
pub mod session;
pub mod settings;

pub use error::{DomainError, DomainResult};
pub use notification::{Notification, NotificationLevel};
pub use session::{Session, TokenPair, User, UserPatch};
pub use settings::ClientSettings;
