//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod file_system;
mod http_transport;
mod login_redirect;
mod notifier;
mod session_storage;

pub use file_system::{FileSystem, FileSystemError};
pub use http_transport::{HttpTransport, OutgoingRequest, TransportError};
pub use login_redirect::{LoginRedirect, NoRedirect};
pub use notifier::{Notifier, SilentNotifier};
pub use session_storage::{SessionStorage, StorageError};
