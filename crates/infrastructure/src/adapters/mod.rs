//! Adapters for the transport, notification and redirect ports.

mod login_redirect;
mod notifier;
mod reqwest_transport;

pub use login_redirect::WatchLoginRedirect;
pub use notifier::{ChannelNotifier, TracingNotifier};
pub use reqwest_transport::ReqwestTransport;
