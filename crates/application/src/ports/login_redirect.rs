//! Login redirect port

/// Port for sending the user back to the login entry point after the
/// session ended.
pub trait LoginRedirect: Send + Sync {
    /// Requests navigation to the login entry point. Must not block.
    fn redirect_to_login(&self);
}

/// Ignores redirect requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRedirect;

impl LoginRedirect for NoRedirect {
    fn redirect_to_login(&self) {}
}
