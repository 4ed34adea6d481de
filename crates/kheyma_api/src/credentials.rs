/// Source of the bearer credential and sink for forced invalidation
///
/// The gateway asks for the token right before each protected call and
/// calls [`CredentialProvider::invalidate`] when the backend rejects a token
/// it sent.
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, if any
    fn bearer_token(&self) -> Option<String>;

    /// Drop the credential after the backend rejected `rejected_token`.
    /// A credential issued since then must be kept.
    fn invalidate(&self, rejected_token: &str);
}

/// Provider for clients that only call public endpoints
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }

    fn invalidate(&self, _rejected_token: &str) {}
}
