use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to sign access credential: {0}")]
    Signing(String),
    #[error("random source unavailable: {0}")]
    RandomSource(String),
    #[error("failed to hash refresh credential: {0}")]
    Hashing(String),
    #[error("invalid credential")]
    InvalidCredential,
}

impl CredentialError {
    /// Infrastructure failures are server errors; everything else is the caller's fault.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, Self::InvalidCredential)
    }
}
