use thiserror::Error;

use super::StoreError;
use crate::credentials::CredentialError;

/// Failures of the session lifecycle protocol.
///
/// Protocol violations all surface as "unauthorized" to the caller; the
/// variant is only for logs and tests.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Credential(CredentialError),
    #[error("invalid access credential")]
    InvalidCredential,
    #[error("no active session")]
    NoActiveSession,
    #[error("session expired")]
    SessionExpired,
    #[error("refresh credential reuse detected")]
    TokenReuseDetected,
    #[error("refresh credential mismatch")]
    RefreshMismatch,
    #[error("client agent mismatch")]
    AgentMismatch,
    #[error("session revoked")]
    SessionRevoked,
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("session task interrupted")]
    Interrupted,
}

impl SessionError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredential
                | Self::NoActiveSession
                | Self::SessionExpired
                | Self::TokenReuseDetected
                | Self::RefreshMismatch
                | Self::AgentMismatch
                | Self::SessionRevoked
        )
    }
}

impl From<CredentialError> for SessionError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidCredential => Self::InvalidCredential,
            other => Self::Credential(other),
        }
    }
}
