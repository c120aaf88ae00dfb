//! Credential Manager: minting and verifying the credential pair.
//!
//! This module owns all cryptography and nothing else. It never touches the
//! session store and knows nothing about session policy.
//!
//! - **Access credential:** an HS512 JWT carrying `sub` (user id), `session_id`,
//!   `iat` and `exp`. Parsing accepts the HMAC family only, so tokens that claim
//!   `none` or an asymmetric algorithm are rejected before any key is consulted.
//! - **Refresh credential:** 32 random bytes from the OS RNG, URL-safe base64.
//!   Only an Argon2id PHC string of it is ever persisted.

mod access;
mod error;
mod refresh;

pub use access::AccessClaims;
pub use error::CredentialError;
pub use refresh::RefreshCredential;

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use uuid::Uuid;

/// Stateless signer/verifier for the access and refresh credentials.
#[derive(Clone)]
pub struct CredentialManager {
    signing_secret: SecretString,
}

impl CredentialManager {
    /// Build a manager around the server-held signing secret.
    ///
    /// # Errors
    /// Returns `CredentialError::Signing` if the secret is empty.
    pub fn new(signing_secret: SecretString) -> Result<Self, CredentialError> {
        if signing_secret.expose_secret().is_empty() {
            return Err(CredentialError::Signing("empty signing secret".to_string()));
        }
        Ok(Self { signing_secret })
    }

    /// Mint an access credential bound to `(user_id, session_id)`.
    ///
    /// # Errors
    /// Returns `CredentialError::Signing` if encoding or signing fails.
    pub fn issue_access_credential(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        ttl: Duration,
    ) -> Result<String, CredentialError> {
        access::sign(self.secret_bytes(), user_id, session_id, ttl)
    }

    /// Verify signature, algorithm and expiry and return the typed claims.
    ///
    /// # Errors
    /// Returns `CredentialError::InvalidCredential` for any forged, expired or
    /// malformed token.
    pub fn parse_access_credential(&self, token: &str) -> Result<AccessClaims, CredentialError> {
        access::verify(self.secret_bytes(), token)
    }

    /// Generate a refresh secret and its salted proof hash.
    ///
    /// # Errors
    /// Returns `CredentialError::RandomSource` if the OS RNG fails, or
    /// `CredentialError::Hashing` if the proof cannot be computed.
    pub fn issue_refresh_credential(&self) -> Result<RefreshCredential, CredentialError> {
        refresh::generate()
    }

    /// Check a presented refresh secret against the stored proof hash.
    #[must_use]
    pub fn verify_refresh_credential(&self, proof_hash: &str, candidate: &str) -> bool {
        refresh::verify(proof_hash, candidate)
    }

    fn secret_bytes(&self) -> &[u8] {
        self.signing_secret.expose_secret().as_bytes()
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("signing_secret", &"***")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manager() -> CredentialManager {
        CredentialManager::new(SecretString::from("unit-test-secret")).unwrap()
    }

    #[test]
    fn new_rejects_empty_secret() {
        let result = CredentialManager::new(SecretString::from(""));
        assert!(matches!(result, Err(CredentialError::Signing(_))));
    }

    #[test]
    fn access_credential_round_trips_claims() {
        let manager = manager();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::now_v7();
        let token = manager
            .issue_access_credential(user_id, session_id, Duration::from_secs(60))
            .unwrap();

        let claims = manager.parse_access_credential(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.session_id, session_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn access_credential_from_other_secret_is_rejected() {
        let other = CredentialManager::new(SecretString::from("another-secret")).unwrap();
        let token = other
            .issue_access_credential(Uuid::new_v4(), Uuid::now_v7(), Duration::from_secs(60))
            .unwrap();

        assert!(matches!(
            manager().parse_access_credential(&token),
            Err(CredentialError::InvalidCredential)
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", manager());
        assert!(!rendered.contains("unit-test-secret"));
    }

    #[test]
    fn refresh_credential_verifies_only_its_secret() {
        let manager = manager();
        let credential = manager.issue_refresh_credential().unwrap();
        assert!(manager.verify_refresh_credential(&credential.proof_hash, &credential.secret));
        assert!(!manager.verify_refresh_credential(&credential.proof_hash, "not-the-secret"));
    }

    #[test]
    fn infrastructure_errors_are_classified() {
        assert!(CredentialError::Signing("x".into()).is_infrastructure());
        assert!(CredentialError::RandomSource("x".into()).is_infrastructure());
        assert!(!CredentialError::InvalidCredential.is_infrastructure());
    }
}
