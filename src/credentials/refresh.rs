//! Refresh credential generation and proof verification.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};

use super::CredentialError;

const SECRET_BYTES: usize = 32;

/// A freshly minted refresh credential. `secret` goes to the client exactly
/// once; only `proof_hash` is persisted.
pub struct RefreshCredential {
    pub secret: String,
    pub proof_hash: String,
}

impl std::fmt::Debug for RefreshCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCredential")
            .field("secret", &"***")
            .field("proof_hash", &"***")
            .finish()
    }
}

pub(super) fn generate() -> Result<RefreshCredential, CredentialError> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| CredentialError::RandomSource(err.to_string()))?;
    let secret = Base64UrlUnpadded::encode_string(&bytes);
    let proof_hash = hash(&secret)?;
    Ok(RefreshCredential { secret, proof_hash })
}

fn hash(secret: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| CredentialError::Hashing(err.to_string()))
}

// Argon2 compares the recomputed digest in constant time.
pub(super) fn verify(proof_hash: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(proof_hash) else {
        tracing::warn!("stored refresh proof hash is malformed");
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn secret_carries_32_bytes() {
        let credential = generate().unwrap();
        let decoded = Base64UrlUnpadded::decode_vec(&credential.secret).unwrap();
        assert_eq!(decoded.len(), SECRET_BYTES);
    }

    #[test]
    fn proof_hash_never_contains_secret() {
        let credential = generate().unwrap();
        assert!(credential.proof_hash.starts_with("$argon2id$"));
        assert!(!credential.proof_hash.contains(&credential.secret));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash("same-secret").unwrap();
        let second = hash("same-secret").unwrap();
        assert_ne!(first, second);
        assert!(verify(&first, "same-secret"));
        assert!(verify(&second, "same-secret"));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify("plaintext", "plaintext"));
    }

    #[test]
    fn debug_redacts_both_fields() {
        let credential = generate().unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains(&credential.secret));
        assert!(!rendered.contains(&credential.proof_hash));
    }
}
