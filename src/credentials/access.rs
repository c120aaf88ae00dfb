//! Access credential encoding (HMAC-signed JWT).

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::CredentialError;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS512;
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claims carried by every access credential. Both ids must be present and
/// well-formed UUIDs or the token is rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub session_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub(super) fn sign(
    secret: &[u8],
    user_id: Uuid,
    session_id: Uuid,
    ttl: Duration,
) -> Result<String, CredentialError> {
    if secret.is_empty() {
        return Err(CredentialError::Signing("empty signing secret".to_string()));
    }
    let ttl_seconds = i64::try_from(ttl.as_secs())
        .map_err(|_| CredentialError::Signing("access credential ttl overflow".to_string()))?;

    let iat = Utc::now().timestamp();
    let claims = AccessClaims {
        sub: user_id,
        session_id,
        iat,
        exp: iat.saturating_add(ttl_seconds),
    };

    encode(
        &Header::new(SIGNING_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|err| CredentialError::Signing(err.to_string()))
}

pub(super) fn verify(secret: &[u8], token: &str) -> Result<AccessClaims, CredentialError> {
    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<AccessClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|err| {
            tracing::debug!("access credential rejected: {err}");
            CredentialError::InvalidCredential
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64ct::{Base64UrlUnpadded, Encoding};
    use serde_json::json;

    const SECRET: &[u8] = b"access-test-secret";

    fn encode_raw(header: &serde_json::Value, claims: &serde_json::Value) -> String {
        let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(header).unwrap());
        let claims = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims).unwrap());
        format!("{header}.{claims}.c2lnbmF0dXJl")
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    #[test]
    fn sign_uses_hs512() {
        let token = sign(SECRET, Uuid::new_v4(), Uuid::now_v7(), Duration::from_secs(60)).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
    }

    #[test]
    fn sign_rejects_empty_secret() {
        let result = sign(b"", Uuid::new_v4(), Uuid::now_v7(), Duration::from_secs(60));
        assert!(matches!(result, Err(CredentialError::Signing(_))));
    }

    #[test]
    fn verify_accepts_other_hmac_variants() {
        let claims = AccessClaims {
            sub: Uuid::new_v4(),
            session_id: Uuid::now_v7(),
            iat: now(),
            exp: now() + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert_eq!(verify(SECRET, &token).unwrap(), claims);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let claims = AccessClaims {
            sub: Uuid::new_v4(),
            session_id: Uuid::now_v7(),
            iat: now() - 120,
            exp: now() - 60,
        };
        let token = encode(
            &Header::new(SIGNING_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(matches!(
            verify(SECRET, &token),
            Err(CredentialError::InvalidCredential)
        ));
    }

    #[test]
    fn verify_rejects_alg_none() {
        let token = encode_raw(
            &json!({"alg": "none", "typ": "JWT"}),
            &json!({"sub": Uuid::new_v4(), "session_id": Uuid::now_v7(), "iat": now(), "exp": now() + 60}),
        );
        assert!(matches!(
            verify(SECRET, &token),
            Err(CredentialError::InvalidCredential)
        ));
    }

    #[test]
    fn verify_rejects_asymmetric_algorithm() {
        let token = encode_raw(
            &json!({"alg": "RS256", "typ": "JWT"}),
            &json!({"sub": Uuid::new_v4(), "session_id": Uuid::now_v7(), "iat": now(), "exp": now() + 60}),
        );
        assert!(matches!(
            verify(SECRET, &token),
            Err(CredentialError::InvalidCredential)
        ));
    }

    #[test]
    fn verify_fails_closed_on_missing_session_id() {
        let token = encode(
            &Header::new(SIGNING_ALGORITHM),
            &json!({"sub": Uuid::new_v4(), "iat": now(), "exp": now() + 60}),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(matches!(
            verify(SECRET, &token),
            Err(CredentialError::InvalidCredential)
        ));
    }

    #[test]
    fn verify_fails_closed_on_non_uuid_subject() {
        let token = encode(
            &Header::new(SIGNING_ALGORITHM),
            &json!({"sub": 42, "session_id": Uuid::now_v7(), "iat": now(), "exp": now() + 60}),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(matches!(
            verify(SECRET, &token),
            Err(CredentialError::InvalidCredential)
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(matches!(
            verify(SECRET, "not.a.jwt"),
            Err(CredentialError::InvalidCredential)
        ));
    }
}
