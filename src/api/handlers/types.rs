//! Request/response types for the HTTP surface.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::sessions::CredentialPair;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IssueQuery {
    /// User identifier (UUID).
    pub user_id: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenPair {
    #[schema(example = "eyJhbGciOiJIUzUxMiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "d9f8a7b3f2e3c4b5...")]
    pub refresh_token: String,
}

impl From<CredentialPair> for TokenPair {
    fn from(pair: CredentialPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MeResponse {
    pub user_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LogoutResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn refresh_request_requires_both_tokens() {
        let missing: Result<RefreshRequest, _> =
            serde_json::from_str(r#"{"access_token":"a"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn token_pair_uses_snake_case_fields() -> Result<()> {
        let pair = TokenPair::from(CredentialPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        });
        let value = serde_json::to_value(&pair)?;
        assert_eq!(value["access_token"], "a");
        assert_eq!(value["refresh_token"], "r");
        Ok(())
    }
}
