//! Bearer gate for protected routes.
//!
//! Flow Overview: read the bearer access credential, run the authority's
//! identity check, and hand the resulting principal to the handler. The check
//! hits the store on every request so logout and rotation take effect before
//! the access credential expires.

use axum::{http::HeaderMap, response::Response};
use uuid::Uuid;

use super::{session_error_response, unauthorized, utils::extract_bearer_token};
use crate::sessions::SessionAuthority;

/// Authenticated caller of a protected route.
#[derive(Clone, Copy, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

/// Resolve the bearer credential into a principal, or a ready-made 401/500 response.
pub async fn require_auth(
    headers: &HeaderMap,
    authority: &SessionAuthority,
) -> Result<Principal, Response> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(unauthorized());
    };
    authority
        .authenticate(&token)
        .await
        .map(|identity| Principal {
            user_id: identity.user_id,
            session_id: identity.session_id,
        })
        .map_err(|err| session_error_response(&err))
}
