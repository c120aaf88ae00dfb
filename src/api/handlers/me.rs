use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use super::{
    principal::require_auth,
    types::{ErrorResponse, MeResponse},
};
use crate::sessions::SessionAuthority;

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Identifier of the authenticated user", body = MeResponse),
        (status = 401, description = "Missing, invalid or revoked access credential", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "user"
)]
pub async fn me(headers: HeaderMap, authority: Extension<SessionAuthority>) -> impl IntoResponse {
    match require_auth(&headers, &authority).await {
        Ok(principal) => (
            StatusCode::OK,
            Json(MeResponse {
                user_id: principal.user_id.to_string(),
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}
