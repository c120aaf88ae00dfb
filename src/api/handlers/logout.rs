use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{error, info};

use super::{
    error_response,
    principal::require_auth,
    types::{ErrorResponse, LogoutResponse},
};
use crate::sessions::SessionAuthority;

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Active session revoked", body = LogoutResponse),
        (status = 401, description = "Missing, invalid or revoked access credential", body = ErrorResponse),
        (status = 500, description = "Failed to revoke the session", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, authority: Extension<SessionAuthority>) -> impl IntoResponse {
    let principal = match require_auth(&headers, &authority).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    match authority.revoke(principal.user_id).await {
        Ok(_) => {
            info!(user_id = %principal.user_id, session_id = %principal.session_id, "logout");
            (
                StatusCode::OK,
                Json(LogoutResponse {
                    message: "logout successful".to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to revoke session: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to deauthorize")
        }
    }
}
