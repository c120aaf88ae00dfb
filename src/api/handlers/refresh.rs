use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Extension},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::net::SocketAddr;
use tracing::debug;

use super::{
    error_response, session_error_response,
    types::{ErrorResponse, RefreshRequest, TokenPair},
    utils::{client_context, TrustedProxies},
};
use crate::sessions::SessionAuthority;

#[utoipa::path(
    post,
    path = "/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotated credential pair", body = TokenPair),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "Invalid, reused or revoked credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh_tokens(
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    authority: Extension<SessionAuthority>,
    Extension(proxies): Extension<TrustedProxies>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("invalid refresh payload: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, "invalid request body");
        }
    };

    let client = client_context(
        &headers,
        connect_info.map(|ConnectInfo(addr)| addr),
        &proxies,
    );
    // Detached so a client disconnect cannot interrupt revoke + insert.
    match authority
        .rotate_detached(request.access_token, request.refresh_token, client)
        .await
    {
        Ok(pair) => (StatusCode::OK, Json(TokenPair::from(pair))).into_response(),
        Err(err) => session_error_response(&err),
    }
}
