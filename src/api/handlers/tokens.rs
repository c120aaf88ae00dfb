use axum::{
    extract::{ConnectInfo, Extension, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::net::SocketAddr;
use uuid::Uuid;

use super::{
    error_response, session_error_response,
    types::{ErrorResponse, IssueQuery, TokenPair},
    utils::{client_context, TrustedProxies},
};
use crate::sessions::SessionAuthority;

#[utoipa::path(
    get,
    path = "/tokens",
    params(IssueQuery),
    responses(
        (status = 200, description = "New access/refresh credential pair", body = TokenPair),
        (status = 400, description = "user_id missing or not a UUID", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn issue_tokens(
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    authority: Extension<SessionAuthority>,
    Extension(proxies): Extension<TrustedProxies>,
    Query(query): Query<IssueQuery>,
) -> impl IntoResponse {
    let Some(raw_user_id) = query.user_id.filter(|value| !value.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "user_id is required");
    };
    let Ok(user_id) = Uuid::parse_str(raw_user_id.trim()) else {
        return error_response(StatusCode::BAD_REQUEST, "user_id must be a UUID");
    };

    let client = client_context(
        &headers,
        connect_info.map(|ConnectInfo(addr)| addr),
        &proxies,
    );
    match authority.issue(user_id, &client).await {
        Ok(pair) => (StatusCode::OK, Json(TokenPair::from(pair))).into_response(),
        Err(err) => session_error_response(&err),
    }
}
