use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::{sessions::SessionAuthority, GIT_COMMIT_HASH};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Session store is reachable", body = Health),
        (status = 503, description = "Session store is unavailable", body = Health)
    ),
    tag = "health"
)]
// axum handler for health
pub async fn health(authority: Extension<SessionAuthority>) -> impl IntoResponse {
    let (status, store) = match authority.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(err) => {
            error!("Session store health check failed: {err}");
            (StatusCode::SERVICE_UNAVAILABLE, "error")
        }
    };

    let body = Json(Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store.to_string(),
    });

    let short_hash = GIT_COMMIT_HASH.get(0..7).unwrap_or_default();
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!(
        "{}:{}:{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_hash
    )) {
        headers.insert("X-App", value);
    }

    (status, headers, body)
}
