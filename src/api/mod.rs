use crate::api::handlers::{health, logout, me, refresh, tokens, TrustedProxies};
use crate::sessions::SessionAuthority;
use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

/// Build the application router with the session authority attached.
#[must_use]
pub fn router(authority: SessionAuthority, proxies: TrustedProxies) -> Router {
    Router::new()
        .route("/tokens", get(tokens::issue_tokens))
        .route("/refresh", post(refresh::refresh_tokens))
        .route("/me", get(me::me))
        .route("/logout", post(logout::logout))
        .route("/health", get(health::health))
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", openapi()))
        .layer(Extension(authority))
        .layer(Extension(proxies))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, authority: SessionAuthority, proxies: TrustedProxies) -> Result<()> {
    let app = router(authority, proxies).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Gracefully shutdown"),
        Err(err) => {
            tracing::error!("Failed to listen for shutdown signal: {err}");
            std::future::pending::<()>().await;
        }
    }
}
