//! HTTP handlers for the credential lifecycle.
//!
//! Every protocol violation answers `401 {"error":"unauthorized"}` with no
//! hint about which check failed; the reason only goes to the log.
//! Infrastructure failures answer 500.

pub mod health;
pub mod logout;
pub mod me;
pub(crate) mod principal;
pub mod refresh;
pub mod tokens;
pub mod types;
mod utils;

pub use utils::TrustedProxies;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::sessions::SessionError;
use types::ErrorResponse;

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub(crate) fn unauthorized() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "unauthorized")
}

/// Map a protocol outcome to a response without leaking the failed check.
pub(crate) fn session_error_response(err: &SessionError) -> Response {
    if err.is_unauthorized() {
        warn!(reason = %err, "request rejected");
        unauthorized()
    } else {
        error!("session operation failed: {err}");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}
