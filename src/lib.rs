//! # Tokenward (Session Credential Authority)
//!
//! `tokenward` issues short-lived signed access credentials paired with
//! single-use opaque refresh credentials, and keeps one server-side session
//! record per issuance so every refresh can be checked against the stored state.
//!
//! ## Rotation
//!
//! Presenting an access/refresh pair to `/refresh` consumes the pair: the stored
//! record is revoked with a compare-and-set and a new pair is minted. Rotation
//! runs detached from the request future, so a client that disconnects mid-way
//! cannot leave a session half rotated.
//!
//! ## Reuse Detection
//!
//! A pair that no longer matches the user's latest session record is treated as
//! stolen. Every active session for that user is revoked and the caller gets a
//! `401`, which forces the legitimate holder to sign in again.
//!
//! ## Client Binding
//!
//! Each record remembers the `User-Agent` and client IP seen at issuance. A
//! different agent at refresh time revokes the session. A different IP is only
//! reported through the configured anomaly notifier.

pub mod api;
pub mod cli;
pub mod credentials;
pub mod sessions;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
