//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary executes, applying the
//! legacy environment fallbacks (`DATABASE_URL`, `JWT_SECRET`, `WEBHOOK_URL`).

use crate::cli::actions::{server::Args, Action};
use crate::api::handlers::TrustedProxies;
use crate::cli::commands::{auth, webhook, ARG_DSN, ARG_PORT, ARG_TRUSTED_PROXIES};
use anyhow::Result;
use std::net::IpAddr;

/// Legacy variable honoured when `--dsn` is not given.
pub const ENV_DSN_FALLBACK: &str = "DATABASE_URL";

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8082);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .or_else(|| std::env::var(ENV_DSN_FALLBACK).ok())
        .filter(|v| !v.trim().is_empty());

    let trusted_proxies = matches
        .get_many::<IpAddr>(ARG_TRUSTED_PROXIES)
        .map_or(TrustedProxies::Any, |addrs| {
            TrustedProxies::Only(addrs.copied().collect())
        });

    let auth_opts = auth::Options::parse(matches)?;
    let webhook_opts = webhook::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret: auth_opts.jwt_secret,
        webhook_url: webhook_opts.url,
        access_ttl_seconds: auth_opts.access_ttl_seconds,
        refresh_ttl_seconds: auth_opts.refresh_ttl_seconds,
        exclusive_issuance: auth_opts.exclusive_issuance,
        trusted_proxies,
    }))
}
