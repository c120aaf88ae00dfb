use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use url::Url;

pub const ARG_WEBHOOK_URL: &str = "webhook-url";

/// Legacy variable honoured when `--webhook-url` is not given.
pub const ENV_WEBHOOK_URL_FALLBACK: &str = "WEBHOOK_URL";

#[derive(Debug, Clone)]
pub struct Options {
    pub url: Option<Url>,
}

impl Options {
    /// Parse the anomaly webhook target from matches.
    ///
    /// # Errors
    /// Returns an error if the URL is not an absolute http(s) URL.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let raw = matches
            .get_one::<String>(ARG_WEBHOOK_URL)
            .cloned()
            .or_else(|| std::env::var(ENV_WEBHOOK_URL_FALLBACK).ok())
            .filter(|v| !v.trim().is_empty());

        let Some(raw) = raw else {
            return Ok(Self { url: None });
        };

        let url = Url::parse(raw.trim()).with_context(|| format!("invalid --{ARG_WEBHOOK_URL}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("--{ARG_WEBHOOK_URL} must use http or https");
        }

        Ok(Self { url: Some(url) })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_WEBHOOK_URL)
            .long(ARG_WEBHOOK_URL)
            .help("URL notified when a session is refreshed from a new IP address")
            .long_help(
                "URL notified (HTTP POST, JSON) when a session is refreshed from a new IP address. Falls back to WEBHOOK_URL. When unset, IP changes are only logged.",
            )
            .env("TOKENWARD_WEBHOOK_URL"),
    )
}
