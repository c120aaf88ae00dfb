use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_ACCESS_TTL_SECONDS: &str = "access-ttl-seconds";
pub const ARG_REFRESH_TTL_SECONDS: &str = "refresh-ttl-seconds";
pub const ARG_EXCLUSIVE_ISSUANCE: &str = "exclusive-issuance";

/// Legacy variable honoured when `--jwt-secret` is not given.
pub const ENV_JWT_SECRET_FALLBACK: &str = "JWT_SECRET";

#[derive(Debug, Clone)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub access_ttl_seconds: u64,
    pub refresh_ttl_seconds: u64,
    pub exclusive_issuance: bool,
}

impl Options {
    /// Parse credential and session arguments from matches.
    ///
    /// # Errors
    /// Returns an error if no signing secret is configured or a TTL is zero.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .cloned()
            .or_else(|| std::env::var(ENV_JWT_SECRET_FALLBACK).ok())
            .filter(|v| !v.trim().is_empty());
        let Some(jwt_secret) = jwt_secret else {
            anyhow::bail!("missing required argument: --{ARG_JWT_SECRET}");
        };

        let access_ttl_seconds = matches
            .get_one::<u64>(ARG_ACCESS_TTL_SECONDS)
            .copied()
            .unwrap_or(900);
        let refresh_ttl_seconds = matches
            .get_one::<u64>(ARG_REFRESH_TTL_SECONDS)
            .copied()
            .unwrap_or(86_400);
        if access_ttl_seconds == 0 || refresh_ttl_seconds == 0 {
            anyhow::bail!(
                "--{ARG_ACCESS_TTL_SECONDS} and --{ARG_REFRESH_TTL_SECONDS} must be greater than zero"
            );
        }

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            access_ttl_seconds,
            refresh_ttl_seconds,
            exclusive_issuance: matches
                .get_one::<bool>(ARG_EXCLUSIVE_ISSUANCE)
                .copied()
                .unwrap_or(true),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HMAC secret used to sign access credentials")
                .long_help(
                    "HMAC secret used to sign access credentials (HS512). Falls back to JWT_SECRET.",
                )
                .env("TOKENWARD_JWT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_ACCESS_TTL_SECONDS)
                .long(ARG_ACCESS_TTL_SECONDS)
                .help("Access credential lifetime in seconds")
                .env("TOKENWARD_ACCESS_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TTL_SECONDS)
                .long(ARG_REFRESH_TTL_SECONDS)
                .help("Refresh window in seconds, measured from issuance")
                .env("TOKENWARD_REFRESH_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_EXCLUSIVE_ISSUANCE)
                .long(ARG_EXCLUSIVE_ISSUANCE)
                .help("Revoke a user's active session before issuing a new one")
                .env("TOKENWARD_EXCLUSIVE_ISSUANCE")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn parse(args: &[&str]) -> anyhow::Result<Options> {
        let matches = with_args(Command::new("test")).try_get_matches_from(args)?;
        Options::parse(&matches)
    }

    fn with_cleared_env<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        temp_env::with_vars(
            [
                ("TOKENWARD_JWT_SECRET", None::<&str>),
                (ENV_JWT_SECRET_FALLBACK, None::<&str>),
                ("TOKENWARD_ACCESS_TTL_SECONDS", None::<&str>),
                ("TOKENWARD_REFRESH_TTL_SECONDS", None::<&str>),
                ("TOKENWARD_EXCLUSIVE_ISSUANCE", None::<&str>),
            ],
            f,
        )
    }

    #[test]
    fn secret_is_required() {
        with_cleared_env(|| {
            let err = parse(&["test"]).err().map(|e| e.to_string());
            assert_eq!(
                err.as_deref(),
                Some("missing required argument: --jwt-secret")
            );
        });
    }

    #[test]
    fn blank_secret_is_rejected() {
        with_cleared_env(|| {
            assert!(parse(&["test", "--jwt-secret", "   "]).is_err());
        });
    }

    #[test]
    fn secret_falls_back_to_legacy_env() -> anyhow::Result<()> {
        temp_env::with_vars(
            [
                ("TOKENWARD_JWT_SECRET", None::<&str>),
                (ENV_JWT_SECRET_FALLBACK, Some("legacy-secret")),
            ],
            || {
                let options = parse(&["test"])?;
                assert_eq!(options.jwt_secret.expose_secret(), "legacy-secret");
                Ok(())
            },
        )
    }

    #[test]
    fn explicit_secret_wins_over_legacy_env() -> anyhow::Result<()> {
        temp_env::with_vars(
            [
                ("TOKENWARD_JWT_SECRET", None::<&str>),
                (ENV_JWT_SECRET_FALLBACK, Some("legacy-secret")),
            ],
            || {
                let options = parse(&["test", "--jwt-secret", "flag-secret"])?;
                assert_eq!(options.jwt_secret.expose_secret(), "flag-secret");
                Ok(())
            },
        )
    }

    #[test]
    fn ttl_and_issuance_flags() -> anyhow::Result<()> {
        with_cleared_env(|| {
            let options = parse(&[
                "test",
                "--jwt-secret",
                "s3cret",
                "--access-ttl-seconds",
                "60",
                "--refresh-ttl-seconds",
                "3600",
                "--exclusive-issuance",
                "false",
            ])?;
            assert_eq!(options.access_ttl_seconds, 60);
            assert_eq!(options.refresh_ttl_seconds, 3600);
            assert!(!options.exclusive_issuance);
            Ok(())
        })
    }

    #[test]
    fn zero_ttl_is_rejected() {
        with_cleared_env(|| {
            assert!(parse(&["test", "--jwt-secret", "s3cret", "--access-ttl-seconds", "0"]).is_err());
        });
    }

    #[test]
    fn debug_does_not_leak_secret() -> anyhow::Result<()> {
        with_cleared_env(|| {
            let options = parse(&["test", "--jwt-secret", "very-distinctive-secret"])?;
            assert!(!format!("{options:?}").contains("very-distinctive-secret"));
            Ok(())
        })
    }
}
