pub mod auth;
pub mod logging;
pub mod webhook;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};
use std::net::IpAddr;

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_TRUSTED_PROXIES: &str = "trusted-proxies";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("tokenward")
        .about("Access and refresh credential authority")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8082")
                .env("TOKENWARD_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string")
                .long_help(
                    "PostgreSQL connection string. Falls back to DATABASE_URL. When neither is set, sessions are kept in process memory and lost on restart.",
                )
                .env("TOKENWARD_DSN"),
        )
        .arg(
            Arg::new(ARG_TRUSTED_PROXIES)
                .long(ARG_TRUSTED_PROXIES)
                .help("Proxy addresses allowed to set X-Forwarded-For / X-Real-IP")
                .long_help(
                    "Comma-separated proxy IP addresses. When set, forwarding headers are only honoured on connections from these peers and every other caller is identified by its socket address. When unset, forwarding headers are honoured from any peer.",
                )
                .env("TOKENWARD_TRUSTED_PROXIES")
                .value_delimiter(',')
                .value_parser(clap::value_parser!(IpAddr)),
        );

    let command = auth::with_args(command);
    let command = webhook::with_args(command);
    logging::with_args(command)
}
