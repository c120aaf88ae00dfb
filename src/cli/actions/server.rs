use crate::{
    api::{self, handlers::TrustedProxies},
    credentials::CredentialManager,
    sessions::{
        AnomalyNotifier, AuthorityConfig, LogNotifier, MemorySessionStore, PgSessionStore,
        SessionAuthority, SessionStore, WebhookNotifier,
    },
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub jwt_secret: SecretString,
    pub webhook_url: Option<Url>,
    pub access_ttl_seconds: u64,
    pub refresh_ttl_seconds: u64,
    pub exclusive_issuance: bool,
    pub trusted_proxies: TrustedProxies,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the signing secret is unusable, the database cannot be
/// reached or migrated, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let credentials = Arc::new(
        CredentialManager::new(args.jwt_secret).context("Invalid access credential secret")?,
    );

    let store: Arc<dyn SessionStore> = match &args.dsn {
        Some(dsn) => {
            let pool = PgPoolOptions::new()
                .min_connections(1)
                .max_connections(5)
                .max_lifetime(Duration::from_secs(60 * 2))
                .test_before_acquire(true)
                .connect(dsn)
                .await
                .context("Failed to connect to database")?;

            let store = PgSessionStore::new(pool);
            store
                .apply_schema()
                .await
                .context("Failed to apply session schema")?;
            debug!("session schema applied");
            Arc::new(store)
        }
        None => {
            warn!("No DSN configured, sessions are kept in memory and lost on restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let config = AuthorityConfig::new()
        .with_access_ttl_seconds(args.access_ttl_seconds)
        .with_refresh_ttl_seconds(args.refresh_ttl_seconds)
        .with_exclusive_issuance(args.exclusive_issuance);

    let notifier: Arc<dyn AnomalyNotifier> = match args.webhook_url {
        Some(url) => {
            info!(webhook = %url, "IP change notifications enabled");
            Arc::new(WebhookNotifier::new(url).context("Failed to build webhook notifier")?)
        }
        None => Arc::new(LogNotifier),
    };

    let authority = SessionAuthority::new(credentials, store, config).with_notifier(notifier);

    if let TrustedProxies::Only(addrs) = &args.trusted_proxies {
        info!(?addrs, "forwarding headers honoured only from trusted proxies");
    }

    api::new(args.port, authority, args.trusted_proxies).await
}
