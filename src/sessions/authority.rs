//! Session Authority: issuance, rotation, revocation and identity checks.
//!
//! Rotation order matters. Every check that revokes (reuse, proof mismatch,
//! agent mismatch) runs before anything new is written, and the old record is
//! revoked with a compare-and-set in the same store step that inserts the
//! replacement. Two rotations racing on the same refresh secret therefore
//! cannot both win: the loser finds the record already revoked and fails with
//! `TokenReuseDetected`.
//!
//! Argon2 work runs on the blocking pool; credentials are minted before the
//! store is touched so the per-user critical section stays short.

use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinError;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{
    AnomalyNotifier, ClientContext, CredentialPair, Identity, IpChangeEvent, SessionError,
    SessionRecord, SessionStore,
};
use crate::credentials::CredentialManager;

const DEFAULT_ACCESS_TTL_SECONDS: u64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: u64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthorityConfig {
    access_ttl: Duration,
    refresh_ttl: Duration,
    exclusive_issuance: bool,
}

impl AuthorityConfig {
    /// Defaults: 15 minute access credentials, 24 hour refresh window, and
    /// issuance that revokes the user's previous session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_ttl: Duration::from_secs(DEFAULT_ACCESS_TTL_SECONDS),
            refresh_ttl: Duration::from_secs(DEFAULT_REFRESH_TTL_SECONDS),
            exclusive_issuance: true,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: u64) -> Self {
        self.access_ttl = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: u64) -> Self {
        self.refresh_ttl = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_exclusive_issuance(mut self, exclusive: bool) -> Self {
        self.exclusive_issuance = exclusive;
        self
    }

    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    #[must_use]
    pub fn exclusive_issuance(&self) -> bool {
        self.exclusive_issuance
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates the credential lifecycle on top of a store and a credential manager.
#[derive(Clone)]
pub struct SessionAuthority {
    credentials: Arc<CredentialManager>,
    store: Arc<dyn SessionStore>,
    notifier: Option<Arc<dyn AnomalyNotifier>>,
    config: AuthorityConfig,
}

impl SessionAuthority {
    #[must_use]
    pub fn new(
        credentials: Arc<CredentialManager>,
        store: Arc<dyn SessionStore>,
        config: AuthorityConfig,
    ) -> Self {
        Self {
            credentials,
            store,
            notifier: None,
            config,
        }
    }

    /// Enable IP-change notifications.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn AnomalyNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Issue a fresh credential pair for `user_id`.
    ///
    /// # Errors
    /// Returns an infrastructure error if minting or persistence fails.
    pub async fn issue(
        &self,
        user_id: Uuid,
        client: &ClientContext,
    ) -> Result<CredentialPair, SessionError> {
        let (pair, record) = self.mint(user_id, client).await?;
        let session_id = record.record_id;

        if self.config.exclusive_issuance {
            let revoked = self.store.insert_exclusive(record).await?;
            if revoked > 0 {
                info!(%user_id, revoked, "revoked previous sessions on issuance");
            }
        } else {
            self.store.insert(record).await?;
        }

        info!(%user_id, %session_id, "session issued");
        Ok(pair)
    }

    /// Exchange a valid credential pair for a new one, consuming the old refresh secret.
    ///
    /// # Errors
    /// Returns a protocol violation (see [`SessionError::is_unauthorized`]) or an
    /// infrastructure error. Reuse, proof mismatch and agent mismatch revoke
    /// every live session of the user even though the call fails.
    pub async fn rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
        client: &ClientContext,
    ) -> Result<CredentialPair, SessionError> {
        let claims = self.credentials.parse_access_credential(access_token)?;
        let user_id = claims.sub;

        let Some(record) = self.store.find_latest(user_id).await? else {
            return Err(SessionError::NoActiveSession);
        };

        if record.revoked || record.record_id != claims.session_id {
            // A consumed pair came back: treat whatever is live as compromised.
            let revoked = self.store.revoke_active(user_id).await?;
            warn!(
                %user_id,
                session_id = %claims.session_id,
                revoked,
                "refresh credential reuse detected"
            );
            return Err(SessionError::TokenReuseDetected);
        }

        if record.is_expired(Utc::now(), self.config.refresh_ttl) {
            info!(%user_id, session_id = %record.record_id, "refresh window elapsed");
            return Err(SessionError::SessionExpired);
        }

        if !self
            .verify_refresh(&record.refresh_proof_hash, refresh_token)
            .await?
        {
            let revoked = self.store.revoke_active(user_id).await?;
            warn!(
                %user_id,
                session_id = %record.record_id,
                revoked,
                "refresh credential mismatch"
            );
            return Err(SessionError::RefreshMismatch);
        }

        if record.client_agent != client.agent {
            let revoked = self.store.revoke_active(user_id).await?;
            warn!(
                %user_id,
                session_id = %record.record_id,
                revoked,
                "client agent changed"
            );
            return Err(SessionError::AgentMismatch);
        }

        if record.client_ip != client.ip {
            self.report_ip_change(&record, client);
        }

        let (pair, replacement) = self.mint(user_id, client).await?;
        let session_id = replacement.record_id;

        if !self
            .store
            .replace_session(record.record_id, replacement)
            .await?
        {
            warn!(
                %user_id,
                session_id = %record.record_id,
                "refresh credential consumed concurrently"
            );
            return Err(SessionError::TokenReuseDetected);
        }

        info!(
            %user_id,
            %session_id,
            previous_session = %record.record_id,
            "session rotated"
        );
        Ok(pair)
    }

    /// Run [`Self::rotate`] on its own task so a dropped caller cannot cut the
    /// revoke/insert sequence in half.
    ///
    /// # Errors
    /// Same as [`Self::rotate`], plus `SessionError::Interrupted` if the task
    /// panicked or was aborted.
    pub async fn rotate_detached(
        &self,
        access_token: String,
        refresh_token: String,
        client: ClientContext,
    ) -> Result<CredentialPair, SessionError> {
        let authority = self.clone();
        let span = info_span!("session.rotate");
        tokio::spawn(
            async move {
                authority
                    .rotate(&access_token, &refresh_token, &client)
                    .await
            }
            .instrument(span),
        )
        .await
        .map_err(interrupted)?
    }

    /// Revoke the user's active session. Absent or already revoked sessions are fine.
    ///
    /// # Errors
    /// Returns `SessionError::Storage` if the store is unavailable.
    pub async fn revoke(&self, user_id: Uuid) -> Result<u64, SessionError> {
        let revoked = self.store.revoke_active(user_id).await?;
        info!(%user_id, revoked, "session revoked");
        Ok(revoked)
    }

    /// Resolve a bearer access credential into the identity of a live session.
    ///
    /// # Errors
    /// Returns `InvalidCredential` for a bad token and `SessionRevoked` when the
    /// token's session is no longer the user's active one.
    pub async fn authenticate(&self, access_token: &str) -> Result<Identity, SessionError> {
        let claims = self.credentials.parse_access_credential(access_token)?;
        let active = self.store.find_active(claims.sub).await?;

        match active {
            Some(record) if record.record_id == claims.session_id && !record.revoked => {
                Ok(Identity {
                    user_id: claims.sub,
                    session_id: claims.session_id,
                })
            }
            _ => Err(SessionError::SessionRevoked),
        }
    }

    /// Probe the backing store.
    ///
    /// # Errors
    /// Returns `SessionError::Storage` if the store does not answer.
    pub async fn ping(&self) -> Result<(), SessionError> {
        self.store.ping().await.map_err(SessionError::from)
    }

    /// Mint a credential pair and the record that binds it to `client`.
    async fn mint(
        &self,
        user_id: Uuid,
        client: &ClientContext,
    ) -> Result<(CredentialPair, SessionRecord), SessionError> {
        let session_id = Uuid::now_v7();
        let access_token =
            self.credentials
                .issue_access_credential(user_id, session_id, self.config.access_ttl)?;

        let credentials = Arc::clone(&self.credentials);
        let refresh = tokio::task::spawn_blocking(move || credentials.issue_refresh_credential())
            .await
            .map_err(interrupted)??;

        let record = SessionRecord::new(session_id, user_id, refresh.proof_hash, client);
        let pair = CredentialPair {
            access_token,
            refresh_token: refresh.secret,
        };
        Ok((pair, record))
    }

    async fn verify_refresh(
        &self,
        proof_hash: &str,
        candidate: &str,
    ) -> Result<bool, SessionError> {
        let credentials = Arc::clone(&self.credentials);
        let proof_hash = proof_hash.to_owned();
        let candidate = candidate.to_owned();
        tokio::task::spawn_blocking(move || {
            credentials.verify_refresh_credential(&proof_hash, &candidate)
        })
        .await
        .map_err(interrupted)
    }

    fn report_ip_change(&self, record: &SessionRecord, client: &ClientContext) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        notifier.notify(IpChangeEvent {
            user_id: record.user_id,
            old_ip: record.client_ip.clone(),
            new_ip: client.ip.clone(),
            client_agent: client.agent.clone(),
        });
    }
}

fn interrupted(err: JoinError) -> SessionError {
    error!("session task failed: {err}");
    SessionError::Interrupted
}

impl std::fmt::Debug for SessionAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthority")
            .field("credentials", &self.credentials)
            .field("notifier", &self.notifier.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
