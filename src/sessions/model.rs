//! Session records and the values the authority hands back to callers.

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// One issued refresh credential. Rows are append-only; only `revoked` changes.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Also the `session_id` claim of the access credential issued alongside.
    pub record_id: Uuid,
    pub user_id: Uuid,
    /// Argon2id PHC string of the refresh secret.
    pub refresh_proof_hash: String,
    pub client_agent: String,
    pub client_ip: String,
    pub revoked: bool,
    pub issued_at: DateTime<Utc>,
}

impl SessionRecord {
    #[must_use]
    pub fn new(
        record_id: Uuid,
        user_id: Uuid,
        refresh_proof_hash: String,
        client: &ClientContext,
    ) -> Self {
        Self {
            record_id,
            user_id,
            refresh_proof_hash,
            client_agent: client.agent.clone(),
            client_ip: client.ip.clone(),
            revoked: false,
            issued_at: Utc::now(),
        }
    }

    /// A record issued in the future (clock skew between instances) is not expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        (now - self.issued_at)
            .to_std()
            .is_ok_and(|age| age > ttl)
    }
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("record_id", &self.record_id)
            .field("user_id", &self.user_id)
            .field("refresh_proof_hash", &"***")
            .field("client_agent", &self.client_agent)
            .field("client_ip", &self.client_ip)
            .field("revoked", &self.revoked)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Binding metadata of the caller: device fingerprint and network origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientContext {
    pub agent: String,
    pub ip: String,
}

impl ClientContext {
    #[must_use]
    pub fn new(agent: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            ip: ip.into(),
        }
    }
}

/// Access credential plus the plaintext refresh secret, returned exactly once.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

/// Outcome of a successful identity check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn record(issued_at: DateTime<Utc>) -> SessionRecord {
        let mut record = SessionRecord::new(
            Uuid::now_v7(),
            Uuid::new_v4(),
            "$argon2id$hash".to_string(),
            &ClientContext::new("agent", "10.0.0.1"),
        );
        record.issued_at = issued_at;
        record
    }

    #[test]
    fn expiry_uses_refresh_ttl() {
        let now = Utc::now();
        let ttl = Duration::from_secs(24 * 60 * 60);
        assert!(!record(now - TimeDelta::hours(23)).is_expired(now, ttl));
        assert!(record(now - TimeDelta::hours(25)).is_expired(now, ttl));
    }

    #[test]
    fn future_issue_time_is_not_expired() {
        let now = Utc::now();
        assert!(!record(now + TimeDelta::minutes(5)).is_expired(now, Duration::from_secs(1)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let record = record(Utc::now());
        assert!(!format!("{record:?}").contains("$argon2id$hash"));

        let pair = CredentialPair {
            access_token: "eyJ.access".to_string(),
            refresh_token: "refresh-secret".to_string(),
        };
        let rendered = format!("{pair:?}");
        assert!(!rendered.contains("eyJ.access"));
        assert!(!rendered.contains("refresh-secret"));
    }
}
