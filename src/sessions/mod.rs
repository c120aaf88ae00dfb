//! Session lifecycle: records, storage, anomaly notification and the authority
//! that ties them together.
//!
//! ## Single active session
//!
//! Every user has one append-only series of session records. At most one of
//! them is live (`revoked = false`); rotation revokes the live record and
//! appends its replacement, logout revokes without replacement.
//!
//! ## Binding
//!
//! The record id doubles as the `session_id` claim of the access credential
//! issued with it. The identity check compares the two on every protected
//! request, so rotating or revoking a session invalidates its access
//! credential immediately, not at expiry.

mod authority;
mod error;
mod memory;
mod model;
mod notifier;
mod postgres;
mod store;

pub use authority::{AuthorityConfig, SessionAuthority};
pub use error::SessionError;
pub use memory::MemorySessionStore;
pub use model::{ClientContext, CredentialPair, Identity, SessionRecord};
pub use notifier::{AnomalyNotifier, IpChangeEvent, LogNotifier, WebhookNotifier};
pub use postgres::PgSessionStore;
pub use store::{SessionStore, StoreError};
