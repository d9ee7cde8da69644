//! Session-scoped credential store
//!
//! Holds at most one `{principal, ciphertext}` pair per session. Entries
//! expire after the configured TTL; an expired entry reads as absent.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Identifier of the caller's web session (the `sid` claim of the bearer token)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encrypted credential as held in the store. Never contains plaintext.
#[derive(Clone)]
pub struct StoredCredential {
    pub principal: String,
    pub ciphertext: String,
    stored_at: Instant,
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

impl StoredCredential {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

pub struct SessionStore {
    entries: DashMap<SessionId, StoredCredential>,
    ttl: Duration,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or replace the credential for `session`
    pub fn put(&self, session: &SessionId, principal: &str, ciphertext: String) {
        self.entries.insert(
            session.clone(),
            StoredCredential {
                principal: principal.to_string(),
                ciphertext,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn get(&self, session: &SessionId) -> Option<StoredCredential> {
        // Drop an expired entry first; holding a read guard across remove would deadlock the shard
        self.entries
            .remove_if(session, |_, entry| entry.is_expired(self.ttl));
        self.entries.get(session).map(|entry| entry.value().clone())
    }

    /// Returns true if an entry was removed
    pub fn remove(&self, session: &SessionId) -> bool {
        self.entries.remove(session).is_some()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(self.ttl));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Periodically purge expired credentials until the runtime shuts down
    pub fn spawn_purge_task(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let purged = self.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = self.len(), "Expired SAP sessions purged");
                }
            }
        })
    }
}
