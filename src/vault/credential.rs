//! Per-session credential vault

use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use super::cipher::SecretCipher;
use super::error::VaultError;
use super::session::{SessionId, SessionStore};

/// Decrypted SAP logon pair. The secret is wiped when dropped.
#[derive(Clone)]
pub struct SapCredential {
    principal: String,
    secret: Zeroizing<String>,
}

impl SapCredential {
    pub fn new(principal: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for SapCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SapCredential")
            .field("principal", &self.principal)
            .field("secret", &"***")
            .finish()
    }
}

/// Vault bound to one session.
///
/// Created per request from [`SessionVaults`]; the underlying store and
/// cipher are shared, the session id is not.
#[derive(Clone, Debug)]
pub struct CredentialVault {
    session: SessionId,
    store: Arc<SessionStore>,
    cipher: Arc<SecretCipher>,
}

impl CredentialVault {
    pub fn new(session: SessionId, store: Arc<SessionStore>, cipher: Arc<SecretCipher>) -> Self {
        Self {
            session,
            store,
            cipher,
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Encrypt `secret` and store it with `principal`, replacing any prior entry
    pub fn store(&self, principal: &str, secret: &str) -> Result<(), VaultError> {
        let ciphertext = self.cipher.encrypt(secret)?;
        self.store.put(&self.session, principal, ciphertext);
        Ok(())
    }

    /// Idempotent
    pub fn clear(&self) {
        if self.store.remove(&self.session) {
            tracing::debug!(session = %self.session, "SAP credential cleared");
        }
    }

    pub fn reveal(&self) -> Result<SapCredential, VaultError> {
        let entry = self
            .store
            .get(&self.session)
            .ok_or(VaultError::NotAuthenticated)?;

        match self.cipher.decrypt(&entry.ciphertext) {
            Ok(secret) => Ok(SapCredential {
                principal: entry.principal,
                secret,
            }),
            Err(e) => {
                // Undecryptable entries (rotated key) force a fresh login
                tracing::warn!(
                    session = %self.session,
                    principal = %entry.principal,
                    error = %e,
                    "Discarding undecryptable SAP credential"
                );
                self.store.remove(&self.session);
                Err(VaultError::NotAuthenticated)
            }
        }
    }

    /// Stored principal, without touching the secret
    pub fn principal(&self) -> Option<String> {
        self.store.get(&self.session).map(|entry| entry.principal)
    }
}

/// Shared vault resources; hands out a [`CredentialVault`] per session
#[derive(Clone, Debug)]
pub struct SessionVaults {
    store: Arc<SessionStore>,
    cipher: Arc<SecretCipher>,
}

impl SessionVaults {
    pub fn new(store: Arc<SessionStore>, cipher: Arc<SecretCipher>) -> Self {
        Self { store, cipher }
    }

    pub fn for_session(&self, session: SessionId) -> CredentialVault {
        CredentialVault::new(session, self.store.clone(), self.cipher.clone())
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }
}
