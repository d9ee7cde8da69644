//! SAP Credential Vault
//!
//! Keeps the SAP logon of each web session encrypted at rest in a
//! process-local, TTL-bounded store.
//!
//! ```text
//! login ──store()──▶ [SessionStore: sid → {principal, AES-GCM(secret)}]
//!                              │
//! request ──reveal()───────────┘──▶ SapCredential (zeroized on drop)
//! ```

pub mod cipher;
pub mod credential;
pub mod error;
pub mod session;

pub use cipher::SecretCipher;
pub use credential::{CredentialVault, SapCredential, SessionVaults};
pub use error::VaultError;
pub use session::{SessionId, SessionStore};
