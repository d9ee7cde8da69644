//! Credential vault errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// No credential stored for this session (never logged in, logged out or expired)
    #[error("Not logged in to SAP")]
    NotAuthenticated,

    #[error("Invalid vault key: {0}")]
    InvalidKey(String),

    #[error("Cipher failure: {0}")]
    Cipher(String),
}

impl VaultError {
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::NotAuthenticated => "NOT_AUTHENTICATED",
            VaultError::InvalidKey(_) => "INVALID_KEY",
            VaultError::Cipher(_) => "CIPHER_FAILURE",
        }
    }
}
