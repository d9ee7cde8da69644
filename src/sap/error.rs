//! SAP connector error types

use std::time::Duration;

use thiserror::Error;

use crate::vault::VaultError;

/// Failure reported by an RFC transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RfcError {
    #[error("Logon rejected: {0}")]
    LogonRejected(String),

    #[error("Communication failure: {0}")]
    Communication(String),

    /// Exception raised by the function module itself
    #[error("ABAP exception {key}: {message}")]
    AbapException { key: String, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl RfcError {
    pub fn is_exception(&self, name: &str) -> bool {
        matches!(self, RfcError::AbapException { key, .. } if key == name)
    }
}

/// Connector-level errors surfaced to callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SapError {
    #[error("Not logged in to SAP")]
    NotAuthenticated,

    #[error("SAP authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Failed to establish SAP connection: {0}")]
    ConnectionFailed(String),

    #[error("SAP remote call failed: {0}")]
    RemoteCallFailed(String),

    #[error("Credential vault error: {0}")]
    Vault(String),
}

impl SapError {
    pub fn code(&self) -> &'static str {
        match self {
            SapError::NotAuthenticated => "NOT_AUTHENTICATED",
            SapError::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            SapError::ConnectionFailed(_) => "CONNECTION_FAILED",
            SapError::RemoteCallFailed(_) => "REMOTE_CALL_FAILED",
            SapError::Vault(_) => "VAULT_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            SapError::NotAuthenticated | SapError::AuthenticationFailed(_) => 401,
            SapError::ConnectionFailed(_) | SapError::RemoteCallFailed(_) | SapError::Vault(_) => {
                500
            }
        }
    }
}

impl From<VaultError> for SapError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::NotAuthenticated => SapError::NotAuthenticated,
            other => SapError::Vault(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status() {
        assert_eq!(SapError::NotAuthenticated.http_status(), 401);
        assert_eq!(SapError::AuthenticationFailed("x".into()).http_status(), 401);
        assert_eq!(SapError::ConnectionFailed("x".into()).http_status(), 500);
        assert_eq!(SapError::RemoteCallFailed("x".into()).http_status(), 500);
    }

    #[test]
    fn test_vault_error_conversion() {
        assert_eq!(
            SapError::from(VaultError::NotAuthenticated),
            SapError::NotAuthenticated
        );
        assert!(matches!(
            SapError::from(VaultError::Cipher("bad".into())),
            SapError::Vault(_)
        ));
    }

    #[test]
    fn test_is_exception() {
        let err = RfcError::AbapException {
            key: "NOT_FOUND".into(),
            message: "no HU".into(),
        };
        assert!(err.is_exception("NOT_FOUND"));
        assert!(!err.is_exception("LOCKED"));
        assert!(!RfcError::Protocol("x".into()).is_exception("NOT_FOUND"));
    }

    #[test]
    fn test_display_includes_upstream_diagnostic() {
        let err = SapError::RemoteCallFailed(RfcError::Communication("partner not reached".into()).to_string());
        assert!(err.to_string().contains("partner not reached"));
    }
}
