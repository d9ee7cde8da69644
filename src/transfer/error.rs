//! Transfer Error Types

use thiserror::Error;

use crate::sap::SapError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Invalid transfer request: {0}")]
    InvalidRequest(String),

    // === SAP Errors ===
    #[error("Not logged in to SAP")]
    NotAuthenticated,

    #[error("Failed to establish SAP connection: {0}")]
    ConnectionFailed(String),

    #[error("SAP remote call failed: {0}")]
    RemoteCallFailed(String),

    /// SAP refused the posting; message is SAP's own
    #[error("SAP Error: {0}")]
    ExternalRejected(String),

    // === Local Errors ===
    /// SAP posted `document` but the local record could not be written
    #[error("Transfer posted to SAP as {document} but not recorded locally: {reason}")]
    LocalPersistenceFailed { document: String, reason: String },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal system error: {0}")]
    SystemError(String),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidRequest(_) => "INVALID_REQUEST",
            TransferError::NotAuthenticated => "NOT_AUTHENTICATED",
            TransferError::ConnectionFailed(_) => "CONNECTION_FAILED",
            TransferError::RemoteCallFailed(_) => "REMOTE_CALL_FAILED",
            TransferError::ExternalRejected(_) => "EXTERNAL_REJECTED",
            TransferError::LocalPersistenceFailed { .. } => "LOCAL_PERSISTENCE_FAILED",
            TransferError::DatabaseError(_) => "DATABASE_ERROR",
            TransferError::SystemError(_) => "SYSTEM_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::ExternalRejected(_) => 400,
            TransferError::NotAuthenticated => 401,
            TransferError::InvalidRequest(_) => 422,
            TransferError::ConnectionFailed(_)
            | TransferError::RemoteCallFailed(_)
            | TransferError::LocalPersistenceFailed { .. }
            | TransferError::DatabaseError(_)
            | TransferError::SystemError(_) => 500,
        }
    }
}

impl From<SapError> for TransferError {
    fn from(e: SapError) -> Self {
        match e {
            SapError::NotAuthenticated | SapError::AuthenticationFailed(_) => {
                TransferError::NotAuthenticated
            }
            SapError::ConnectionFailed(msg) => TransferError::ConnectionFailed(msg),
            SapError::RemoteCallFailed(msg) => TransferError::RemoteCallFailed(msg),
            SapError::Vault(msg) => TransferError::SystemError(msg),
        }
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        TransferError::DatabaseError(e.to_string())
    }
}
