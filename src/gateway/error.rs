//! API error types.
//!
//! Every failure leaves the gateway as `{code, error, message}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::sap::SapError;
use crate::transfer::TransferError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ApiErrorCode {
    /// 4001: SAP refused the operation
    ExternalRejected = 4001,
    /// 4011: No SAP session, or the stored credential is gone
    NotAuthenticated = 4011,
    /// 4012: SAP rejected the credentials at login
    AuthenticationFailed = 4012,
    /// 4013: Missing or malformed Authorization header
    MissingToken = 4013,
    /// 4014: Bearer token invalid or expired
    InvalidToken = 4014,
    /// 4041: Requested resource does not exist
    NotFound = 4041,
    /// 4221: Request failed local validation
    InvalidRequest = 4221,
    /// 5001: SAP connection could not be established
    ConnectionFailed = 5001,
    /// 5002: SAP remote call failed
    RemoteCallFailed = 5002,
    /// 5003: SAP posted but the local record failed
    LocalPersistenceFailed = 5003,
    /// 5004: Local storage error
    DatabaseError = 5004,
    /// 5000: Internal server error
    InternalError = 5000,
}

impl ApiErrorCode {
    /// Get error code as i32.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get error name string.
    pub fn name(self) -> &'static str {
        match self {
            Self::ExternalRejected => "EXTERNAL_REJECTED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::ConnectionFailed => "CONNECTION_FAILED",
            Self::RemoteCallFailed => "REMOTE_CALL_FAILED",
            Self::LocalPersistenceFailed => "LOCAL_PERSISTENCE_FAILED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code.
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::ExternalRejected => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated
            | Self::AuthenticationFailed
            | Self::MissingToken
            | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidRequest => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ConnectionFailed
            | Self::RemoteCallFailed
            | Self::LocalPersistenceFailed
            | Self::DatabaseError
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::NotFound, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidRequest, message)
    }
}

/// JSON response body for API errors.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    #[schema(example = 4011)]
    pub code: i32,
    #[schema(example = "NOT_AUTHENTICATED")]
    pub error: &'static str,
    #[schema(example = "Not logged in to SAP")]
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code.code(),
            error: self.code.name(),
            message: self.message,
        };
        (self.code.http_status(), Json(body)).into_response()
    }
}

impl From<SapError> for ApiError {
    fn from(e: SapError) -> Self {
        let code = match &e {
            SapError::NotAuthenticated => ApiErrorCode::NotAuthenticated,
            SapError::AuthenticationFailed(_) => ApiErrorCode::AuthenticationFailed,
            SapError::ConnectionFailed(_) => ApiErrorCode::ConnectionFailed,
            SapError::RemoteCallFailed(_) => ApiErrorCode::RemoteCallFailed,
            SapError::Vault(_) => ApiErrorCode::InternalError,
        };
        Self::new(code, e.to_string())
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let code = match &e {
            TransferError::InvalidRequest(_) => ApiErrorCode::InvalidRequest,
            TransferError::NotAuthenticated => ApiErrorCode::NotAuthenticated,
            TransferError::ConnectionFailed(_) => ApiErrorCode::ConnectionFailed,
            TransferError::RemoteCallFailed(_) => ApiErrorCode::RemoteCallFailed,
            TransferError::ExternalRejected(_) => ApiErrorCode::ExternalRejected,
            TransferError::LocalPersistenceFailed { .. } => ApiErrorCode::LocalPersistenceFailed,
            TransferError::DatabaseError(_) => ApiErrorCode::DatabaseError,
            TransferError::SystemError(_) => ApiErrorCode::InternalError,
        };
        Self::new(code, e.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::invalid_request(e.to_string())
    }
}
