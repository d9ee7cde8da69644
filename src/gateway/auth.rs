//! Bearer token verification
//!
//! Local users sign in elsewhere; this service only verifies the HS256 token
//! they carry. `sub` is the local user id, `sid` the web session the SAP
//! credential is bound to.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiErrorCode};
use super::state::AppState;
use crate::vault::SessionId;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user_id as string)
    pub sid: String, // Web session id
    pub exp: usize,
    pub iat: usize,
}

/// Caller identity injected into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub session_id: SessionId,
}

pub struct SessionTokenVerifier {
    jwt_secret: String,
}

impl SessionTokenVerifier {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    /// Issue a token for `user_id` bound to `session`; used for local development
    pub fn issue_token(
        &self,
        user_id: i64,
        session: &SessionId,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            sid: session.as_str().to_string(),
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
    }

    /// Claims → caller identity
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        let claims = self.verify_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            ApiError::new(ApiErrorCode::InvalidToken, "Invalid or expired token")
        })?;

        let user_id = claims.sub.parse::<i64>().map_err(|_| {
            ApiError::new(ApiErrorCode::InvalidToken, "Token subject is not a user id")
        })?;
        if claims.sid.trim().is_empty() {
            return Err(ApiError::new(
                ApiErrorCode::InvalidToken,
                "Token carries no session id",
            ));
        }

        Ok(AuthenticatedUser {
            user_id,
            session_id: SessionId::new(claims.sid),
        })
    }
}

pub async fn session_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::new(ApiErrorCode::MissingToken, "Missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::new(ApiErrorCode::MissingToken, "Invalid token format"))?;

    let user = state.tokens.authenticate(token)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
