//! Extractors that reject with [`ApiError`] instead of axum's plain-text body

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::ApiError;

/// JSON body, deserialized and validated before the handler runs
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON: {}", e.body_text())))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value): Query<T> = Query::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_request(format!("Invalid query: {}", e.body_text())))?;
        Ok(ApiQuery(value))
    }
}
