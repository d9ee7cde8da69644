//! SAP session handlers

use std::sync::Arc;

use axum::{Extension, Json, extract::State};

use super::super::auth::AuthenticatedUser;
use super::super::error::{ApiError, ApiErrorResponse};
use super::super::extract::ValidatedJson;
use super::super::state::AppState;
use super::super::types::{MessageResponse, SapLoginRequest, SapStatusResponse};

/// Log in to SAP
///
/// Validates the credentials with a trial connection and keeps them,
/// encrypted, for the caller's session.
#[utoipa::path(
    post,
    path = "/sap/login",
    request_body = SapLoginRequest,
    responses(
        (status = 200, description = "SAP login successful", body = MessageResponse),
        (status = 401, description = "Invalid SAP credentials", body = ApiErrorResponse),
        (status = 422, description = "Blank principal or secret", body = ApiErrorResponse),
        (status = 500, description = "Credential could not be stored", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "SAP"
)]
pub async fn sap_login(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<SapLoginRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let connector = state.connector(&user);
    connector.login(req.principal.trim(), &req.secret).await?;

    tracing::info!(user_id = user.user_id, principal = %req.principal.trim(), "SAP session opened");
    Ok(Json(MessageResponse::new("SAP login successful!")))
}

/// Log out of SAP
///
/// Drops the stored credential. Idempotent.
#[utoipa::path(
    post,
    path = "/sap/logout",
    responses(
        (status = 200, description = "SAP logout successful", body = MessageResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "SAP"
)]
pub async fn sap_logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<MessageResponse> {
    state.connector(&user).logout();
    Json(MessageResponse::new("SAP logout successful!"))
}

#[utoipa::path(
    get,
    path = "/sap/status",
    responses(
        (status = 200, description = "Whether this session holds an SAP credential", body = SapStatusResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "SAP"
)]
pub async fn sap_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<SapStatusResponse> {
    let principal = state.vaults.for_session(user.session_id).principal();
    Json(SapStatusResponse {
        logged_in: principal.is_some(),
        principal,
    })
}
