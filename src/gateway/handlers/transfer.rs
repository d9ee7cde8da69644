//! Transfer submission and history

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode};

use super::super::auth::AuthenticatedUser;
use super::super::error::{ApiError, ApiErrorResponse};
use super::super::extract::{ApiQuery, ValidatedJson};
use super::super::state::AppState;
use super::super::types::{HistoryQuery, TransferApiRequest, TransferCreatedResponse};
use crate::sap::ConnectionSlot;
use crate::transfer::TransferRecord;

/// Post a handling-unit transfer to SAP and record it
#[utoipa::path(
    post,
    path = "/api/transfer",
    request_body = TransferApiRequest,
    responses(
        (status = 201, description = "Transfer posted successfully", body = TransferCreatedResponse),
        (status = 400, description = "SAP rejected the transfer", body = ApiErrorResponse),
        (status = 401, description = "Not logged in to SAP", body = ApiErrorResponse),
        (status = 422, description = "Validation failed", body = ApiErrorResponse),
        (status = 500, description = "SAP or local storage failure", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<TransferApiRequest>,
) -> Result<(StatusCode, Json<TransferCreatedResponse>), ApiError> {
    let connector = state.connector(&user);
    let mut slot = ConnectionSlot::new();
    let result = state
        .orchestrator
        .submit(&connector, &mut slot, req.into_request(user.user_id))
        .await;
    slot.release().await;

    let submitted = result?;
    Ok((
        StatusCode::CREATED,
        Json(TransferCreatedResponse {
            message: "Transfer posted successfully!".to_string(),
            sap_document: submitted.sap_document_number,
        }),
    ))
}

/// Recent transfers, newest first
#[utoipa::path(
    get,
    path = "/api/transfer-history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Transfers with their items", body = Vec<TransferRecord>),
        (status = 422, description = "Malformed query", body = ApiErrorResponse),
        (status = 500, description = "Storage error", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Transfer"
)]
pub async fn get_transfer_history(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<Vec<TransferRecord>>, ApiError> {
    let records = state.history.list_recent(query.limit).await?;
    Ok(Json(records))
}
