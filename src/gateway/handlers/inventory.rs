//! Storage locations and handling units, read from SAP

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue},
};

use super::super::auth::AuthenticatedUser;
use super::super::error::{ApiError, ApiErrorResponse};
use super::super::state::AppState;
use crate::sap::{ConnectionSlot, HandlingUnit, StorageLocation};

/// Set on a degraded storage-location list; value is the SAP error code
pub const SAP_ERROR_HEADER: HeaderName = HeaderName::from_static("x-sap-error");

/// List storage locations
///
/// Never fails. When SAP cannot be asked the list is empty and the
/// `x-sap-error` header names the cause.
#[utoipa::path(
    get,
    path = "/api/storage-locations",
    responses(
        (status = 200, description = "Storage locations; empty with x-sap-error when SAP is unavailable", body = Vec<StorageLocation>)
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn get_storage_locations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> (HeaderMap, Json<Vec<StorageLocation>>) {
    let connector = state.connector(&user);
    let mut slot = ConnectionSlot::new();
    let result = connector.list_storage_locations(&mut slot).await;
    slot.release().await;

    let mut headers = HeaderMap::new();
    if let Some(err) = &result.error {
        headers.insert(SAP_ERROR_HEADER, HeaderValue::from_static(err.code()));
    }
    (headers, Json(result.value))
}

/// Look up a handling unit by barcode
#[utoipa::path(
    get,
    path = "/api/handling-unit/{barcode}",
    params(("barcode" = String, Path, description = "Scanned handling unit barcode")),
    responses(
        (status = 200, description = "Handling unit found", body = HandlingUnit),
        (status = 401, description = "Not logged in to SAP", body = ApiErrorResponse),
        (status = 404, description = "Handling Unit not found", body = ApiErrorResponse),
        (status = 500, description = "SAP call failed", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn get_handling_unit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(barcode): Path<String>,
) -> Result<Json<HandlingUnit>, ApiError> {
    let barcode = barcode.trim();
    if barcode.is_empty() {
        return Err(ApiError::invalid_request("Barcode must not be blank"));
    }

    let connector = state.connector(&user);
    let mut slot = ConnectionSlot::new();
    let result = connector.lookup_handling_unit(&mut slot, barcode).await;
    slot.release().await;

    match result? {
        Some(unit) => Ok(Json(unit)),
        None => Err(ApiError::not_found("Handling Unit not found")),
    }
}
