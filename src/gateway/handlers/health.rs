//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State};

use super::super::state::AppState;
use super::super::types::HealthResponse;

pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("GIT_HASH"));

/// Health check endpoint
///
/// Always 200; `database` reports the ledger backend. SAP is not contacted.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match &state.pg_db {
        Some(db) => match db.health_check().await {
            Ok(()) => "up",
            Err(e) => {
                tracing::warn!(error = %e, "PostgreSQL health check failed");
                "down"
            }
        },
        None => "memory",
    };

    Json(HealthResponse {
        status: "ok",
        database,
        sap_transport: state.transport.name(),
        version: VERSION,
    })
}
