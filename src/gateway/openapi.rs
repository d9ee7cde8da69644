//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::error::ApiErrorResponse;
use crate::gateway::types::{
    HealthResponse, MessageResponse, SapLoginRequest, SapStatusResponse, TransferApiRequest,
    TransferCreatedResponse, TransferItemRequest,
};
use crate::sap::{HandlingUnit, StorageLocation};
use crate::transfer::{TransferHeader, TransferItem, TransferRecord};

/// HS256 bearer token issued by the local login
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "HS256 token; `sub` is the local user id, `sid` the web session id",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "HU Transfer API",
        version = "1.0.0",
        description = "Moves SAP handling units between storage locations and keeps a local transfer history."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::sap_login,
        crate::gateway::handlers::sap_logout,
        crate::gateway::handlers::sap_status,
        crate::gateway::handlers::get_storage_locations,
        crate::gateway::handlers::get_handling_unit,
        crate::gateway::handlers::create_transfer,
        crate::gateway::handlers::get_transfer_history,
    ),
    components(
        schemas(
            ApiErrorResponse,
            HealthResponse,
            MessageResponse,
            SapLoginRequest,
            SapStatusResponse,
            StorageLocation,
            HandlingUnit,
            TransferApiRequest,
            TransferItemRequest,
            TransferCreatedResponse,
            TransferHeader,
            TransferItem,
            TransferRecord,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "SAP", description = "SAP session per web session (auth required)"),
        (name = "Inventory", description = "Storage locations and handling units from SAP (auth required)"),
        (name = "Transfer", description = "Handling-unit transfers and history (auth required)"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
