pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AppConfig, SapTransportKind};
use crate::db::Database;
use crate::sap::{HttpRfcTransport, RfcTransport, SimulatedRfcTransport};
use crate::transfer::{MemoryTransferStore, PgTransferStore, TransferStore};
use crate::vault::{SecretCipher, SessionStore, SessionVaults};

pub use auth::{AuthenticatedUser, Claims, SessionTokenVerifier, session_auth_middleware};
pub use error::{ApiError, ApiErrorCode};
pub use extract::{ApiQuery, ValidatedJson};
pub use state::AppState;

/// Wire transport, vault and ledger from configuration
pub fn build_state(config: &AppConfig, pg_db: Option<Arc<Database>>) -> anyhow::Result<AppState> {
    let cipher = SecretCipher::from_hex(&config.vault.key_hex).context("Invalid vault key")?;
    let vaults = SessionVaults::new(
        Arc::new(SessionStore::new(config.vault.session_ttl())),
        Arc::new(cipher),
    );

    let transport: Arc<dyn RfcTransport> = match config.sap.transport {
        SapTransportKind::Gateway => {
            let client = reqwest::Client::builder()
                .connect_timeout(config.sap.call_timeout())
                .build()
                .context("Failed to build HTTP client for the RFC gateway")?;
            Arc::new(HttpRfcTransport::with_client(client, config.sap.base_url.clone()))
        }
        SapTransportKind::Simulated => {
            tracing::warn!("SAP transport is SIMULATED; no postings reach a real system");
            Arc::new(SimulatedRfcTransport::with_demo_data())
        }
    };

    let store: Arc<dyn TransferStore> = match &pg_db {
        Some(db) => Arc::new(PgTransferStore::new(db.pool().clone())),
        None => {
            tracing::warn!("No PostgreSQL configured; transfer history is kept in memory only");
            Arc::new(MemoryTransferStore::new())
        }
    };

    tracing::info!(
        sap_transport = transport.name(),
        ledger = store.name(),
        ashost = %config.sap.ashost,
        client = %config.sap.client,
        "Gateway state initialized"
    );

    Ok(AppState::new(
        transport,
        Arc::new(config.sap.clone()),
        vaults,
        store,
        config.history.default_limit,
        Arc::new(SessionTokenVerifier::new(config.auth.jwt_secret.clone())),
        pg_db,
    ))
}

/// All routes; everything except `/health` and the docs requires a bearer token
pub fn build_router(state: Arc<AppState>) -> Router {
    let sap_routes = Router::new()
        .route("/login", post(handlers::sap_login))
        .route("/logout", post(handlers::sap_logout))
        .route("/status", get(handlers::sap_status));

    let api_routes = Router::new()
        .route("/storage-locations", get(handlers::get_storage_locations))
        .route("/handling-unit/{barcode}", get(handlers::get_handling_unit))
        .route("/transfer", post(handlers::create_transfer))
        .route("/transfer-history", get(handlers::get_transfer_history));

    // Older client paths
    let legacy_routes = Router::new()
        .route("/hu/{barcode}", get(handlers::get_handling_unit))
        .route("/store", post(handlers::create_transfer));

    let private_routes = Router::new()
        .nest("/sap", sap_routes)
        .nest("/api", api_routes)
        .nest("/transfer", legacy_routes)
        .layer(from_fn_with_state(state.clone(), session_auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(private_routes)
        .with_state(state)
        // Stateless, added after with_state
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Start HTTP Gateway server
pub async fn run_server(config: &AppConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let sessions = state.vaults.store().clone();
    tracing::info!(
        session_ttl_secs = sessions.ttl().as_secs(),
        purge_interval_secs = config.vault.purge_interval().as_secs(),
        "SAP session purge task started"
    );
    let purge = sessions.spawn_purge_task(config.vault.purge_interval());

    let app = build_router(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port already in use?)", addr))?;

    tracing::info!(addr = %addr, "Gateway listening");
    tracing::info!("API Docs: http://{}/docs", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    purge.abort();
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
