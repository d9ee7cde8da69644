use std::sync::Arc;

use crate::config::SapConfig;
use crate::db::Database;
use crate::sap::{RfcTransport, SapConnector};
use crate::transfer::{HistoryReader, TransferOrchestrator, TransferStore};
use crate::vault::SessionVaults;

use super::auth::{AuthenticatedUser, SessionTokenVerifier};

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    /// How RFC calls reach SAP
    pub transport: Arc<dyn RfcTransport>,
    /// SAP application server settings
    pub sap: Arc<SapConfig>,
    /// Per-session credential vaults
    pub vaults: SessionVaults,
    pub orchestrator: Arc<TransferOrchestrator>,
    pub history: Arc<HistoryReader>,
    pub tokens: Arc<SessionTokenVerifier>,
    /// PostgreSQL (absent when running on the in-memory ledger)
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        transport: Arc<dyn RfcTransport>,
        sap: Arc<SapConfig>,
        vaults: SessionVaults,
        store: Arc<dyn TransferStore>,
        history_default_limit: u32,
        tokens: Arc<SessionTokenVerifier>,
        pg_db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            transport,
            sap,
            vaults,
            orchestrator: Arc::new(TransferOrchestrator::new(store.clone())),
            history: Arc::new(HistoryReader::new(store, history_default_limit)),
            tokens,
            pg_db,
        }
    }

    /// Connector bound to the caller's session vault
    pub fn connector(&self, user: &AuthenticatedUser) -> SapConnector {
        SapConnector::new(
            self.transport.clone(),
            self.sap.clone(),
            self.vaults.for_session(user.session_id.clone()),
        )
    }
}
