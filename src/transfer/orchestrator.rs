//! Transfer Orchestrator
//!
//! ```text
//! validate ──▶ SAP posting ──▶ local ledger write
//!    │              │                 │
//!    ▼              ▼                 ▼
//! InvalidRequest  ExternalRejected   LocalPersistenceFailed
//!                 (nothing written)  (SAP already posted, logged for reconciliation)
//! ```
//!
//! SAP is always called before the local write. There is no compensation in
//! SAP when the local write fails.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::error::TransferError;
use super::store::TransferStore;
use super::types::{MAX_TEXT_LEN, NewTransfer, SubmittedTransfer, TransferRequest};
use crate::sap::{ConnectionSlot, GoodsMovement, PostingOutcome, SapConnector};

pub struct TransferOrchestrator {
    store: Arc<dyn TransferStore>,
}

impl TransferOrchestrator {
    pub fn new(store: Arc<dyn TransferStore>) -> Self {
        Self { store }
    }

    /// Local preconditions; no side effects
    pub fn validate(req: &TransferRequest) -> Result<(), TransferError> {
        let source = req.source_sloc.trim();
        let destination = req.destination_sloc.trim();

        if source.is_empty() || destination.is_empty() {
            return Err(TransferError::InvalidRequest(
                "Source and destination storage locations are required".to_string(),
            ));
        }
        if source == destination {
            return Err(TransferError::InvalidRequest(
                "Source and destination storage locations must differ".to_string(),
            ));
        }
        check_len("source_sloc", source)?;
        check_len("destination_sloc", destination)?;
        if req.items.is_empty() {
            return Err(TransferError::InvalidRequest(
                "At least one handling unit is required".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(req.items.len());
        for line in &req.items {
            let hu = line.handling_unit.trim();
            if hu.is_empty() {
                return Err(TransferError::InvalidRequest(
                    "Handling unit code must not be blank".to_string(),
                ));
            }
            if !seen.insert(hu) {
                return Err(TransferError::InvalidRequest(format!(
                    "Handling unit {} is listed more than once",
                    hu
                )));
            }
            check_len("handling_unit", hu)?;
            if let Some(description) = &line.description {
                check_len("description", description)?;
            }
        }
        Ok(())
    }

    pub async fn submit(
        &self,
        connector: &SapConnector,
        slot: &mut ConnectionSlot,
        mut req: TransferRequest,
    ) -> Result<SubmittedTransfer, TransferError> {
        Self::validate(&req)?;

        req.source_sloc = req.source_sloc.trim().to_string();
        req.destination_sloc = req.destination_sloc.trim().to_string();
        for line in &mut req.items {
            line.handling_unit = line.handling_unit.trim().to_string();
        }

        let movement = GoodsMovement {
            source_sloc: req.source_sloc.clone(),
            destination_sloc: req.destination_sloc.clone(),
            handling_units: req.items.iter().map(|l| l.handling_unit.clone()).collect(),
        };

        let document = match connector.post_transfer(slot, &movement).await? {
            PostingOutcome::Posted { document_number } => document_number,
            PostingOutcome::Rejected { message } => {
                warn!(
                    user_id = req.user_id,
                    source = %req.source_sloc,
                    destination = %req.destination_sloc,
                    reason = %message,
                    "SAP rejected transfer"
                );
                return Err(TransferError::ExternalRejected(message));
            }
        };

        let new_transfer = NewTransfer {
            source_sloc: req.source_sloc,
            destination_sloc: req.destination_sloc,
            user_id: req.user_id,
            sap_document_number: document.clone(),
            items: req.items,
        };

        let record = match self.store.insert(&new_transfer).await {
            Ok(record) => record,
            Err(e) => {
                error!(
                    user_id = new_transfer.user_id,
                    source = %new_transfer.source_sloc,
                    destination = %new_transfer.destination_sloc,
                    sap_document = %document,
                    handling_units = ?movement.handling_units,
                    store = self.store.name(),
                    error = %e,
                    "RECONCILIATION REQUIRED: transfer posted in SAP but not recorded locally"
                );
                return Err(TransferError::LocalPersistenceFailed {
                    document,
                    reason: e.to_string(),
                });
            }
        };

        info!(
            transfer_id = record.header.id,
            user_id = record.header.user_id,
            source = %record.header.source_sloc_id,
            destination = %record.header.destination_sloc_id,
            sap_document = %document,
            items = record.items.len(),
            "Transfer posted and recorded"
        );

        Ok(SubmittedTransfer {
            record,
            sap_document_number: document,
        })
    }
}

/// Anything wider than the ledger column would fail the local write after SAP posted
fn check_len(field: &str, value: &str) -> Result<(), TransferError> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(TransferError::InvalidRequest(format!(
            "{} must be at most {} characters",
            field, MAX_TEXT_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SapConfig;
    use crate::sap::SimulatedRfcTransport;
    use crate::transfer::store::MemoryTransferStore;
    use crate::transfer::types::{HU_QUANTITY, MAX_TEXT_LEN, TransferLine};
    use crate::vault::{SecretCipher, SessionId, SessionStore, SessionVaults};
    use std::time::Duration;

    struct Fixture {
        sap: Arc<SimulatedRfcTransport>,
        store: Arc<MemoryTransferStore>,
        orchestrator: TransferOrchestrator,
        connector: SapConnector,
    }

    async fn fixture() -> Fixture {
        let sap = Arc::new(SimulatedRfcTransport::new());
        sap.add_user("alice", "goodpass");
        sap.add_unit("HU1", "Coil", "1000");
        sap.add_unit("HU2", "Film", "1000");

        let vaults = SessionVaults::new(
            Arc::new(SessionStore::new(Duration::from_secs(60))),
            Arc::new(SecretCipher::generate()),
        );
        let system = Arc::new(SapConfig {
            call_timeout_secs: 5,
            ..SapConfig::default()
        });
        let connector = SapConnector::new(
            sap.clone(),
            system,
            vaults.for_session(SessionId::new("s1")),
        );
        connector.login("alice", "goodpass").await.unwrap();

        let store = Arc::new(MemoryTransferStore::new());
        Fixture {
            sap,
            orchestrator: TransferOrchestrator::new(store.clone()),
            store,
            connector,
        }
    }

    fn request(source: &str, destination: &str, units: &[&str]) -> TransferRequest {
        TransferRequest {
            source_sloc: source.into(),
            destination_sloc: destination.into(),
            items: units.iter().map(|hu| TransferLine::new(*hu)).collect(),
            user_id: 7,
        }
    }

    #[test]
    fn test_validate() {
        assert!(TransferOrchestrator::validate(&request("1000", "1001", &["HU1"])).is_ok());

        let long = "H".repeat(MAX_TEXT_LEN + 1);
        for bad in [
            request("1000", "1000", &["HU1"]),
            request(" 1000", "1000 ", &["HU1"]),
            request("", "1001", &["HU1"]),
            request("1000", "1001", &[]),
            request("1000", "1001", &["HU1", "  "]),
            request("1000", "1001", &["HU1", "HU1"]),
            request(&long, "1001", &["HU1"]),
            request("1000", "1001", &[long.as_str()]),
        ] {
            assert!(matches!(
                TransferOrchestrator::validate(&bad),
                Err(TransferError::InvalidRequest(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_same_location_creates_nothing() {
        let f = fixture().await;
        let mut slot = ConnectionSlot::new();

        let err = f
            .orchestrator
            .submit(&f.connector, &mut slot, request("1000", "1000", &["HU1"]))
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::InvalidRequest(_)));
        assert!(f.store.is_empty());
        assert!(f.sap.postings().is_empty(), "SAP is not called");
        assert!(!slot.is_connected());
    }

    #[tokio::test]
    async fn test_successful_transfer_is_recorded() {
        let f = fixture().await;
        f.sap.set_document_sequence(1234);
        let mut slot = ConnectionSlot::new();

        let req = TransferRequest {
            items: vec![
                TransferLine::new("HU1").with_description("Coil"),
                TransferLine::new("HU2"),
            ],
            ..request("1000", "1001", &[])
        };
        let submitted = f
            .orchestrator
            .submit(&f.connector, &mut slot, req)
            .await
            .unwrap();
        slot.release().await;

        assert_eq!(submitted.sap_document_number, "DOC1234");
        let header = &submitted.record.header;
        assert_eq!(header.sap_document_number.as_deref(), Some("DOC1234"));
        assert_eq!(header.source_sloc_id, "1000");
        assert_eq!(header.destination_sloc_id, "1001");
        assert_eq!(header.user_id, 7);

        let items = &submitted.record.items;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.quantity == HU_QUANTITY));
        assert_eq!(items[0].description.as_deref(), Some("Coil"));
        assert_eq!(f.store.len(), 1);

        let postings = f.sap.postings();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].handling_units, vec!["HU1", "HU2"]);
    }

    #[tokio::test]
    async fn test_overlong_description_is_rejected_before_sap() {
        let f = fixture().await;
        let mut slot = ConnectionSlot::new();

        let req = TransferRequest {
            items: vec![TransferLine::new("HU1").with_description("x".repeat(300))],
            ..request("1000", "1001", &[])
        };
        let err = f
            .orchestrator
            .submit(&f.connector, &mut slot, req)
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::InvalidRequest(msg) if msg.contains("description")));
        assert!(f.sap.postings().is_empty());
        assert!(f.store.is_empty());

        let at_limit = TransferRequest {
            items: vec![TransferLine::new("HU1").with_description("x".repeat(MAX_TEXT_LEN))],
            ..request("1000", "1001", &[])
        };
        assert!(TransferOrchestrator::validate(&at_limit).is_ok());
    }

    #[tokio::test]
    async fn test_business_rejection_records_nothing() {
        let f = fixture().await;
        f.sap.reject_postings(Some("Insufficient stock"));
        let mut slot = ConnectionSlot::new();

        let err = f
            .orchestrator
            .submit(&f.connector, &mut slot, request("1000", "1001", &["HU1"]))
            .await
            .unwrap_err();

        assert_eq!(err, TransferError::ExternalRejected("Insufficient stock".into()));
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_local_write_failure_carries_document() {
        let f = fixture().await;
        f.sap.set_document_sequence(55);
        f.store.set_fail_writes(true);
        let mut slot = ConnectionSlot::new();

        let err = f
            .orchestrator
            .submit(&f.connector, &mut slot, request("1000", "1001", &["HU1"]))
            .await
            .unwrap_err();

        match err {
            TransferError::LocalPersistenceFailed { document, .. } => assert_eq!(document, "DOC55"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(f.sap.postings().len(), 1, "SAP posting is not compensated");
    }

    #[tokio::test]
    async fn test_logged_out_is_not_authenticated() {
        let f = fixture().await;
        f.connector.logout();
        let mut slot = ConnectionSlot::new();

        let err = f
            .orchestrator
            .submit(&f.connector, &mut slot, request("1000", "1001", &["HU1"]))
            .await
            .unwrap_err();

        assert_eq!(err, TransferError::NotAuthenticated);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_sap_is_connection_failure() {
        let f = fixture().await;
        f.sap.set_unreachable(true);
        let mut slot = ConnectionSlot::new();

        let err = f
            .orchestrator
            .submit(&f.connector, &mut slot, request("1000", "1001", &["HU1"]))
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::ConnectionFailed(_)));
    }
}
