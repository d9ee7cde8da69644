//! SAP Connector
//!
//! One connector is built per request from the caller's [`CredentialVault`].
//! The live connection for that request is carried in a [`ConnectionSlot`]
//! owned by the handler and passed into every remote operation.
//!
//! ```text
//! ConnectionSlot: Disconnected ──ensure_connection()──▶ Connected
//!                      ▲                                     │
//!                      └──────────── release() ◀─────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::error::{RfcError, SapError};
use super::functions::{
    self, GoodsMovementExport, GoodsMovementImport, GoodsMovementRow, HuLookupExport,
    HuLookupImport, SlocListExport,
};
use super::models::{Degraded, GoodsMovement, HandlingUnit, PostingOutcome, StorageLocation};
use super::transport::{ConnectionParams, RfcConnection, RfcParams, RfcTransport};
use crate::config::SapConfig;
use crate::vault::{CredentialVault, SapCredential};

/// Request-local SAP connection. Never shared between requests.
#[derive(Default)]
pub struct ConnectionSlot {
    conn: Option<Box<dyn RfcConnection>>,
}

impl ConnectionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Close the connection, if one was opened during this request
    pub async fn release(mut self) {
        if let Some(conn) = self.conn.take() {
            conn.close().await;
        }
    }
}

pub struct SapConnector {
    transport: Arc<dyn RfcTransport>,
    system: Arc<SapConfig>,
    vault: CredentialVault,
}

impl SapConnector {
    pub fn new(transport: Arc<dyn RfcTransport>, system: Arc<SapConfig>, vault: CredentialVault) -> Self {
        Self {
            transport,
            system,
            vault,
        }
    }

    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    /// Validate `principal`/`secret` against SAP and keep them for this session.
    ///
    /// The trial connection is closed before returning; later requests open
    /// their own.
    pub async fn login(&self, principal: &str, secret: &str) -> Result<(), SapError> {
        let credential = SapCredential::new(principal, secret);

        let trial = self.open(&credential).await.map_err(|e| {
            warn!(principal = %principal, transport = self.transport.name(), error = %e, "SAP login rejected");
            SapError::AuthenticationFailed(e.to_string())
        })?;

        let ping = self.bounded(trial.ping()).await;
        trial.close().await;
        if let Err(e) = ping {
            warn!(principal = %principal, error = %e, "SAP login ping failed");
            return Err(SapError::AuthenticationFailed(e.to_string()));
        }

        self.vault.store(principal, secret)?;
        info!(principal = %principal, session = %self.vault.session(), "SAP login successful");
        Ok(())
    }

    pub fn logout(&self) {
        self.vault.clear();
        info!(session = %self.vault.session(), "SAP logout");
    }

    /// Connection for the current request, opened from the stored credential on first use
    pub async fn ensure_connection<'a>(
        &self,
        slot: &'a mut ConnectionSlot,
    ) -> Result<&'a dyn RfcConnection, SapError> {
        let conn = match slot.conn.take() {
            Some(conn) => conn,
            None => {
                let credential = self.vault.reveal()?;
                let conn = self.open(&credential).await.map_err(|e| {
                    error!(principal = %credential.principal(), error = %e, "SAP re-connection failed");
                    SapError::ConnectionFailed(e.to_string())
                })?;
                debug!(principal = %credential.principal(), "SAP connection opened for request");
                conn
            }
        };
        Ok(&**slot.conn.insert(conn))
    }

    /// `Ok(None)` when SAP does not know the barcode
    pub async fn lookup_handling_unit(
        &self,
        slot: &mut ConnectionSlot,
        barcode: &str,
    ) -> Result<Option<HandlingUnit>, SapError> {
        let import = HuLookupImport {
            barcode: barcode.to_string(),
        };

        let result = self
            .call(slot, functions::GET_HU_DATA, functions::to_params(&import))
            .await;

        let export: HuLookupExport = match result {
            Ok(params) => functions::from_params(functions::GET_HU_DATA, params)
                .map_err(|e| remote_failure(functions::GET_HU_DATA, e))?,
            Err(CallError::Rfc(e)) if e.is_exception(functions::EXC_NOT_FOUND) => {
                debug!(barcode = %barcode, "Handling unit not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into_sap(functions::GET_HU_DATA)),
        };

        Ok(export.hu.and_then(|row| {
            let handling_unit = row.hu_number.trim().to_string();
            if handling_unit.is_empty() {
                return None;
            }
            Some(HandlingUnit {
                handling_unit,
                description: functions::non_blank(row.description),
                sloc: functions::non_blank(row.sloc),
            })
        }))
    }

    /// Never fails: on error the list is empty and the cause is returned alongside.
    ///
    /// An empty degraded list does not mean SAP has no storage locations.
    pub async fn list_storage_locations(
        &self,
        slot: &mut ConnectionSlot,
    ) -> Degraded<Vec<StorageLocation>> {
        match self.try_list_storage_locations(slot).await {
            Ok(locations) => Degraded::ok(locations),
            Err(e) => {
                warn!(session = %self.vault.session(), error = %e, "Storage location list unavailable");
                Degraded::fallback(Vec::new(), e)
            }
        }
    }

    async fn try_list_storage_locations(
        &self,
        slot: &mut ConnectionSlot,
    ) -> Result<Vec<StorageLocation>, SapError> {
        let params = self
            .call(slot, functions::GET_SLOC_LIST, Ok(RfcParams::new()))
            .await
            .map_err(|e| e.into_sap(functions::GET_SLOC_LIST))?;
        let export: SlocListExport = functions::from_params(functions::GET_SLOC_LIST, params)
            .map_err(|e| remote_failure(functions::GET_SLOC_LIST, e))?;

        Ok(export
            .slocs
            .into_iter()
            .map(|row| StorageLocation {
                id: row.lgort.trim().to_string(),
                name: row.lgobe.trim().to_string(),
            })
            .collect())
    }

    /// Post the movement. SAP's own refusal comes back as
    /// [`PostingOutcome::Rejected`], not as an error.
    ///
    /// Callers validate the movement (distinct locations, at least one unit).
    pub async fn post_transfer(
        &self,
        slot: &mut ConnectionSlot,
        movement: &GoodsMovement,
    ) -> Result<PostingOutcome, SapError> {
        let import = GoodsMovementImport {
            source_sloc: movement.source_sloc.clone(),
            dest_sloc: movement.destination_sloc.clone(),
            items: movement
                .handling_units
                .iter()
                .map(|hu| GoodsMovementRow {
                    hu_number: hu.clone(),
                })
                .collect(),
        };

        let params = self
            .call(slot, functions::HU_GOODS_MOVEMENT, functions::to_params(&import))
            .await
            .map_err(|e| e.into_sap(functions::HU_GOODS_MOVEMENT))?;
        let export: GoodsMovementExport = functions::from_params(functions::HU_GOODS_MOVEMENT, params)
            .map_err(|e| remote_failure(functions::HU_GOODS_MOVEMENT, e))?;

        if let Some(message) = functions::non_blank(export.error_message) {
            return Ok(PostingOutcome::Rejected { message });
        }

        match functions::non_blank(export.doc_number) {
            Some(document_number) => Ok(PostingOutcome::Posted { document_number }),
            None => Err(remote_failure(
                functions::HU_GOODS_MOVEMENT,
                RfcError::Protocol("neither document number nor error message returned".to_string()),
            )),
        }
    }

    async fn open(&self, credential: &SapCredential) -> Result<Box<dyn RfcConnection>, RfcError> {
        let params = ConnectionParams::new(&self.system, credential);
        self.bounded(self.transport.open(&params)).await
    }

    async fn call(
        &self,
        slot: &mut ConnectionSlot,
        function: &str,
        params: Result<RfcParams, RfcError>,
    ) -> Result<RfcParams, CallError> {
        let params = params.map_err(CallError::Rfc)?;
        let conn = self.ensure_connection(slot).await.map_err(CallError::Sap)?;
        debug!(function, "Invoking RFC");
        self.bounded(conn.invoke(function, params))
            .await
            .map_err(CallError::Rfc)
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, RfcError>>,
    ) -> Result<T, RfcError> {
        let limit = self.system.call_timeout();
        tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(RfcError::Timeout(limit)))
    }
}

/// Failure of one remote call: either getting a connection or the call itself
enum CallError {
    Sap(SapError),
    Rfc(RfcError),
}

impl CallError {
    fn into_sap(self, function: &str) -> SapError {
        match self {
            CallError::Sap(e) => e,
            CallError::Rfc(e) => remote_failure(function, e),
        }
    }
}

fn remote_failure(function: &str, e: RfcError) -> SapError {
    error!(function, error = %e, "RFC call failed");
    SapError::RemoteCallFailed(format!("{}: {}", function, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sap::SimulatedRfcTransport;
    use crate::vault::{SecretCipher, SessionId, SessionStore, SessionVaults};
    use std::time::Duration;

    fn system() -> Arc<SapConfig> {
        Arc::new(SapConfig {
            base_url: "http://sap.invalid".into(),
            ashost: "10.0.0.1".into(),
            sysnr: "01".into(),
            client: "300".into(),
            lang: "EN".into(),
            call_timeout_secs: 5,
            ..SapConfig::default()
        })
    }

    fn vaults() -> SessionVaults {
        SessionVaults::new(
            Arc::new(SessionStore::new(Duration::from_secs(60))),
            Arc::new(SecretCipher::generate()),
        )
    }

    fn sap() -> Arc<SimulatedRfcTransport> {
        let sap = Arc::new(SimulatedRfcTransport::new());
        sap.add_user("alice", "goodpass");
        sap
    }

    fn connector(sap: &Arc<SimulatedRfcTransport>, vaults: &SessionVaults) -> SapConnector {
        SapConnector::new(sap.clone(), system(), vaults.for_session(SessionId::new("s1")))
    }

    #[tokio::test]
    async fn test_login_stores_credential() {
        let sap = sap();
        let vaults = vaults();
        let connector = connector(&sap, &vaults);

        connector.login("alice", "goodpass").await.unwrap();

        let credential = connector.vault().reveal().unwrap();
        assert_eq!(credential.principal(), "alice");
        assert_eq!(credential.secret(), "goodpass");
        assert_eq!(sap.open_count(), 1);
        assert_eq!(sap.closed_count(), 1, "trial connection is closed");
    }

    #[tokio::test]
    async fn test_login_with_bad_password_stores_nothing() {
        let sap = sap();
        let vaults = vaults();
        let connector = connector(&sap, &vaults);

        let err = connector.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, SapError::AuthenticationFailed(_)));
        assert!(connector.vault().principal().is_none());

        let mut slot = ConnectionSlot::new();
        let err = connector.ensure_connection(&mut slot).await.err().unwrap();
        assert_eq!(err, SapError::NotAuthenticated);
        assert!(!slot.is_connected());
    }

    #[tokio::test]
    async fn test_login_unreachable_is_authentication_failed() {
        let sap = sap();
        sap.set_unreachable(true);
        let vaults = vaults();
        let connector = connector(&sap, &vaults);

        let err = connector.login("alice", "goodpass").await.unwrap_err();
        match err {
            SapError::AuthenticationFailed(msg) => assert!(msg.contains("partner")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_is_reused_within_request() {
        let sap = sap();
        sap.add_unit("HU1", "Coil", "1000");
        let vaults = vaults();
        let connector = connector(&sap, &vaults);
        connector.login("alice", "goodpass").await.unwrap();

        let mut slot = ConnectionSlot::new();
        connector.lookup_handling_unit(&mut slot, "HU1").await.unwrap();
        connector.lookup_handling_unit(&mut slot, "HU1").await.unwrap();
        connector.list_storage_locations(&mut slot).await;
        assert_eq!(sap.open_count(), 2, "trial + one request connection");
        slot.release().await;
        assert_eq!(sap.closed_count(), 2);

        // A new request opens a new connection
        let mut slot = ConnectionSlot::new();
        connector.lookup_handling_unit(&mut slot, "HU1").await.unwrap();
        assert_eq!(sap.open_count(), 3);
    }

    #[tokio::test]
    async fn test_logout_then_lookup_is_not_authenticated() {
        let sap = sap();
        let vaults = vaults();
        let connector = connector(&sap, &vaults);
        connector.login("alice", "goodpass").await.unwrap();
        connector.logout();

        let mut slot = ConnectionSlot::new();
        let err = connector
            .lookup_handling_unit(&mut slot, "HU1")
            .await
            .unwrap_err();
        assert_eq!(err, SapError::NotAuthenticated);

        let movement = GoodsMovement {
            source_sloc: "1000".into(),
            destination_sloc: "1001".into(),
            handling_units: vec!["HU1".into()],
        };
        let err = connector.post_transfer(&mut slot, &movement).await.unwrap_err();
        assert_eq!(err, SapError::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_lookup_found_and_not_found() {
        let sap = sap();
        sap.add_unit("HU1", "Coil", "1000");
        let vaults = vaults();
        let connector = connector(&sap, &vaults);
        connector.login("alice", "goodpass").await.unwrap();

        let mut slot = ConnectionSlot::new();
        let unit = connector
            .lookup_handling_unit(&mut slot, "HU1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unit.handling_unit, "HU1");
        assert_eq!(unit.description.as_deref(), Some("Coil"));
        assert_eq!(unit.sloc.as_deref(), Some("1000"));

        let missing = connector.lookup_handling_unit(&mut slot, "HU404").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_lookup_transport_failure_is_remote_call_failed() {
        let sap = sap();
        let vaults = vaults();
        let connector = connector(&sap, &vaults);
        connector.login("alice", "goodpass").await.unwrap();

        let mut slot = ConnectionSlot::new();
        connector.ensure_connection(&mut slot).await.unwrap();
        sap.set_unreachable(true);

        let err = connector
            .lookup_handling_unit(&mut slot, "HU1")
            .await
            .unwrap_err();
        assert!(matches!(err, SapError::RemoteCallFailed(_)));
    }

    #[tokio::test]
    async fn test_reconnect_failure_is_connection_failed() {
        let sap = sap();
        let vaults = vaults();
        let connector = connector(&sap, &vaults);
        connector.login("alice", "goodpass").await.unwrap();
        sap.set_unreachable(true);

        let mut slot = ConnectionSlot::new();
        let err = connector.ensure_connection(&mut slot).await.err().unwrap();
        assert!(matches!(err, SapError::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn test_storage_locations_degrade_to_empty() {
        let sap = sap();
        let vaults = vaults();
        let connector = connector(&sap, &vaults);

        // Not logged in
        let mut slot = ConnectionSlot::new();
        let result = connector.list_storage_locations(&mut slot).await;
        assert!(result.value.is_empty());
        assert_eq!(result.error, Some(SapError::NotAuthenticated));

        connector.login("alice", "goodpass").await.unwrap();
        let result = connector.list_storage_locations(&mut slot).await;
        assert!(!result.is_degraded());
        assert_eq!(result.value.len(), 3);
        assert_eq!(result.value[0].id, "1000");

        sap.set_locations(vec![StorageLocation {
            id: "2000".into(),
            name: "Cold Store".into(),
        }]);
        let result = connector.list_storage_locations(&mut slot).await;
        assert_eq!(result.value.len(), 1);
        assert_eq!(result.value[0].name, "Cold Store");
    }

    #[tokio::test]
    async fn test_post_transfer_outcomes() {
        let sap = sap();
        sap.set_document_sequence(1234);
        let vaults = vaults();
        let connector = connector(&sap, &vaults);
        connector.login("alice", "goodpass").await.unwrap();

        let movement = GoodsMovement {
            source_sloc: "1000".into(),
            destination_sloc: "1001".into(),
            handling_units: vec!["HU1".into(), "HU2".into()],
        };

        let mut slot = ConnectionSlot::new();
        let outcome = connector.post_transfer(&mut slot, &movement).await.unwrap();
        assert_eq!(
            outcome,
            PostingOutcome::Posted {
                document_number: "DOC1234".into()
            }
        );
        assert_eq!(sap.postings().len(), 1);
        assert_eq!(sap.postings()[0].handling_units, vec!["HU1", "HU2"]);

        sap.reject_postings(Some("Insufficient stock for HU1"));
        let outcome = connector.post_transfer(&mut slot, &movement).await.unwrap();
        assert_eq!(
            outcome,
            PostingOutcome::Rejected {
                message: "Insufficient stock for HU1".into()
            }
        );
    }

    #[tokio::test]
    async fn test_slow_sap_times_out() {
        let sap = sap();
        let vaults = vaults();
        let connector = connector(&sap, &vaults);
        connector.login("alice", "goodpass").await.unwrap();
        sap.set_latency(Duration::from_secs(10));

        tokio::time::pause();
        let mut slot = ConnectionSlot::new();
        let err = connector
            .lookup_handling_unit(&mut slot, "HU1")
            .await
            .unwrap_err();
        assert!(matches!(err, SapError::ConnectionFailed(msg) if msg.contains("Timed out")));
    }

    #[tokio::test]
    async fn test_slow_call_on_open_connection_is_remote_call_failed() {
        let sap = sap();
        let vaults = vaults();
        let connector = connector(&sap, &vaults);
        connector.login("alice", "goodpass").await.unwrap();

        let mut slot = ConnectionSlot::new();
        connector.ensure_connection(&mut slot).await.unwrap();
        sap.set_latency(Duration::from_secs(10));

        tokio::time::pause();
        let err = connector
            .lookup_handling_unit(&mut slot, "HU1")
            .await
            .unwrap_err();
        assert!(matches!(err, SapError::RemoteCallFailed(msg) if msg.contains("Timed out")));
        assert!(slot.is_connected(), "connection stays with the request");
    }
}
