//! In-process SAP stand-in
//!
//! Implements the same function modules as the real system against an
//! in-memory catalogue. Used when `sap.transport: simulated` and by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::error::RfcError;
use super::functions::{
    self, GoodsMovementExport, GoodsMovementImport, HuLookupExport, HuLookupImport, HuRow,
    SlocListExport, SlocRow,
};
use super::models::{GoodsMovement, HandlingUnit, StorageLocation};
use super::transport::{ConnectionParams, RfcConnection, RfcParams, RfcTransport};

struct SimulatedSystem {
    /// principal → secret; empty accepts any non-blank logon
    users: HashMap<String, String>,
    units: HashMap<String, HandlingUnit>,
    locations: Vec<StorageLocation>,
    rejection: Option<String>,
    unreachable: bool,
    latency: Duration,
    next_document: u64,
    postings: Vec<GoodsMovement>,
}

impl Default for SimulatedSystem {
    fn default() -> Self {
        let locations = [
            ("1000", "Main Warehouse"),
            ("1001", "Production Area"),
            ("1002", "Shipping Area"),
        ]
        .into_iter()
        .map(|(id, name)| StorageLocation {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect();

        Self {
            users: HashMap::new(),
            units: HashMap::new(),
            locations,
            rejection: None,
            unreachable: false,
            latency: Duration::ZERO,
            next_document: 1000,
            postings: Vec::new(),
        }
    }
}

fn lock(system: &Mutex<SimulatedSystem>) -> MutexGuard<'_, SimulatedSystem> {
    system.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct SimulatedRfcTransport {
    system: Arc<Mutex<SimulatedSystem>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl SimulatedRfcTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A few handling units so a local instance can be clicked through
    pub fn with_demo_data() -> Self {
        let sap = Self::new();
        sap.add_unit("HU0001", "Dummy Material Description", "1000");
        sap.add_unit("HU0002", "Steel coil 2mm", "1000");
        sap.add_unit("HU0003", "Packaging film", "1001");
        sap
    }

    pub fn add_user(&self, principal: &str, secret: &str) {
        lock(&self.system)
            .users
            .insert(principal.to_string(), secret.to_string());
    }

    pub fn add_unit(&self, handling_unit: &str, description: &str, sloc: &str) {
        lock(&self.system).units.insert(
            handling_unit.to_string(),
            HandlingUnit {
                handling_unit: handling_unit.to_string(),
                description: Some(description.to_string()),
                sloc: Some(sloc.to_string()),
            },
        );
    }

    pub fn set_locations(&self, locations: Vec<StorageLocation>) {
        lock(&self.system).locations = locations;
    }

    /// Reject every posting with `message` until cleared with `None`
    pub fn reject_postings(&self, message: Option<&str>) {
        lock(&self.system).rejection = message.map(str::to_string);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        lock(&self.system).unreachable = unreachable;
    }

    pub fn set_latency(&self, latency: Duration) {
        lock(&self.system).latency = latency;
    }

    /// Next document is `DOC{start}`
    pub fn set_document_sequence(&self, start: u64) {
        lock(&self.system).next_document = start;
    }

    pub fn postings(&self) -> Vec<GoodsMovement> {
        lock(&self.system).postings.clone()
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    async fn round_trip(system: &Mutex<SimulatedSystem>, host: &str) -> Result<(), RfcError> {
        let latency = lock(system).latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if lock(system).unreachable {
            return Err(RfcError::Communication(format!(
                "partner '{}' not reached",
                host
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RfcTransport for SimulatedRfcTransport {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn open(&self, params: &ConnectionParams) -> Result<Box<dyn RfcConnection>, RfcError> {
        Self::round_trip(&self.system, &params.ashost).await?;

        {
            let system = lock(&self.system);
            let accepted = if system.users.is_empty() {
                !params.user.trim().is_empty() && !params.passwd.is_empty()
            } else {
                system.users.get(&params.user).map(String::as_str) == Some(params.passwd.as_str())
            };
            if !accepted {
                return Err(RfcError::LogonRejected(
                    "Name or password is incorrect (repeat logon)".to_string(),
                ));
            }
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedConnection {
            system: self.system.clone(),
            closed: self.closed.clone(),
            host: params.ashost.clone(),
        }))
    }
}

struct SimulatedConnection {
    system: Arc<Mutex<SimulatedSystem>>,
    closed: Arc<AtomicUsize>,
    host: String,
}

impl SimulatedConnection {
    fn lookup(&self, params: RfcParams) -> Result<RfcParams, RfcError> {
        let import: HuLookupImport = functions::from_params(functions::GET_HU_DATA, params)?;
        let unit = lock(&self.system).units.get(&import.barcode).cloned();
        match unit {
            Some(unit) => functions::to_params(&HuLookupExport {
                hu: Some(HuRow {
                    hu_number: unit.handling_unit,
                    description: unit.description,
                    sloc: unit.sloc,
                }),
            }),
            None => Err(RfcError::AbapException {
                key: functions::EXC_NOT_FOUND.to_string(),
                message: format!("Handling unit {} does not exist", import.barcode),
            }),
        }
    }

    fn list_locations(&self) -> Result<RfcParams, RfcError> {
        let slocs = lock(&self.system)
            .locations
            .iter()
            .map(|loc| SlocRow {
                lgort: loc.id.clone(),
                lgobe: loc.name.clone(),
            })
            .collect();
        functions::to_params(&SlocListExport { slocs })
    }

    fn post(&self, params: RfcParams) -> Result<RfcParams, RfcError> {
        let import: GoodsMovementImport =
            functions::from_params(functions::HU_GOODS_MOVEMENT, params)?;

        let mut system = lock(&self.system);
        system.postings.push(GoodsMovement {
            source_sloc: import.source_sloc,
            destination_sloc: import.dest_sloc,
            handling_units: import.items.into_iter().map(|row| row.hu_number).collect(),
        });

        let export = match system.rejection.clone() {
            Some(message) => GoodsMovementExport {
                doc_number: None,
                error_message: Some(message),
            },
            None => {
                let document = format!("DOC{}", system.next_document);
                system.next_document += 1;
                GoodsMovementExport {
                    doc_number: Some(document),
                    error_message: None,
                }
            }
        };
        functions::to_params(&export)
    }
}

#[async_trait]
impl RfcConnection for SimulatedConnection {
    async fn ping(&self) -> Result<(), RfcError> {
        self.invoke(functions::RFC_PING, RfcParams::new())
            .await
            .map(|_| ())
    }

    async fn invoke(&self, function: &str, params: RfcParams) -> Result<RfcParams, RfcError> {
        SimulatedRfcTransport::round_trip(&self.system, &self.host).await?;

        match function {
            functions::RFC_PING => Ok(RfcParams::new()),
            functions::GET_HU_DATA => self.lookup(params),
            functions::GET_SLOC_LIST => self.list_locations(),
            functions::HU_GOODS_MOVEMENT => self.post(params),
            other => Err(RfcError::AbapException {
                key: "FU_NOT_FOUND".to_string(),
                message: format!("Function module {} does not exist", other),
            }),
        }
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
