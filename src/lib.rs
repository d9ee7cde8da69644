//! HU Transfer - SAP handling-unit transfer service
//!
//! Moves handling units between storage locations through SAP function
//! modules and keeps a local history of every posted movement.
//!
//! # Modules
//!
//! - [`vault`] - Per-session, encrypted SAP credential storage
//! - [`sap`] - RFC transport abstraction and the SAP connector
//! - [`transfer`] - Transfer orchestration, ledger store and history
//! - [`db`] - PostgreSQL pool and embedded migrations
//! - [`gateway`] - HTTP API (axum), bearer-token auth, OpenAPI docs
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────────┐    ┌──────────┐
//! │ Gateway  │───▶│ Connector │───▶│ RfcTransport │───▶│   SAP    │
//! │ (axum)   │    │ (+ Vault) │    │ (HTTP / sim) │    │          │
//! └────┬─────┘    └───────────┘    └──────────────┘    └──────────┘
//!      │          ┌──────────────┐    ┌──────────────┐
//!      └─────────▶│ Orchestrator │───▶│ TransferStore│  (PostgreSQL / memory)
//!                 └──────────────┘    └──────────────┘
//! ```

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod sap;
pub mod transfer;
pub mod vault;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use sap::{ConnectionSlot, SapConnector, SapError};
pub use transfer::{HistoryReader, TransferError, TransferOrchestrator};
pub use vault::{CredentialVault, SessionVaults};
