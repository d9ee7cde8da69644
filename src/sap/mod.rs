//! SAP Connector
//!
//! Talks to the SAP system through function module calls (RFC).
//!
//! # Layers
//!
//! - [`transport`]: `RfcTransport` / `RfcConnection` traits, JSON-marshaled parameters
//! - [`http`]: transport against an HTTP/JSON RFC gateway
//! - [`simulated`]: in-process stand-in with the same function modules
//! - [`functions`]: function module names and typed import/export structures
//! - [`connector`]: session-bound connector used by the request handlers
//!
//! Every remote call is bounded by `sap.call_timeout_secs`. Nothing is retried.

pub mod connector;
pub mod error;
pub mod functions;
pub mod http;
pub mod models;
pub mod simulated;
pub mod transport;

pub use connector::{ConnectionSlot, SapConnector};
pub use error::{RfcError, SapError};
pub use http::HttpRfcTransport;
pub use models::{Degraded, GoodsMovement, HandlingUnit, PostingOutcome, StorageLocation};
pub use simulated::SimulatedRfcTransport;
pub use transport::{ConnectionParams, RfcConnection, RfcParams, RfcTransport};
