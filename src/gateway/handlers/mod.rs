//! HTTP handlers
//!
//! Every SAP-facing handler opens at most one connection for the request
//! (a [`ConnectionSlot`](crate::sap::ConnectionSlot)) and releases it before
//! responding.

pub mod health;
pub mod inventory;
pub mod sap;
pub mod transfer;

// utoipa path structs travel with the handlers for `ApiDoc`
pub use health::{__path_health_check, health_check};
pub use inventory::{
    __path_get_handling_unit, __path_get_storage_locations, get_handling_unit,
    get_storage_locations,
};
pub use sap::{__path_sap_login, __path_sap_logout, __path_sap_status, sap_login, sap_logout, sap_status};
pub use transfer::{
    __path_create_transfer, __path_get_transfer_history, create_transfer, get_transfer_history,
};
