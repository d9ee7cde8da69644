//! HU Transfer
//!
//! Posts a handling-unit movement between two storage locations to SAP and
//! mirrors the accepted movement into the local ledger.
//!
//! # Ordering
//!
//! ```text
//! validate → SAP ZRFC_HU_GOODS_MOVEMENT → INSERT header + items (one transaction)
//! ```
//!
//! # Invariants
//!
//! 1. **SAP first**: nothing is written locally unless SAP returned a document number
//! 2. **Atomic record**: header and items are written together or not at all
//! 3. **No compensation**: a failed local write leaves the SAP posting in place and
//!    is logged at error level with the document number for reconciliation
//! 4. **One unit per line**: every item has quantity 1

pub mod error;
pub mod history;
pub mod orchestrator;
pub mod store;
pub mod types;

pub use error::TransferError;
pub use history::HistoryReader;
pub use orchestrator::TransferOrchestrator;
pub use store::{MemoryTransferStore, PgTransferStore, TransferStore};
pub use types::{
    NewTransfer, SubmittedTransfer, TransferHeader, TransferItem, TransferLine, TransferRecord,
    TransferRequest,
};
