//! Transfer ledger types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One physical unit per line
pub const HU_QUANTITY: i32 = 1;

/// Width of the ledger's text columns (`VARCHAR(255)`), in characters
pub const MAX_TEXT_LEN: usize = 255;

/// Local record of a goods movement that SAP accepted
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TransferHeader {
    pub id: i64,
    #[schema(example = "1000")]
    pub source_sloc_id: String,
    #[schema(example = "1001")]
    pub destination_sloc_id: String,
    pub user_id: i64,
    #[schema(example = "DOC1234")]
    pub sap_document_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TransferItem {
    pub id: i64,
    pub transfer_header_id: i64,
    pub handling_unit: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Header with its items, as shown in the history
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TransferRecord {
    #[serde(flatten)]
    pub header: TransferHeader,
    pub items: Vec<TransferItem>,
}

/// Scanned line of a transfer request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLine {
    pub handling_unit: String,
    pub description: Option<String>,
}

impl TransferLine {
    pub fn new(handling_unit: impl Into<String>) -> Self {
        Self {
            handling_unit: handling_unit.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Transfer submitted by a signed-in operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source_sloc: String,
    pub destination_sloc: String,
    pub items: Vec<TransferLine>,
    pub user_id: i64,
}

/// Rows to write once SAP has posted the movement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    pub source_sloc: String,
    pub destination_sloc: String,
    pub user_id: i64,
    pub sap_document_number: String,
    pub items: Vec<TransferLine>,
}

/// Successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedTransfer {
    pub record: TransferRecord,
    pub sap_document_number: String,
}
