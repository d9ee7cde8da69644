//! Connector-facing SAP data types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::SapError;

/// Handling Unit as reported by SAP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HandlingUnit {
    #[schema(example = "112345678900000001")]
    pub handling_unit: String,
    #[schema(example = "Steel coil 2mm")]
    pub description: Option<String>,
    /// Storage location currently holding the unit
    #[schema(example = "1000")]
    pub sloc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StorageLocation {
    #[schema(example = "1000")]
    pub id: String,
    #[schema(example = "Main Warehouse")]
    pub name: String,
}

/// Goods movement posted by `ZRFC_HU_GOODS_MOVEMENT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsMovement {
    pub source_sloc: String,
    pub destination_sloc: String,
    pub handling_units: Vec<String>,
}

/// Result of a posting that reached SAP
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingOutcome {
    Posted { document_number: String },
    /// Business rejection by SAP (e.g. insufficient stock)
    Rejected { message: String },
}

/// Value that may have been degraded to a fallback because of `error`
#[derive(Debug, Clone)]
pub struct Degraded<T> {
    pub value: T,
    pub error: Option<SapError>,
}

impl<T> Degraded<T> {
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    pub fn fallback(value: T, error: SapError) -> Self {
        Self {
            value,
            error: Some(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
