//! Function module signatures and marshaling
//!
//! | Function                 | Imports / tables                          | Exports / tables             |
//! |--------------------------|-------------------------------------------|------------------------------|
//! | `RFC_PING`               | -                                         | -                            |
//! | `ZRFC_GET_HU_DATA`       | `I_BARCODE`                               | `E_HU_DATA`                  |
//! | `ZRFC_GET_SLOC_LIST`     | -                                         | `ET_SLOCS`                   |
//! | `ZRFC_HU_GOODS_MOVEMENT` | `I_SOURCE_SLOC`, `I_DEST_SLOC`, `IT_ITEMS` | `E_DOC_NUMBER`, `E_ERROR_MESSAGE` |

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::RfcError;
use super::transport::RfcParams;

pub const RFC_PING: &str = "RFC_PING";
pub const GET_HU_DATA: &str = "ZRFC_GET_HU_DATA";
pub const GET_SLOC_LIST: &str = "ZRFC_GET_SLOC_LIST";
pub const HU_GOODS_MOVEMENT: &str = "ZRFC_HU_GOODS_MOVEMENT";

/// ABAP exception raised by `ZRFC_GET_HU_DATA` for unknown barcodes
pub const EXC_NOT_FOUND: &str = "NOT_FOUND";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuLookupImport {
    #[serde(rename = "I_BARCODE")]
    pub barcode: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HuLookupExport {
    #[serde(rename = "E_HU_DATA", default)]
    pub hu: Option<HuRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HuRow {
    #[serde(rename = "HU_NUMBER", default)]
    pub hu_number: String,
    #[serde(rename = "MAKTX", default)]
    pub description: Option<String>,
    #[serde(rename = "LGORT", default)]
    pub sloc: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlocListExport {
    #[serde(rename = "ET_SLOCS", default)]
    pub slocs: Vec<SlocRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlocRow {
    #[serde(rename = "LGORT")]
    pub lgort: String,
    #[serde(rename = "LGOBE", default)]
    pub lgobe: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodsMovementImport {
    #[serde(rename = "I_SOURCE_SLOC")]
    pub source_sloc: String,
    #[serde(rename = "I_DEST_SLOC")]
    pub dest_sloc: String,
    #[serde(rename = "IT_ITEMS")]
    pub items: Vec<GoodsMovementRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodsMovementRow {
    #[serde(rename = "HU_NUMBER")]
    pub hu_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoodsMovementExport {
    #[serde(rename = "E_DOC_NUMBER", default)]
    pub doc_number: Option<String>,
    #[serde(rename = "E_ERROR_MESSAGE", default)]
    pub error_message: Option<String>,
}

pub fn to_params<T: Serialize>(value: &T) -> Result<RfcParams, RfcError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(RfcError::Protocol(format!(
            "parameters must marshal to an object, got {}",
            other
        ))),
        Err(e) => Err(RfcError::Protocol(format!("marshal failed: {}", e))),
    }
}

pub fn from_params<T: DeserializeOwned>(function: &str, params: RfcParams) -> Result<T, RfcError> {
    serde_json::from_value(serde_json::Value::Object(params))
        .map_err(|e| RfcError::Protocol(format!("unexpected {} result: {}", function, e)))
}

/// SAP pads character fields; blank means "not set"
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
