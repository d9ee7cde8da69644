//! Request and response bodies of the HTTP API

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::transfer::{TransferLine, TransferRequest};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("must not be blank")));
    }
    Ok(())
}

// ============================================================================
// SAP session
// ============================================================================

/// SAP logon. `sap_user` / `sap_password` are accepted as aliases.
#[derive(Deserialize, Validate, ToSchema)]
pub struct SapLoginRequest {
    #[serde(default, alias = "sap_user")]
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "alice")]
    pub principal: String,
    #[serde(default, alias = "sap_password")]
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "goodpass")]
    pub secret: String,
}

impl fmt::Debug for SapLoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SapLoginRequest")
            .field("principal", &self.principal)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "SAP login successful!")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SapStatusResponse {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "alice")]
    pub principal: Option<String>,
}

// ============================================================================
// Transfer
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct TransferItemRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 255))]
    #[schema(example = "112345678900000001", max_length = 255)]
    pub handling_unit: String,
    #[validate(length(max = 255))]
    #[schema(example = "Steel coil 2mm", max_length = 255)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "distinct_locations"))]
pub struct TransferApiRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 255))]
    #[schema(example = "1000", max_length = 255)]
    pub source_sloc: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 255))]
    #[schema(example = "1001", max_length = 255)]
    pub destination_sloc: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one handling unit is required"))]
    #[validate(nested)]
    pub items: Vec<TransferItemRequest>,
}

fn distinct_locations(req: &TransferApiRequest) -> Result<(), ValidationError> {
    if req.source_sloc.trim() == req.destination_sloc.trim() {
        return Err(ValidationError::new("different").with_message(Cow::Borrowed(
            "destination_sloc must differ from source_sloc",
        )));
    }
    let mut seen = HashSet::new();
    for item in &req.items {
        if !seen.insert(item.handling_unit.trim()) {
            return Err(ValidationError::new("distinct")
                .with_message(Cow::Owned(format!("{} is listed more than once", item.handling_unit))));
        }
    }
    Ok(())
}

impl TransferApiRequest {
    pub fn into_request(self, user_id: i64) -> TransferRequest {
        TransferRequest {
            source_sloc: self.source_sloc,
            destination_sloc: self.destination_sloc,
            items: self
                .items
                .into_iter()
                .map(|item| TransferLine {
                    handling_unit: item.handling_unit,
                    description: item.description.filter(|d| !d.trim().is_empty()),
                })
                .collect(),
            user_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferCreatedResponse {
    #[schema(example = "Transfer posted successfully!")]
    pub message: String,
    #[schema(example = "DOC1234")]
    pub sap_document: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Number of transfers, 1..=200 (default 50)
    pub limit: Option<u32>,
}

// ============================================================================
// System
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    /// `up`, `down` or `memory` (no PostgreSQL configured)
    #[schema(example = "up")]
    pub database: &'static str,
    /// RFC transport in use
    #[schema(example = "http-gateway")]
    pub sap_transport: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transfer(value: serde_json::Value) -> TransferApiRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_login_accepts_aliases_and_rejects_blank() {
        let req: SapLoginRequest =
            serde_json::from_value(json!({"sap_user": "alice", "sap_password": "goodpass"})).unwrap();
        assert_eq!(req.principal, "alice");
        assert!(req.validate().is_ok());

        let req: SapLoginRequest = serde_json::from_value(json!({"principal": " "})).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("principal"));
        assert!(errors.field_errors().contains_key("secret"));
    }

    #[test]
    fn test_login_debug_hides_secret() {
        let req: SapLoginRequest =
            serde_json::from_value(json!({"principal": "alice", "secret": "goodpass"})).unwrap();
        assert!(!format!("{:?}", req).contains("goodpass"));
    }

    #[test]
    fn test_transfer_validation() {
        let ok = transfer(json!({
            "source_sloc": "1000",
            "destination_sloc": "1001",
            "items": [{"handling_unit": "HU1"}, {"handling_unit": "HU2", "description": "Film"}]
        }));
        assert!(ok.validate().is_ok());

        let same = transfer(json!({
            "source_sloc": "1000",
            "destination_sloc": "1000",
            "items": [{"handling_unit": "HU1"}]
        }));
        assert!(same.validate().is_err());

        let empty = transfer(json!({"source_sloc": "1000", "destination_sloc": "1001", "items": []}));
        assert!(empty.validate().is_err());

        let blank_hu = transfer(json!({
            "source_sloc": "1000",
            "destination_sloc": "1001",
            "items": [{"handling_unit": "  "}]
        }));
        assert!(blank_hu.validate().is_err());

        let long_sloc = transfer(json!({
            "source_sloc": "1".repeat(256),
            "destination_sloc": "1001",
            "items": [{"handling_unit": "HU1"}]
        }));
        assert!(long_sloc.validate().unwrap_err().field_errors().contains_key("source_sloc"));

        let long_description = transfer(json!({
            "source_sloc": "1000",
            "destination_sloc": "1001",
            "items": [{"handling_unit": "HU1", "description": "x".repeat(300)}]
        }));
        assert!(long_description.validate().is_err());
    }

    #[test]
    fn test_into_request_drops_blank_descriptions() {
        let req = transfer(json!({
            "source_sloc": "1000",
            "destination_sloc": "1001",
            "items": [{"handling_unit": "HU1", "description": ""}]
        }))
        .into_request(9);

        assert_eq!(req.user_id, 9);
        assert_eq!(req.items[0].description, None);
    }
}
