/*
 * Responsibility
 * - PUT/DELETE /documents/receipt/{id} の query DTO
 */
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::dto::{parse_datetime, validate_patient_id};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiptPutQuery {
    #[serde(rename = "patientId")]
    pub patient_id: String,
    pub timestamp: String,
}

impl ReceiptPutQuery {
    /// Returns the read timestamp once both fields check out.
    pub fn validate(&self) -> Result<DateTime<Utc>, String> {
        validate_patient_id(&self.patient_id)?;
        parse_datetime(&self.timestamp)
            .ok_or_else(|| "timestamp must be an ISO 8601 date-time".to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiptDeleteQuery {
    #[serde(rename = "patientId")]
    pub patient_id: String,
}

impl ReceiptDeleteQuery {
    pub fn validate(&self) -> Result<(), String> {
        validate_patient_id(&self.patient_id).map(|_| ())
    }
}
