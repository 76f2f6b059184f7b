use crate::models::ScanOutcome;
use crate::utils::ScanError;
use serde::{Deserialize, Serialize};

/// Body of a "found ID" report to the public registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundIdPayload {
    pub id_number: String,
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
}

impl FoundIdPayload {
    /// Only a scan that produced an ID number can be reported.
    pub fn from_outcome(outcome: &ScanOutcome) -> Result<Self, ScanError> {
        match outcome {
            ScanOutcome::Extracted { fields, .. } => Ok(FoundIdPayload {
                id_number: fields.id_number.clone(),
                name: fields.names.as_ref().map(|n| n.full_names.clone()),
                date_of_birth: fields.date_of_birth.clone(),
            }),
            ScanOutcome::Failed { reason } => Err(ScanError::ScanRejected(reason.clone())),
        }
    }

    pub fn to_json(&self) -> Result<String, ScanError> {
        Ok(serde_json::to_string(self)?)
    }
}
