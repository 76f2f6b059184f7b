use crate::models::{ExpectedIdentity, ScanOutcome, ScanResult, Sex};
use crate::processing::ImageSource;
use crate::utils::ScanError;
use crate::validation::{IdentityChecker, NameMatch};
use crate::verification::FaceCaptures;
use log::info;
use serde::Serialize;

/// Body of an authenticated "verify my identity" submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPayload {
    pub id_image: String,
    pub face_front: String,
    pub face_left: String,
    pub face_right: String,
    pub scanned_id_number: String,
    pub scanned_serial_number: Option<String>,
    pub scanned_full_names: Option<String>,
    pub scanned_first_name: Option<String>,
    pub scanned_middle_name: Option<String>,
    pub scanned_last_name: Option<String>,
    pub scanned_date_of_birth: Option<String>,
    pub scanned_date_of_issue: Option<String>,
    pub scanned_sex: Option<Sex>,
    pub scanned_district_of_birth: Option<String>,
    pub scanned_place_of_issue: Option<String>,
}

impl VerificationPayload {
    /// Gates, in order: the scan produced an ID number, the card's name
    /// matches the account name, and all three face poses were captured.
    pub fn build(
        scan: &ScanResult,
        account: &ExpectedIdentity,
        id_image: &ImageSource,
        captures: &FaceCaptures,
    ) -> Result<Self, ScanError> {
        let fields = match scan.outcome() {
            ScanOutcome::Extracted { fields, .. } => fields,
            ScanOutcome::Failed { reason } => return Err(ScanError::ScanRejected(reason)),
        };

        if account.is_empty() {
            return Err(ScanError::IdentityMismatch(
                "Your account has no name to compare with the ID. Please update your account name first.".to_string(),
            ));
        }
        if let NameMatch::Mismatched { expected, found } =
            IdentityChecker::check(account, fields.names.as_ref())
        {
            let found = if found.is_empty() { "unreadable".to_string() } else { found };
            return Err(ScanError::IdentityMismatch(format!(
                "The name on this ID ({}) does not match your account name ({}). Please update your account name or use a matching ID.",
                found, expected
            )));
        }

        let (face_front, face_left, face_right) =
            match (&captures.front, &captures.left, &captures.right) {
                (Some(front), Some(left), Some(right)) => (front.clone(), left.clone(), right.clone()),
                _ => {
                    let missing: Vec<String> =
                        captures.missing().iter().map(|pose| pose.to_string()).collect();
                    return Err(ScanError::CaptureIncomplete(format!(
                        "missing {} face capture(s)",
                        missing.join(", ")
                    )));
                }
            };

        info!("Verification payload ready for ID {}", fields.id_number);
        Ok(VerificationPayload {
            id_image: id_image.to_data_url(),
            face_front,
            face_left,
            face_right,
            scanned_id_number: fields.id_number,
            scanned_serial_number: fields.serial_number,
            scanned_full_names: fields.names.as_ref().map(|n| n.full_names.clone()),
            scanned_first_name: fields.names.as_ref().and_then(|n| n.first_name.clone()),
            scanned_middle_name: fields.names.as_ref().and_then(|n| n.middle_name.clone()),
            scanned_last_name: fields.names.as_ref().and_then(|n| n.last_name.clone()),
            scanned_date_of_birth: fields.date_of_birth,
            scanned_date_of_issue: fields.date_of_issue,
            scanned_sex: fields.sex,
            scanned_district_of_birth: fields.district_of_birth,
            scanned_place_of_issue: fields.place_of_issue,
        })
    }

    pub fn to_json(&self) -> Result<String, ScanError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedFields, NameParts};

    fn scan() -> ScanResult {
        let tokens: Vec<String> = ["JOHN", "KAMAU", "OTIENO"].iter().map(|t| t.to_string()).collect();
        let fields = ExtractedFields {
            id_number: Some("12345678".to_string()),
            serial_number: Some("123456789".to_string()),
            names: NameParts::from_tokens(&tokens),
            date_of_birth: Some("1990-08-15".to_string()),
            date_of_issue: Some("2010-01-20".to_string()),
            sex: Some(Sex::Male),
            district_of_birth: Some("KIAMBU".to_string()),
            place_of_issue: Some("THIKA".to_string()),
        };
        ScanResult::from_fields(fields, String::new(), 85.0, vec![], vec![])
    }

    fn complete() -> FaceCaptures {
        FaceCaptures {
            front: Some("data:image/jpeg;base64,AAAA".to_string()),
            left: Some("data:image/jpeg;base64,BBBB".to_string()),
            right: Some("data:image/jpeg;base64,CCCC".to_string()),
        }
    }

    fn id_image() -> ImageSource {
        ImageSource::DataUrl("data:image/jpeg;base64,IDID".to_string())
    }

    #[test]
    fn test_builds_payload_for_matching_account() {
        let account = ExpectedIdentity::new(Some("John"), Some("Otieno"));
        let payload = VerificationPayload::build(&scan(), &account, &id_image(), &complete()).unwrap();

        let json: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        assert_eq!(json["scannedIdNumber"], "12345678");
        assert_eq!(json["scannedFullNames"], "JOHN KAMAU OTIENO");
        assert_eq!(json["scannedFirstName"], "JOHN");
        assert_eq!(json["scannedLastName"], "OTIENO");
        assert_eq!(json["scannedDateOfBirth"], "1990-08-15");
        assert_eq!(json["scannedSex"], "MALE");
        assert_eq!(json["scannedMiddleName"], "KAMAU");
        assert_eq!(json["scannedDateOfIssue"], "2010-01-20");
        assert_eq!(json["scannedDistrictOfBirth"], "KIAMBU");
        assert_eq!(json["scannedPlaceOfIssue"], "THIKA");
        assert_eq!(json["faceLeft"], "data:image/jpeg;base64,BBBB");
        assert_eq!(json["idImage"], "data:image/jpeg;base64,IDID");
    }

    #[test]
    fn test_name_mismatch_blocks_submission() {
        let account = ExpectedIdentity::new(Some("Peter"), Some("Mwangi"));
        match VerificationPayload::build(&scan(), &account, &id_image(), &complete()) {
            Err(ScanError::IdentityMismatch(message)) => {
                assert!(message.contains("JOHN KAMAU OTIENO"));
                assert!(message.contains("update your account name or use a matching ID"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_account_without_name_is_blocked() {
        let account = ExpectedIdentity::default();
        assert!(matches!(
            VerificationPayload::build(&scan(), &account, &id_image(), &complete()),
            Err(ScanError::IdentityMismatch(_))
        ));
    }

    #[test]
    fn test_failed_scan_is_rejected() {
        let account = ExpectedIdentity::new(Some("John"), None);
        let failed = ScanResult::failed("Could not detect ID number.");
        assert!(matches!(
            VerificationPayload::build(&failed, &account, &id_image(), &complete()),
            Err(ScanError::ScanRejected(_))
        ));
    }

    #[test]
    fn test_incomplete_captures_are_rejected() {
        let account = ExpectedIdentity::new(Some("John"), None);
        let partial = FaceCaptures {
            right: None,
            ..complete()
        };
        match VerificationPayload::build(&scan(), &account, &id_image(), &partial) {
            Err(ScanError::CaptureIncomplete(message)) => assert!(message.contains("right")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
