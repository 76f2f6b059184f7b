use crate::models::{ExtractedFields, ScanResult};
use crate::processing::OcrOutput;
use crate::validation::NameMatch;

pub const NO_ID_NUMBER_ERROR: &str = "Could not detect ID number. Please ensure the ID NUMBER area is clearly visible and retake the photo.";
pub const LOW_QUALITY_WARNING_PREFIX: &str = "Low image quality";

/// Turns extracted fields into the final scan result.
///
/// Only a missing ID number is an error. Everything else the card may be
/// missing, and a poor OCR pass, is reported as a warning.
pub struct ResultAssembler;

impl ResultAssembler {
    pub fn assemble(
        fields: ExtractedFields,
        ocr: OcrOutput,
        name_match: &NameMatch,
        low_confidence_threshold: f32,
    ) -> ScanResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if fields.id_number.is_none() {
            errors.push(NO_ID_NUMBER_ERROR.to_string());
        }

        let missing = [
            (fields.names.is_none(), "Could not read the full names. Please make sure the name area is visible."),
            (fields.date_of_birth.is_none(), "Could not detect date of birth."),
            (fields.date_of_issue.is_none(), "Could not detect date of issue."),
            (fields.sex.is_none(), "Could not detect sex."),
            (fields.district_of_birth.is_none(), "Could not detect district of birth."),
            (fields.place_of_issue.is_none(), "Could not detect place of issue."),
            (fields.serial_number.is_none(), "Could not detect serial number."),
        ];
        warnings.extend(
            missing
                .iter()
                .filter(|(absent, _)| *absent)
                .map(|(_, message)| message.to_string()),
        );

        if ocr.confidence < low_confidence_threshold {
            warnings.push(format!(
                "{} detected (confidence {:.0}%). Consider retaking the photo in better lighting.",
                LOW_QUALITY_WARNING_PREFIX, ocr.confidence
            ));
        }

        if let Some(warning) = name_match.warning() {
            warnings.push(warning);
        }

        ScanResult::from_fields(fields, ocr.text, ocr.confidence, errors, warnings)
    }
}
