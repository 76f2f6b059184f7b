use crate::models::{ExpectedIdentity, OcrText, ScanResult};
use crate::processing::*;
use crate::utils::{ScanError, ScannerConfig};
use crate::validation::*;
use log::{info, warn};

pub const SCAN_FAILED_MESSAGE: &str = "Failed to scan ID card. Please try again with a clearer image.";

/// Runs the whole card pipeline: preprocess, OCR, extract, assemble.
///
/// The OCR engine and the preprocessor are injected so the pipeline can be
/// driven without a Tesseract install.
pub struct IdScanner<E: OcrEngine, P: Preprocessor> {
    engine: E,
    preprocessor: P,
    config: ScannerConfig,
}

impl IdScanner<TesseractEngine, ImageProcessor> {
    pub fn from_config(config: ScannerConfig) -> Self {
        let engine = TesseractEngine::from_config(&config);
        let preprocessor = ImageProcessor::new(config.preprocess.clone());
        IdScanner::new(engine, preprocessor, config)
    }
}

impl<E: OcrEngine, P: Preprocessor> IdScanner<E, P> {
    pub fn new(engine: E, preprocessor: P, config: ScannerConfig) -> Self {
        IdScanner {
            engine,
            preprocessor,
            config,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Scan one card image. Never fails: infrastructure problems come back
    /// as an unsuccessful result carrying a retry message.
    pub fn scan(
        &mut self,
        image: &ImageSource,
        expected: Option<&ExpectedIdentity>,
        progress: &mut dyn FnMut(u8),
    ) -> ScanResult {
        match self.try_scan(image, expected, progress) {
            Ok(result) => result,
            Err(e) => {
                warn!("ID scan failed: {}", e);
                ScanResult::failed(SCAN_FAILED_MESSAGE)
            }
        }
    }

    fn try_scan(
        &mut self,
        image: &ImageSource,
        expected: Option<&ExpectedIdentity>,
        progress: &mut dyn FnMut(u8),
    ) -> Result<ScanResult, ScanError> {
        // Step 1: clean up the photo
        let preprocessed = self.preprocessor.preprocess(image);

        // Step 2: recognize, retrying on the original if needed
        let policy = RetryPolicy::from(&self.config);
        let ocr = OcrProcessor::recognize_card(&mut self.engine, image, &preprocessed, policy, progress)?;

        // Step 3: run every field extractor over the same text
        let fields = FieldExtractor::extract_all(&OcrText::new(&ocr.text));

        // Step 4: compare with the account holder, if one was given
        let name_match = match expected {
            Some(expected) => IdentityChecker::check(expected, fields.names.as_ref()),
            None => NameMatch::NotChecked,
        };

        let result = ResultAssembler::assemble(
            fields,
            ocr,
            &name_match,
            self.config.low_confidence_threshold,
        );
        info!(
            "Scan finished: success={}, confidence={:.1}, {} warning(s)",
            result.success,
            result.confidence,
            result.warnings.len()
        );
        Ok(result)
    }
}

/// Scan with Tesseract and the default configuration.
pub fn scan_id_card(
    image: &ImageSource,
    expected: Option<&ExpectedIdentity>,
    progress: &mut dyn FnMut(u8),
) -> ScanResult {
    IdScanner::from_config(ScannerConfig::default()).scan(image, expected, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScanOutcome, Sex};
    use crate::processing::ocr::tests::{output, ScriptedEngine};
    use crate::validation::assembler::{LOW_QUALITY_WARNING_PREFIX, NO_ID_NUMBER_ERROR};

    const FULL_CARD: &str = "\
JAMHURI YA KENYA
REPUBLIC OF KENYA
SERIAL NUMBER: 123456789 ID NUMBER: 12345678
FULL NAMES
JOHN KAMAU OTIENO
DATE OF BIRTH
15.08.1990
SEX
MALE
DISTRICT OF BIRTH
KIAMBU
PLACE OF ISSUE
THIKA
DATE OF ISSUE
20.01.2010
HOLDER'S SIGN.";

    fn scanner(engine: ScriptedEngine) -> IdScanner<ScriptedEngine, NoopPreprocessor> {
        IdScanner::new(engine, NoopPreprocessor, ScannerConfig::default())
    }

    fn card() -> ImageSource {
        ImageSource::File(b"card".to_vec())
    }

    #[test]
    fn test_complete_card() {
        let mut scanner = scanner(ScriptedEngine::single(FULL_CARD, 87.0));
        let result = scanner.scan(&card(), None, &mut |_| {});

        assert!(result.success);
        assert_eq!(result.id_number.as_deref(), Some("12345678"));
        assert_eq!(result.serial_number.as_deref(), Some("123456789"));
        assert_eq!(result.full_names.as_deref(), Some("JOHN KAMAU OTIENO"));
        assert_eq!(result.first_name.as_deref(), Some("JOHN"));
        assert_eq!(result.middle_name.as_deref(), Some("KAMAU"));
        assert_eq!(result.last_name.as_deref(), Some("OTIENO"));
        assert_eq!(result.date_of_birth.as_deref(), Some("1990-08-15"));
        assert_eq!(result.date_of_issue.as_deref(), Some("2010-01-20"));
        assert_eq!(result.sex, Some(Sex::Male));
        assert_eq!(result.district_of_birth.as_deref(), Some("KIAMBU"));
        assert_eq!(result.place_of_issue.as_deref(), Some("THIKA"));
        assert_eq!(result.full_text, FULL_CARD);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    }

    #[test]
    fn test_id_and_serial_on_one_line() {
        let text = "ID NUMBER: 12345678 SERIAL NUMBER: 123456789";
        let mut scanner = scanner(ScriptedEngine::single(text, 80.0));
        let result = scanner.scan(&card(), None, &mut |_| {});

        assert!(result.success);
        assert_eq!(result.id_number.as_deref(), Some("12345678"));
        assert_eq!(result.serial_number.as_deref(), Some("123456789"));
    }

    #[test]
    fn test_full_names_label() {
        let text = "ID NUMBER 22334455\nFULL NAMES\nJOHN KAMAU OTIENO";
        let mut scanner = scanner(ScriptedEngine::single(text, 80.0));
        let result = scanner.scan(&card(), None, &mut |_| {});

        assert_eq!(result.full_names.as_deref(), Some("JOHN KAMAU OTIENO"));
        assert_eq!(result.first_name.as_deref(), Some("JOHN"));
        assert_eq!(result.middle_name.as_deref(), Some("KAMAU"));
        assert_eq!(result.last_name.as_deref(), Some("OTIENO"));
    }

    #[test]
    fn test_date_of_birth_label() {
        let text = "ID NUMBER 22334455\nDATE OF BIRTH\n15.08.1990";
        let mut scanner = scanner(ScriptedEngine::single(text, 80.0));
        let result = scanner.scan(&card(), None, &mut |_| {});

        assert_eq!(result.date_of_birth.as_deref(), Some("1990-08-15"));
    }

    #[test]
    fn test_no_id_number_fails_with_guidance() {
        let text = "JAMHURI YA KENYA\nFULL NAMES\nJOHN KAMAU OTIENO\nDATE OF BIRTH\n15.08.1990";
        let mut scanner = scanner(ScriptedEngine::single(text, 80.0));
        let result = scanner.scan(&card(), None, &mut |_| {});

        assert!(!result.success);
        assert_eq!(result.id_number, None);
        assert_eq!(result.errors, vec![NO_ID_NUMBER_ERROR.to_string()]);
        assert!(matches!(result.outcome(), ScanOutcome::Failed { .. }));
    }

    #[test]
    fn test_low_confidence_still_succeeds_with_advisory() {
        let engine = ScriptedEngine::new(vec![Ok(output(FULL_CARD, 35.0)), Ok(output(FULL_CARD, 30.0))]);
        let mut scanner = scanner(engine);
        let result = scanner.scan(&card(), None, &mut |_| {});

        assert!(result.success);
        assert_eq!(result.confidence, 35.0);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with(LOW_QUALITY_WARNING_PREFIX)));
        // The retry ran against the original image.
        assert_eq!(scanner.engine().seen.len(), 2);
    }

    #[test]
    fn test_engine_failure_becomes_failed_result() {
        let mut scanner = scanner(ScriptedEngine::new(vec![Err("engine crashed".to_string())]));
        let result = scanner.scan(&card(), None, &mut |_| {});

        assert!(!result.success);
        assert_eq!(result.errors, vec![SCAN_FAILED_MESSAGE.to_string()]);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_undecodable_data_url_becomes_failed_result() {
        let mut scanner = scanner(ScriptedEngine::single(FULL_CARD, 90.0));
        let image = ImageSource::DataUrl("not a data url".to_string());
        let result = scanner.scan(&image, None, &mut |_| {});

        assert!(!result.success);
        assert_eq!(result.errors, vec![SCAN_FAILED_MESSAGE.to_string()]);
        assert!(scanner.engine().seen.is_empty());
    }

    #[test]
    fn test_expected_identity_mismatch_warns() {
        let mut scanner = scanner(ScriptedEngine::single(FULL_CARD, 90.0));
        let expected = ExpectedIdentity::new(Some("Peter"), Some("Mwangi"));
        let result = scanner.scan(&card(), Some(&expected), &mut |_| {});

        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("does not match"));
    }

    #[test]
    fn test_expected_identity_in_any_order_matches() {
        let mut scanner = scanner(ScriptedEngine::single(FULL_CARD, 90.0));
        let expected = ExpectedIdentity::new(Some("otieno"), Some("john"));
        let result = scanner.scan(&card(), Some(&expected), &mut |_| {});

        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    }

    #[test]
    fn test_success_tracks_id_number() {
        let samples = [
            "ID NUMBER: 12345678",
            "no digits at all",
            "SERIAL NUMBER: 123456789",
            "ID NO 1234567",
            "",
        ];
        for text in samples {
            let mut scanner = scanner(ScriptedEngine::single(text, 90.0));
            let result = scanner.scan(&card(), None, &mut |_| {});
            assert_eq!(result.success, result.id_number.is_some(), "input {:?}", text);
        }
    }
}
