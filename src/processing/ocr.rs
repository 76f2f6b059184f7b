use crate::processing::ImageSource;
use crate::utils::{ScanError, ScannerConfig};
use log::{debug, info, warn};
use tesseract::Tesseract;

/// Recognized text and the engine's 0-100 confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    pub confidence: f32,
}

/// Text recognition backend. `progress` receives percentages in 0-100.
pub trait OcrEngine {
    fn recognize(
        &mut self,
        image: &[u8],
        progress: &mut dyn FnMut(u8),
    ) -> Result<OcrOutput, ScanError>;
}

pub struct TesseractEngine {
    language: String,
    datapath: Option<String>,
}

impl TesseractEngine {
    pub fn new(language: &str, datapath: Option<String>) -> Self {
        TesseractEngine {
            language: language.to_string(),
            datapath,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        TesseractEngine::new(&config.language, config.resolved_tessdata_prefix())
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(
        &mut self,
        image: &[u8],
        progress: &mut dyn FnMut(u8),
    ) -> Result<OcrOutput, ScanError> {
        progress(0);
        let tess = Tesseract::new(self.datapath.as_deref(), Some(self.language.as_str()))
            .map_err(|e| ScanError::OcrError(format!("Tesseract init error: {}", e)))?
            .set_image_from_mem(image)
            .map_err(|e| ScanError::OcrError(format!("Tesseract set image error: {}", e)))?;
        progress(20);

        let mut tess = tess
            .recognize()
            .map_err(|e| ScanError::OcrError(format!("Tesseract recognition error: {}", e)))?;
        progress(80);

        let text = tess
            .get_text()
            .map_err(|e| ScanError::OcrError(format!("Tesseract error: {}", e)))?;
        let confidence = tess.mean_text_conf().clamp(0, 100) as f32;
        progress(100);

        Ok(OcrOutput { text, confidence })
    }
}

/// When and how the second OCR pass runs.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub low_confidence_threshold: f32,
    pub retry_on_original: bool,
}

impl From<&ScannerConfig> for RetryPolicy {
    fn from(config: &ScannerConfig) -> Self {
        RetryPolicy {
            low_confidence_threshold: config.low_confidence_threshold,
            retry_on_original: config.retry_on_original,
        }
    }
}

pub struct OcrProcessor;

impl OcrProcessor {
    /// Recognize the preprocessed image, falling back to the original
    /// when confidence is low and the caller supplied a file.
    ///
    /// A retry restarts progress at 50 and finishes at 100.
    pub fn recognize_card<E: OcrEngine + ?Sized>(
        engine: &mut E,
        original: &ImageSource,
        preprocessed: &ImageSource,
        policy: RetryPolicy,
        progress: &mut dyn FnMut(u8),
    ) -> Result<OcrOutput, ScanError> {
        let primary_bytes = preprocessed.bytes()?;
        let primary = engine.recognize(&primary_bytes, progress)?;
        info!("OCR pass completed with confidence {:.1}", primary.confidence);

        let wants_retry = policy.retry_on_original
            && original.is_file()
            && primary.confidence < policy.low_confidence_threshold;
        if !wants_retry {
            return Ok(primary);
        }

        debug!(
            "Confidence {:.1} below {:.1}, retrying on the original image",
            primary.confidence, policy.low_confidence_threshold
        );
        progress(50);
        let original_bytes = original.bytes()?;
        let retried = match engine.recognize(&original_bytes, &mut |p| progress(50 + p / 2)) {
            Ok(output) => output,
            Err(e) => {
                warn!("Retry on original image failed, keeping first pass: {}", e);
                return Ok(primary);
            }
        };

        if retried.confidence > primary.confidence {
            debug!("Original image scored higher ({:.1})", retried.confidence);
            Ok(retried)
        } else {
            Ok(primary)
        }
    }
}
