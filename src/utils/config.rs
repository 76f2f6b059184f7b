use crate::utils::ScanError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Runtime settings for the scanner and the verification flow.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Tesseract language pack used for recognition.
    pub language: String,
    /// Directory holding `*.traineddata`; falls back to `TESSDATA_PREFIX`.
    pub tessdata_prefix: Option<String>,
    /// OCR confidence (0-100) under which the scan is flagged and retried.
    pub low_confidence_threshold: f32,
    /// Re-run OCR on the unprocessed original when confidence is low.
    pub retry_on_original: bool,
    pub preprocess: PreprocessConfig,
    /// Where in-progress face captures are kept between runs.
    pub capture_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub contrast_factor: f32,
    pub white_threshold: u8,
    pub black_threshold: u8,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            language: "eng".to_string(),
            tessdata_prefix: None,
            low_confidence_threshold: 50.0,
            retry_on_original: true,
            preprocess: PreprocessConfig::default(),
            capture_dir: std::env::temp_dir().join("idscan"),
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        PreprocessConfig {
            contrast_factor: 1.3,
            white_threshold: 140,
            black_threshold: 100,
        }
    }
}

impl ScannerConfig {
    /// Load a config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ScanError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScanError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: ScannerConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Config from `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ScanError> {
        match path {
            Some(path) => ScannerConfig::from_file(path),
            None => Ok(ScannerConfig::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if !(0.0..=100.0).contains(&self.low_confidence_threshold) {
            return Err(ScanError::ConfigError(format!(
                "low_confidence_threshold must be within 0-100, got {}",
                self.low_confidence_threshold
            )));
        }
        if self.preprocess.black_threshold > self.preprocess.white_threshold {
            return Err(ScanError::ConfigError(format!(
                "black_threshold ({}) must not exceed white_threshold ({})",
                self.preprocess.black_threshold, self.preprocess.white_threshold
            )));
        }
        if self.language.trim().is_empty() {
            return Err(ScanError::ConfigError("language must not be empty".to_string()));
        }
        Ok(())
    }

    /// Tessdata directory from the config, or from the environment.
    pub fn resolved_tessdata_prefix(&self) -> Option<String> {
        self.tessdata_prefix
            .clone()
            .or_else(|| std::env::var("TESSDATA_PREFIX").ok())
            .filter(|p| !p.is_empty())
    }
}
