use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Image processing error: {0}")]
    ImageProcessingError(String),
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("OCR error: {0}")]
    OcrError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Scan rejected: {0}")]
    ScanRejected(String),
    #[error("Identity mismatch: {0}")]
    IdentityMismatch(String),
    #[error("Face capture incomplete: {0}")]
    CaptureIncomplete(String),
    #[error("Invalid capture step: {0}")]
    InvalidCaptureStep(String),
    #[error("Rate limited: {message}")]
    RateLimited { remaining_seconds: u64, message: String },
    #[error("Submission failed with status {status}: {message}")]
    SubmissionFailed { status: u16, message: String },
}
