pub mod config;
pub mod error;

pub use config::{PreprocessConfig, ScannerConfig};
pub use error::ScanError;
