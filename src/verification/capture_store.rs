use crate::utils::{ScanError, ScannerConfig};
use crate::verification::FaceCaptures;
use log::{debug, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Fixed key the in-progress captures are kept under.
pub const CAPTURE_KEY: &str = "identity_verification_captures";

/// Keeps face captures on disk so an interrupted verification can resume.
pub struct CaptureStore {
    path: PathBuf,
}

impl CaptureStore {
    pub fn new(dir: &Path) -> Self {
        CaptureStore {
            path: dir.join(format!("{}.json", CAPTURE_KEY)),
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        CaptureStore::new(&config.capture_dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored captures, or `None` when nothing usable is stored.
    /// A corrupt file is treated as empty.
    pub fn load(&self) -> Result<Option<FaceCaptures>, ScanError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&raw) {
            Ok(captures) => Ok(Some(captures)),
            Err(e) => {
                warn!("Ignoring unreadable captures at {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    /// Replace the stored captures. The write is atomic.
    pub fn save(&self, captures: &FaceCaptures) -> Result<(), ScanError> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| ScanError::ConfigError("capture path has no directory".to_string()))?;
        std::fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(serde_json::to_string(captures)?.as_bytes())?;
        file.persist(&self.path).map_err(|e| ScanError::IoError(e.error))?;
        debug!("Saved face captures to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ScanError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            debug!("Cleared face captures at {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captures() -> FaceCaptures {
        FaceCaptures {
            front: Some("data:image/jpeg;base64,AAAA".to_string()),
            left: Some("data:image/jpeg;base64,BBBB".to_string()),
            right: None,
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaptureStore::new(dir.path());
        assert_eq!(store.load().unwrap(), None);

        store.save(&captures()).unwrap();
        assert_eq!(store.load().unwrap(), Some(captures()));
        assert!(store.path().ends_with("identity_verification_captures.json"));
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaptureStore::new(&dir.path().join("nested").join("captures"));
        store.save(&FaceCaptures::default()).unwrap();
        assert_eq!(store.load().unwrap(), Some(FaceCaptures::default()));
    }

    #[test]
    fn test_clear_removes_captures() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaptureStore::new(dir.path());
        store.save(&captures()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaptureStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
