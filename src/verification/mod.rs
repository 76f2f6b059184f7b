pub mod capture_store;
pub mod liveness;

pub use capture_store::CaptureStore;
pub use liveness::{FaceCaptures, FacePose, LivenessCapture, LivenessStep};
