use crate::processing::image::decode_data_url;
use crate::utils::ScanError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacePose {
    Front,
    Left,
    Right,
}

impl fmt::Display for FacePose {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FacePose::Front => "front",
            FacePose::Left => "left",
            FacePose::Right => "right",
        };
        f.write_str(name)
    }
}

/// Face images taken during the liveness check, as data URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceCaptures {
    pub front: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl FaceCaptures {
    pub fn get(&self, pose: FacePose) -> Option<&str> {
        match pose {
            FacePose::Front => self.front.as_deref(),
            FacePose::Left => self.left.as_deref(),
            FacePose::Right => self.right.as_deref(),
        }
    }

    fn set(&mut self, pose: FacePose, image: String) {
        match pose {
            FacePose::Front => self.front = Some(image),
            FacePose::Left => self.left = Some(image),
            FacePose::Right => self.right = Some(image),
        }
    }

    pub fn missing(&self) -> Vec<FacePose> {
        [FacePose::Front, FacePose::Left, FacePose::Right]
            .into_iter()
            .filter(|pose| self.get(*pose).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessStep {
    Idle,
    Ready,
    Left,
    Right,
    Done,
}

impl LivenessStep {
    /// Pose captured while in this step, if any.
    pub fn pose(&self) -> Option<FacePose> {
        match self {
            LivenessStep::Ready => Some(FacePose::Front),
            LivenessStep::Left => Some(FacePose::Left),
            LivenessStep::Right => Some(FacePose::Right),
            LivenessStep::Idle | LivenessStep::Done => None,
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            LivenessStep::Idle => "Start the camera to begin face verification.",
            LivenessStep::Ready => "Look straight at the camera.",
            LivenessStep::Left => "Slowly turn your head to the left.",
            LivenessStep::Right => "Slowly turn your head to the right.",
            LivenessStep::Done => "All face captures are complete.",
        }
    }

    fn next(&self) -> LivenessStep {
        match self {
            LivenessStep::Idle => LivenessStep::Ready,
            LivenessStep::Ready => LivenessStep::Left,
            LivenessStep::Left => LivenessStep::Right,
            LivenessStep::Right | LivenessStep::Done => LivenessStep::Done,
        }
    }
}

/// Guided front, left, right face capture.
///
/// `idle -> ready -> left -> right -> done`. Each capture stores the image
/// for the current pose and advances one step.
#[derive(Debug, Clone)]
pub struct LivenessCapture {
    step: LivenessStep,
    captures: FaceCaptures,
}

impl LivenessCapture {
    pub fn new() -> Self {
        LivenessCapture {
            step: LivenessStep::Idle,
            captures: FaceCaptures::default(),
        }
    }

    /// Continue from previously stored captures. Progress resumes at the
    /// first missing pose; a partial set is never started over.
    pub fn resume(captures: FaceCaptures) -> Self {
        let step = match captures.missing().first() {
            None => LivenessStep::Done,
            Some(FacePose::Front) if captures == FaceCaptures::default() => LivenessStep::Idle,
            Some(FacePose::Front) => LivenessStep::Ready,
            Some(FacePose::Left) => LivenessStep::Left,
            Some(FacePose::Right) => LivenessStep::Right,
        };
        LivenessCapture { step, captures }
    }

    pub fn step(&self) -> LivenessStep {
        self.step
    }

    pub fn captures(&self) -> &FaceCaptures {
        &self.captures
    }

    pub fn into_captures(self) -> FaceCaptures {
        self.captures
    }

    pub fn is_done(&self) -> bool {
        self.step == LivenessStep::Done
    }

    pub fn start(&mut self) -> Result<LivenessStep, ScanError> {
        if self.step != LivenessStep::Idle {
            return Err(ScanError::InvalidCaptureStep(format!(
                "cannot start from {:?}",
                self.step
            )));
        }
        self.step = self.step.next();
        Ok(self.step)
    }

    /// Store `image` (a data URL) for the current pose and advance.
    pub fn capture(&mut self, image: String) -> Result<LivenessStep, ScanError> {
        let pose = self.step.pose().ok_or_else(|| {
            ScanError::InvalidCaptureStep(format!("no capture expected in {:?}", self.step))
        })?;
        decode_data_url(&image)?;

        debug!("Captured {} face image", pose);
        self.captures.set(pose, image);
        self.step = self.step.next();
        Ok(self.step)
    }

    /// Drop every capture and go back to idle.
    pub fn reset(&mut self) {
        *self = LivenessCapture::new();
    }
}

impl Default for LivenessCapture {
    fn default() -> Self {
        LivenessCapture::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: &str = "data:image/jpeg;base64,/9j/4AAQ";

    #[test]
    fn test_full_sequence() {
        let mut liveness = LivenessCapture::new();
        assert_eq!(liveness.step(), LivenessStep::Idle);
        assert_eq!(liveness.start().unwrap(), LivenessStep::Ready);
        assert_eq!(liveness.capture(FRAME.to_string()).unwrap(), LivenessStep::Left);
        assert_eq!(liveness.capture(FRAME.to_string()).unwrap(), LivenessStep::Right);
        assert_eq!(liveness.capture(FRAME.to_string()).unwrap(), LivenessStep::Done);
        assert!(liveness.is_done());
        assert!(liveness.captures().is_complete());
    }

    #[test]
    fn test_capture_before_start_is_rejected() {
        let mut liveness = LivenessCapture::new();
        assert!(matches!(
            liveness.capture(FRAME.to_string()),
            Err(ScanError::InvalidCaptureStep(_))
        ));
    }

    #[test]
    fn test_capture_after_done_is_rejected() {
        let mut liveness = LivenessCapture::new();
        liveness.start().unwrap();
        for _ in 0..3 {
            liveness.capture(FRAME.to_string()).unwrap();
        }
        assert!(liveness.capture(FRAME.to_string()).is_err());
        assert!(liveness.start().is_err());
    }

    #[test]
    fn test_invalid_image_does_not_advance() {
        let mut liveness = LivenessCapture::new();
        liveness.start().unwrap();
        assert!(matches!(
            liveness.capture("not an image".to_string()),
            Err(ScanError::InvalidDataUrl(_))
        ));
        assert_eq!(liveness.step(), LivenessStep::Ready);
        assert_eq!(liveness.captures().front, None);
    }

    #[test]
    fn test_resume_from_partial_captures() {
        let partial = FaceCaptures {
            front: Some(FRAME.to_string()),
            left: None,
            right: None,
        };
        let liveness = LivenessCapture::resume(partial);
        assert_eq!(liveness.step(), LivenessStep::Left);
        assert_eq!(liveness.captures().missing(), vec![FacePose::Left, FacePose::Right]);

        assert_eq!(LivenessCapture::resume(FaceCaptures::default()).step(), LivenessStep::Idle);
    }

    #[test]
    fn test_reset_clears_captures() {
        let mut liveness = LivenessCapture::new();
        liveness.start().unwrap();
        liveness.capture(FRAME.to_string()).unwrap();
        liveness.reset();
        assert_eq!(liveness.step(), LivenessStep::Idle);
        assert_eq!(liveness.captures(), &FaceCaptures::default());
    }
}
