use crate::recognition::domain::face_detector::FaceDetector;
use crate::shared::face_info::{FaceInfo, FaceRect};
use crate::shared::frame::Frame;

/// Detector for file-driven runs where each frame is already a face crop:
/// the whole frame is reported as a single frontal, upright face.
///
/// Real camera detection is an external collaborator; this keeps the rest of
/// the pipeline exercisable against image sequences on disk. Every frame
/// shares one tracking identity, matching a sequence cropped from a single
/// subject.
pub struct FullFrameFaceDetector {
    track_id: u32,
}

impl FullFrameFaceDetector {
    pub fn new() -> Self {
        Self { track_id: 1 }
    }
}

impl Default for FullFrameFaceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceDetector for FullFrameFaceDetector {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<FaceInfo>, Box<dyn std::error::Error + Send + Sync>> {
        if frame.area() == 0 {
            return Ok(None);
        }
        let rect = FaceRect::new(0, 0, frame.width() as i32, frame.height() as i32);
        Ok(Some(
            FaceInfo::new(rect, 0.0, 0.0, 0.0).with_track_id(self.track_id),
        ))
    }
}
