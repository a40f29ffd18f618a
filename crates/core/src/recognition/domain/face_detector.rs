use crate::shared::face_info::FaceInfo;
use crate::shared::frame::Frame;

/// Boundary port for the external face detector.
///
/// Returns the most prominent face in the frame, or `None` when no face is
/// present. Implementations may be stateful (e.g., tracking across frames),
/// hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<FaceInfo>, Box<dyn std::error::Error + Send + Sync>>;
}
