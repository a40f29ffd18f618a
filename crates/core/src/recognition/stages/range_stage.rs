use crate::recognition::domain::stage::{RejectReason, Stage, StageContext, StageOutcome};
use crate::shared::constants::{DEFAULT_MAX_FACE_RATIO, DEFAULT_MIN_FACE_RATIO};
use crate::shared::face_info::FaceInfo;
use crate::shared::frame::Frame;

/// Rejects faces whose size relative to the frame is outside an acceptable
/// band: too small means too far away or blurry, too large means clipped.
pub struct RangeStage {
    min_ratio: f64,
    max_ratio: f64,
}

impl RangeStage {
    pub fn new(min_ratio: f64, max_ratio: f64) -> Self {
        Self {
            min_ratio,
            max_ratio,
        }
    }
}

impl Default for RangeStage {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_FACE_RATIO, DEFAULT_MAX_FACE_RATIO)
    }
}

impl Stage for RangeStage {
    fn name(&self) -> &'static str {
        "range"
    }

    fn process(&self, frame: &Frame, face: FaceInfo, _ctx: &mut StageContext<'_>) -> StageOutcome {
        let ratio = face.rect().area_ratio(frame.width(), frame.height());
        if ratio < self.min_ratio || ratio > self.max_ratio {
            log::debug!(
                "face covers {:.1}% of frame, outside [{:.1}%, {:.1}%]",
                ratio * 100.0,
                self.min_ratio * 100.0,
                self.max_ratio * 100.0
            );
            return StageOutcome::Reject(RejectReason::SizeOutOfRange);
        }
        StageOutcome::Continue(face)
    }
}
