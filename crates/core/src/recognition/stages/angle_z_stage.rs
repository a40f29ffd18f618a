use crate::recognition::domain::stage::{RejectReason, Stage, StageContext, StageOutcome};
use crate::shared::constants::DEFAULT_MAX_ROLL_DEGREES;
use crate::shared::face_info::FaceInfo;
use crate::shared::frame::Frame;

/// Rejects faces rolled too far off upright (head tilted toward a shoulder).
pub struct AngleZStage {
    max_roll_degrees: f32,
}

impl AngleZStage {
    pub fn new(max_roll_degrees: f32) -> Self {
        Self { max_roll_degrees }
    }
}

impl Default for AngleZStage {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROLL_DEGREES)
    }
}

impl Stage for AngleZStage {
    fn name(&self) -> &'static str {
        "angle_z"
    }

    fn process(&self, _frame: &Frame, face: FaceInfo, _ctx: &mut StageContext<'_>) -> StageOutcome {
        if face.roll().abs() > self.max_roll_degrees {
            return StageOutcome::Reject(RejectReason::AngleOutOfRange);
        }
        StageOutcome::Continue(face)
    }
}
