use crate::recognition::domain::stage::{Stage, StageContext, StageOutcome};
use crate::shared::face_info::{FaceInfo, FaceRect};
use crate::shared::frame::Frame;

pub type RectObserver = Box<dyn Fn(&FaceRect) + Send + Sync>;

/// Side-effect-only stage that reports the detection rectangle to a
/// caller-supplied observer (e.g. a preview overlay). Never rejects.
pub struct RectStage {
    observer: RectObserver,
}

impl RectStage {
    pub fn new(observer: RectObserver) -> Self {
        Self { observer }
    }
}

impl Stage for RectStage {
    fn name(&self) -> &'static str {
        "rect"
    }

    fn process(&self, _frame: &Frame, face: FaceInfo, _ctx: &mut StageContext<'_>) -> StageOutcome {
        (self.observer)(face.rect());
        StageOutcome::Continue(face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::liveness_tracker::LivenessTracker;
    use crate::recognition::domain::recent_face_cache::RecentFaceCache;
    use std::sync::{Arc, Mutex};

    fn frame() -> Frame {
        Frame::new(vec![0; 100 * 100 * 3], 100, 100, 3, 0)
    }

    #[test]
    fn test_observer_sees_rect_and_face_continues() {
        let seen: Arc<Mutex<Vec<FaceRect>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let stage = RectStage::new(Box::new(move |rect| {
            sink.lock().unwrap().push(*rect);
        }));

        let cache = Mutex::new(RecentFaceCache::new(4));
        let mut liveness = LivenessTracker::new(10, 5);
        let mut ctx = StageContext::new(0.5, &cache, &mut liveness);

        let rect = FaceRect::new(10, 20, 30, 40);
        let face = FaceInfo::new(rect, 0.0, 0.0, 0.0);
        let outcome = stage.process(&frame(), face, &mut ctx);

        assert!(matches!(outcome, StageOutcome::Continue(_)));
        assert_eq!(seen.lock().unwrap().as_slice(), &[rect]);
    }
}
