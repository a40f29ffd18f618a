use std::path::PathBuf;

use crate::recognition::domain::frame_sink::FrameSink;
use crate::recognition::domain::stage::{Stage, StageContext, StageOutcome};
use crate::shared::face_info::FaceInfo;
use crate::shared::frame::Frame;

/// Exports the current frame to an external sink.
///
/// Fire-and-forget: a write failure is logged and the chain continues, so a
/// full disk cannot stall recognition.
pub struct PersistStage {
    sink: Box<dyn FrameSink>,
    path: PathBuf,
}

impl PersistStage {
    pub fn new(sink: Box<dyn FrameSink>, path: PathBuf) -> Self {
        Self { sink, path }
    }
}

impl Stage for PersistStage {
    fn name(&self) -> &'static str {
        "persist"
    }

    fn process(&self, frame: &Frame, face: FaceInfo, _ctx: &mut StageContext<'_>) -> StageOutcome {
        if let Err(e) = self.sink.write(frame, &self.path) {
            log::warn!("frame export to {} failed: {e}", self.path.display());
        }
        StageOutcome::Continue(face)
    }
}
