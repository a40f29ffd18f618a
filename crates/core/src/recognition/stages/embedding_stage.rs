use crate::recognition::domain::embedding_extractor::EmbeddingExtractor;
use crate::recognition::domain::stage::{Stage, StageContext, StageOutcome};
use crate::shared::face_info::FaceInfo;
use crate::shared::frame::Frame;

/// Crops the face region and runs the external inference engine, attaching
/// the resulting embedding to the face.
///
/// An extractor error fails this frame (surfaced to the caller as an
/// exception event) without stopping the frame loop.
pub struct EmbeddingStage {
    extractor: Box<dyn EmbeddingExtractor>,
}

impl EmbeddingStage {
    pub fn new(extractor: Box<dyn EmbeddingExtractor>) -> Self {
        Self { extractor }
    }
}

impl Stage for EmbeddingStage {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn process(&self, frame: &Frame, face: FaceInfo, _ctx: &mut StageContext<'_>) -> StageOutcome {
        let crop = frame.crop(face.rect());
        if crop.is_empty() {
            return StageOutcome::Fail("face region is empty after clamping to frame".into());
        }
        match self.extractor.extract(&crop) {
            Ok(embedding) => StageOutcome::Continue(face.with_embedding(embedding)),
            Err(e) => {
                log::error!("embedding extraction failed: {e}");
                StageOutcome::Fail(e)
            }
        }
    }
}
