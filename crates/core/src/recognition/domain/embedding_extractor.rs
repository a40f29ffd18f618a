use crate::shared::embedding::Embedding;
use crate::shared::frame::FaceCrop;

/// Boundary port for the external inference engine.
///
/// Turns a cropped face region into a fixed-length feature vector. Failures
/// (missing model asset, malformed input, runtime error) surface as pipeline
/// failures, never as a process crash.
pub trait EmbeddingExtractor: Send + Sync {
    fn extract(
        &self,
        crop: &FaceCrop,
    ) -> Result<Embedding, Box<dyn std::error::Error + Send + Sync>>;
}
