/// MobileFaceNet embedding extraction using ONNX Runtime.
///
/// Produces L2-normalized 192-element vectors, so downstream distances are
/// distances between unit vectors.
use std::path::Path;
use std::sync::Mutex;

use crate::recognition::domain::embedding_extractor::EmbeddingExtractor;
use crate::shared::constants::{
    EMBEDDING_INPUT_SIZE, EMBEDDING_LEN, EMBEDDING_NORM_MEAN, EMBEDDING_NORM_STD,
};
use crate::shared::embedding::{l2_normalize, Embedding};
use crate::shared::frame::FaceCrop;

pub struct OnnxEmbeddingExtractor {
    session: Mutex<ort::session::Session>,
}

impl OnnxEmbeddingExtractor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .with_execution_providers([
                ort::execution_providers::CoreMLExecutionProvider::default().build(),
            ])?
            .commit_from_file(model_path)?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl EmbeddingExtractor for OnnxEmbeddingExtractor {
    fn extract(
        &self,
        crop: &FaceCrop,
    ) -> Result<Embedding, Box<dyn std::error::Error + Send + Sync>> {
        if crop.is_empty() {
            return Err("cannot embed an empty face crop".into());
        }

        let tensor = preprocess(crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        if embedding_slice.len() != EMBEDDING_LEN {
            return Err(format!(
                "model produced {} values, expected {EMBEDDING_LEN}",
                embedding_slice.len()
            )
            .into());
        }

        let mut values = embedding_slice.to_vec();
        l2_normalize(&mut values);
        Ok(Embedding::new(values)?)
    }
}

/// Resize crop to the model input square, normalize, NCHW layout.
fn preprocess(crop: &FaceCrop) -> ndarray::Array4<f32> {
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;
    let data = crop.data();
    let size = EMBEDDING_INPUT_SIZE;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));

    for y in 0..size {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / size as f64) as usize).min(src_h - 1);
        for x in 0..size {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / size as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] =
                        (data[offset + c] as f32 - EMBEDDING_NORM_MEAN) / EMBEDDING_NORM_STD;
                }
            }
        }
    }

    tensor
}
