pub mod full_frame_detector;
pub mod model_resolver;
pub mod onnx_embedding_extractor;
pub mod png_frame_sink;
