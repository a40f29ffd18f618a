pub mod pipeline_engine;
pub mod recognition_controller;
pub mod recognition_logger;
