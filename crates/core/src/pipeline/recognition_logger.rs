use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for recognition session events.
///
/// Decouples the engine and controller from specific output mechanisms
/// (stdout, GUI signals, log crate) so each caller can observe pipeline
/// behavior without changing the orchestration code.
pub trait RecognitionLogger: Send {
    /// A frame finished processing, whatever its outcome.
    fn frame_processed(&mut self, frame_index: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. dropped frames, cache size).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used where logger output is
/// irrelevant, e.g. in tests or hosts with their own progress reporting.
pub struct NullRecognitionLogger;

impl RecognitionLogger for NullRecognitionLogger {
    fn frame_processed(&mut self, _frame_index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that tracks per-stage timing and metrics and prints
/// a summary report when the session ends.
///
/// Progress output is throttled to every `throttle_frames` frames to avoid
/// excessive I/O on long-running streams.
pub struct StdoutRecognitionLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames_processed: usize,
    messages: Vec<String>,
}

impl StdoutRecognitionLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames_processed: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames_processed == 0 && self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_processed;
        let mut lines = Vec::new();

        lines.push(format!(
            "Session summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutRecognitionLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl RecognitionLogger for StdoutRecognitionLogger {
    fn frame_processed(&mut self, frame_index: usize) {
        self.frames_processed += 1;
        if self.frames_processed % self.throttle_frames == 0 {
            log::info!(
                "Processed {} frames (latest index {frame_index})",
                self.frames_processed
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullRecognitionLogger;
        logger.frame_processed(1);
        logger.timing("compare", 5.0);
        logger.metric("cache_size", 3.0);
        logger.info("hello");
        logger.summary();
        // No panics = success
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutRecognitionLogger::new(10);
        logger.timing("embedding", 20.0);
        logger.timing("embedding", 30.0);
        logger.timing("compare", 5.0);

        let embedding = logger.timings_for("embedding").unwrap();
        assert_eq!(embedding.len(), 2);
        assert!((embedding[0] - 20.0).abs() < f64::EPSILON);
        assert!((embedding[1] - 30.0).abs() < f64::EPSILON);

        let compare = logger.timings_for("compare").unwrap();
        assert_eq!(compare.len(), 1);
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = StdoutRecognitionLogger::new(10);
        logger.metric("dropped_frames", 3.0);
        logger.metric("dropped_frames", 4.0);

        let values = logger.metrics_for("dropped_frames").unwrap();
        assert_eq!(values.len(), 2);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        assert!((avg - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_includes_timing_and_metrics() {
        let mut logger = StdoutRecognitionLogger::new(10);
        logger.frame_processed(0);
        logger.timing("embedding", 20.0);
        logger.metric("cache_size", 2.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Session summary"));
        assert!(summary.contains("embedding"));
        assert!(summary.contains("cache_size"));
    }

    #[test]
    fn test_summary_includes_fps() {
        let mut logger = StdoutRecognitionLogger::new(10);
        for i in 0..100 {
            logger.frame_processed(i);
        }
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutRecognitionLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_frame_count_accumulates() {
        let mut logger = StdoutRecognitionLogger::new(10);
        for i in 0..20 {
            logger.frame_processed(i);
        }
        assert_eq!(logger.frames_processed, 20);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutRecognitionLogger::new(10);
        logger.info("hello world");
        assert_eq!(logger.messages.len(), 1);
        assert_eq!(logger.messages[0], "hello world");
    }

    #[test]
    fn test_default_throttle() {
        let logger = StdoutRecognitionLogger::default();
        assert_eq!(logger.throttle_frames, 30);
    }
}
