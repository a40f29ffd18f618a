use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::pipeline::pipeline_engine::{FrameOutcome, PipelineConfiguration, PipelineEngine, SessionState};
use crate::pipeline::recognition_logger::RecognitionLogger;
use crate::recognition::domain::face_detector::FaceDetector;
use crate::shared::face_info::{FaceType, MatchResult};
use crate::shared::frame::Frame;

/// Per-frame result delivered to the host layer. Exactly one event fires
/// for every frame that enters the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum RecognitionEvent {
    /// The full chain ran; carries the comparison verdict when one was
    /// configured.
    Success {
        face_type: FaceType,
        match_result: Option<MatchResult>,
    },
    /// A stage rejected the frame (no face, too small, not live, ...).
    Failure { reason: String },
    /// The detector or a stage hit an underlying error; the pipeline keeps
    /// accepting frames.
    Exception { message: String },
}

enum WorkerMsg {
    Frame(Frame),
    Shutdown,
}

/// Handle the external frame source pushes frames through.
///
/// Backed by a rendezvous channel: a push succeeds only while the worker is
/// ready to take a frame, so at most one frame is ever in flight. Frames
/// arriving while the pipeline is busy are dropped and counted; recognition
/// is a best-effort stream, not a guaranteed-delivery queue.
#[derive(Clone)]
pub struct FrameIntake {
    tx: Sender<WorkerMsg>,
    dropped: Arc<AtomicU64>,
    stopped: Arc<AtomicBool>,
}

impl FrameIntake {
    /// Offers a frame to the pipeline. Returns `false` when the frame was
    /// dropped (pipeline busy or stopped); never blocks the caller.
    pub fn push(&self, frame: Frame) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return false;
        }
        match self.tx.try_send(WorkerMsg::Frame(frame)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("frame dropped: pipeline busy");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Frames dropped by backpressure since the controller was created.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Owns the recognition worker: accepts frames from the external source,
/// runs detection and the stage chain, and emits one event per frame.
///
/// Built with explicit dependencies and an explicit lifecycle; no ambient
/// global state. `update_stages` may be called from any thread and never
/// blocks the worker beyond the engine's brief pointer swap.
pub struct RecognitionController {
    engine: Arc<PipelineEngine>,
    frame_tx: Sender<WorkerMsg>,
    event_rx: Receiver<RecognitionEvent>,
    detector: Option<Box<dyn FaceDetector>>,
    logger: Option<Box<dyn RecognitionLogger>>,
    worker: Option<JoinHandle<()>>,
    stopped: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    frame_rx: Option<Receiver<WorkerMsg>>,
    event_tx: Option<Sender<RecognitionEvent>>,
}

impl RecognitionController {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        engine: Arc<PipelineEngine>,
        logger: Box<dyn RecognitionLogger>,
    ) -> Self {
        // Rendezvous channel: the worker takes a frame only when idle,
        // which is exactly the single-frame-in-flight policy.
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<WorkerMsg>(0);
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<RecognitionEvent>();

        Self {
            engine,
            frame_tx,
            event_rx,
            detector: Some(detector),
            logger: Some(logger),
            worker: None,
            stopped: Arc::new(AtomicBool::new(false)),
            dropped: Arc::new(AtomicU64::new(0)),
            frame_rx: Some(frame_rx),
            event_tx: Some(event_tx),
        }
    }

    /// Spawns the worker and opens frame intake.
    pub fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (Some(mut detector), Some(mut logger), Some(frame_rx), Some(event_tx)) = (
            self.detector.take(),
            self.logger.take(),
            self.frame_rx.take(),
            self.event_tx.take(),
        ) else {
            return Err("controller already started".into());
        };

        let engine = self.engine.clone();
        let stopped = self.stopped.clone();

        let handle = std::thread::Builder::new()
            .name("recognition-worker".into())
            .spawn(move || {
                let mut session = SessionState::default();
                for msg in frame_rx.iter() {
                    let frame = match msg {
                        WorkerMsg::Shutdown => break,
                        WorkerMsg::Frame(frame) => frame,
                    };
                    if stopped.load(Ordering::Relaxed) {
                        break;
                    }

                    let event = match detector.detect(&frame) {
                        Err(e) => RecognitionEvent::Exception {
                            message: e.to_string(),
                        },
                        Ok(face) => {
                            match engine.process(&frame, face, &mut session, logger.as_mut()) {
                                FrameOutcome::Completed(face) => RecognitionEvent::Success {
                                    face_type: face.face_type(),
                                    match_result: face.match_result().copied(),
                                },
                                FrameOutcome::Rejected(reason) => RecognitionEvent::Failure {
                                    reason: reason.to_string(),
                                },
                                FrameOutcome::Failed(e) => RecognitionEvent::Exception {
                                    message: e.to_string(),
                                },
                            }
                        }
                    };

                    logger.frame_processed(frame.index());
                    if event_tx.send(event).is_err() {
                        break;
                    }
                    // `frame` goes out of scope here: nothing is retained
                    // past the processing turn.
                }
                logger.summary();
            })?;

        self.worker = Some(handle);
        Ok(())
    }

    /// Stops frame intake and joins the worker. Idempotent.
    pub fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        self.stopped.store(true, Ordering::Relaxed);
        let _ = self.frame_tx.send(WorkerMsg::Shutdown);
        let _ = handle.join();
    }

    pub fn intake(&self) -> FrameIntake {
        FrameIntake {
            tx: self.frame_tx.clone(),
            dropped: self.dropped.clone(),
            stopped: self.stopped.clone(),
        }
    }

    pub fn events(&self) -> Receiver<RecognitionEvent> {
        self.event_rx.clone()
    }

    /// Replaces the stage chain; in effect from the next frame.
    pub fn update_stages(&self, config: PipelineConfiguration) {
        self.engine.replace_configuration(config);
    }

    pub fn engine(&self) -> &Arc<PipelineEngine> {
        &self.engine
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for RecognitionController {
    fn drop(&mut self) {
        self.stop();
    }
}
