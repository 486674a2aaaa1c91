//! Asynchronous OCR extraction pipeline.
//!
//! One pipeline serves one image source. `extract` validates synchronously,
//! then runs encode + recognition on a dedicated worker so the interactive
//! thread never blocks; exactly one outcome per invocation is published
//! through a oneshot channel. Dropping the [`ExtractionJob`] discards the
//! outcome (the worker's send becomes a no-op and no shared state is
//! touched afterwards).

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;

use crate::engine::Recognizer;
use crate::error::PipelineError;
use crate::types::{NO_TEXT_PLACEHOLDER, OcrResult, PixelBuffer};

/// Extraction lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    /// No extraction in progress.
    #[default]
    Idle,
    /// An extraction has been dispatched and is expected to complete
    /// asynchronously.
    Running,
}

/// Extraction phase model, shared between caller and worker.
#[derive(Debug, Default)]
struct Model {
    phase: Phase,
}

impl Model {
    fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    fn start(&mut self) {
        self.phase = Phase::Running;
    }

    fn finish(&mut self) {
        self.phase = Phase::Idle;
    }
}

/// Handle to one in-flight extraction. Dropping it abandons the result.
pub struct ExtractionJob {
    rx: oneshot::Receiver<Result<OcrResult, PipelineError>>,
}

impl ExtractionJob {
    /// Block until the outcome arrives. Intended for worker-side callers and
    /// tests; the interactive thread polls [`try_result`](Self::try_result)
    /// instead.
    pub fn wait(self) -> Result<OcrResult, PipelineError> {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(PipelineError::Worker("worker dropped result".to_string())))
    }

    /// Non-blocking poll. Returns `None` while the extraction is still
    /// running; afterwards yields the outcome exactly once.
    pub fn try_result(&mut self) -> Option<Result<OcrResult, PipelineError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(PipelineError::Worker(
                "worker dropped result".to_string(),
            ))),
        }
    }
}

/// Runs OCR against a frozen image snapshot without blocking the caller.
pub struct ExtractionPipeline {
    recognizer: Arc<dyn Recognizer>,
    model: Arc<Mutex<Model>>,
    runtime: Runtime,
}

impl ExtractionPipeline {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Result<Self, PipelineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("ocr-worker")
            .build()
            .map_err(|e| PipelineError::Worker(e.to_string()))?;

        Ok(Self {
            recognizer,
            model: Arc::new(Mutex::new(Model::default())),
            runtime,
        })
    }

    /// True while an extraction is in flight.
    pub fn is_busy(&self) -> bool {
        self.model.lock().is_running()
    }

    /// Start one extraction for `image`.
    ///
    /// Fails synchronously, before dispatch, when the image is empty or when
    /// a previous extraction on this pipeline has not completed yet
    /// (at-most-one concurrent run per image source; a second call is
    /// rejected rather than queued).
    pub fn extract(&self, image: Arc<PixelBuffer>) -> Result<ExtractionJob, PipelineError> {
        if image.is_empty() {
            return Err(PipelineError::EmptyImage);
        }

        {
            let mut model = self.model.lock();
            if model.is_running() {
                return Err(PipelineError::Busy);
            }
            model.start();
        }

        let (tx, rx) = oneshot::channel();
        let recognizer = Arc::clone(&self.recognizer);
        let model = Arc::clone(&self.model);

        self.runtime.spawn_blocking(move || {
            let outcome = run_extraction(recognizer.as_ref(), &image);
            if let Err(e) = &outcome {
                warn!("extraction failed: {e}");
            }
            // Unblock the next run before publishing, so a caller reacting
            // to the result can immediately start another extraction.
            model.lock().finish();
            // Send fails when the job was discarded (session teardown);
            // nothing else to do in that case.
            let _ = tx.send(outcome);
        });

        Ok(ExtractionJob { rx })
    }
}

/// Worker-side body: serialize, recognize, normalize.
fn run_extraction(
    recognizer: &dyn Recognizer,
    image: &PixelBuffer,
) -> Result<OcrResult, PipelineError> {
    // Lossless raster encoding, a pure transform of the frozen snapshot.
    let encoded = image
        .encode_png()
        .map_err(|e| PipelineError::Encode(e.to_string()))?;

    let recognition = recognizer.process(&encoded)?;
    debug!(
        "recognized {} chars at {:.2}% confidence",
        recognition.text.len(),
        recognition.confidence
    );

    let confidence = recognition.confidence.clamp(0.0, 100.0);
    let trimmed = recognition.text.trim();
    let text = if trimmed.is_empty() {
        NO_TEXT_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    };

    Ok(OcrResult { confidence, text })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;

    use crate::engine::Recognition;
    use crate::error::EngineError;

    struct StaticRecognizer {
        text: &'static str,
        confidence: f32,
    }

    impl Recognizer for StaticRecognizer {
        fn process(&self, _encoded: &[u8]) -> Result<Recognition, EngineError> {
            Ok(Recognition {
                text: self.text.to_string(),
                confidence: self.confidence,
            })
        }
    }

    /// Blocks inside `process` until the test releases it.
    struct GatedRecognizer {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl Recognizer for GatedRecognizer {
        fn process(&self, _encoded: &[u8]) -> Result<Recognition, EngineError> {
            let _ = self.gate.lock().recv();
            Ok(Recognition {
                text: "slow".to_string(),
                confidence: 0.5,
            })
        }
    }

    fn blank_image() -> Arc<PixelBuffer> {
        // All-white 32x32.
        Arc::new(PixelBuffer::from_rgba8(32, 32, vec![0xFF; 32 * 32 * 4]).unwrap())
    }

    fn pipeline(text: &'static str, confidence: f32) -> ExtractionPipeline {
        ExtractionPipeline::new(Arc::new(StaticRecognizer { text, confidence })).unwrap()
    }

    #[test]
    fn empty_image_is_rejected_before_dispatch() {
        let p = pipeline("x", 1.0);
        let empty = Arc::new(PixelBuffer::from_rgba8(0, 0, Vec::new()).unwrap());
        assert!(matches!(p.extract(empty), Err(PipelineError::EmptyImage)));
        assert!(!p.is_busy());
    }

    #[test]
    fn blank_image_yields_canonical_no_text_result() {
        let p = pipeline("   \n  ", 0.73 * 100.0);
        let result = p.extract(blank_image()).unwrap().wait().unwrap();
        assert_eq!(result.text, NO_TEXT_PLACEHOLDER);
        assert!(result.confidence >= 0.0);
    }

    #[test]
    fn recognized_text_is_trimmed_and_confidence_clamped() {
        let p = pipeline("  hello\n", 250.0);
        let result = p.extract(blank_image()).unwrap().wait().unwrap();
        assert_eq!(result.text, "hello");
        assert_eq!(result.confidence, 100.0);
    }

    #[test]
    fn engine_failure_maps_to_typed_error() {
        struct FailingRecognizer;
        impl Recognizer for FailingRecognizer {
            fn process(&self, _encoded: &[u8]) -> Result<Recognition, EngineError> {
                Err(EngineError::Recognition("bad license data".to_string()))
            }
        }

        let p = ExtractionPipeline::new(Arc::new(FailingRecognizer)).unwrap();
        let err = p.extract(blank_image()).unwrap().wait().unwrap_err();
        assert!(matches!(err, PipelineError::Engine(_)));
        assert!(!p.is_busy());
    }

    #[test]
    fn second_extract_while_running_is_rejected() {
        let (release, gate) = mpsc::channel();
        let p = ExtractionPipeline::new(Arc::new(GatedRecognizer {
            gate: Mutex::new(gate),
        }))
        .unwrap();

        let job = p.extract(blank_image()).unwrap();
        assert!(matches!(p.extract(blank_image()), Err(PipelineError::Busy)));

        release.send(()).unwrap();
        let first = job.wait().unwrap();
        assert_eq!(first.text, "slow");

        // The first completion is observed before a new run can start.
        release.send(()).unwrap();
        let second = p.extract(blank_image()).unwrap().wait().unwrap();
        assert_eq!(second.text, "slow");
    }

    #[test]
    fn discarded_job_is_a_safe_no_op() {
        let (release, gate) = mpsc::channel();
        let p = ExtractionPipeline::new(Arc::new(GatedRecognizer {
            gate: Mutex::new(gate),
        }))
        .unwrap();

        let job = p.extract(blank_image()).unwrap();
        drop(job);
        release.send(()).unwrap();

        // The worker finishes, drops the result, and the pipeline returns
        // to idle so the next run can start.
        while p.is_busy() {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        release.send(()).unwrap();
        assert!(p.extract(blank_image()).unwrap().wait().is_ok());
    }

    #[test]
    fn try_result_polls_without_blocking() {
        let (release, gate) = mpsc::channel();
        let p = ExtractionPipeline::new(Arc::new(GatedRecognizer {
            gate: Mutex::new(gate),
        }))
        .unwrap();

        let mut job = p.extract(blank_image()).unwrap();
        assert!(job.try_result().is_none());

        release.send(()).unwrap();
        let outcome = loop {
            if let Some(outcome) = job.try_result() {
                break outcome;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        };
        assert_eq!(outcome.unwrap().text, "slow");
    }
}
