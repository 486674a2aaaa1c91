//! Region screen capture with asynchronous OCR text extraction.
//!
//! The crate is split along the same seams the host drives:
//! - `selection` - interactive region-selection state machine (pure reducer)
//! - `capture` - screen grabbing behind a platform trait
//! - `source` - ownership of the single current image buffer
//! - `engine` - OCR engine contract and backends
//! - `pipeline` - off-thread extraction with single-result handoff
//! - `settings` - persisted configuration
//! - `error` - unified error taxonomy

pub mod capture;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod selection;
pub mod settings;
pub mod source;
pub mod types;

pub use capture::{ScreenGrabber, capture_region};
pub use engine::{EngineConfig, Recognition, Recognizer, initialize_recognizer};
pub use error::{
    AppError, AppResult, CaptureError, EngineError, InitError, LoadError, PipelineError,
};
pub use pipeline::{ExtractionJob, ExtractionPipeline};
pub use selection::{Action, CancelCause, Effect, Model, Phase};
pub use settings::Settings;
pub use source::ImageSource;
pub use types::{MIN_SELECTION_SIZE, NO_TEXT_PLACEHOLDER, OcrResult, PixelBuffer, RectI32};
