// Unified error handling module
//
// Centralized error types so capture/IO/engine failures are converted to a
// typed outcome at their origin and never reach the interactive thread as
// uncaught faults.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Engine initialization error: {0}")]
    Init(#[from] InitError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Screen-capture errors. All variants are recoverable: the user retries the
/// selection without losing session state.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Selection area is below the minimum capture size")]
    InvalidSelection,

    #[error("Selection lies entirely outside the virtual screen")]
    OutOfBounds,

    #[error("Screen access denied: {0}")]
    AccessDenied(String),

    #[error("Screen capture failed: {0}")]
    Platform(String),
}

/// Image-file loading errors. The previously held image stays untouched.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read image file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt image data: {0}")]
    Corrupt(String),
}

/// OCR engine initialization errors. Fatal to OCR capability only, surfaced
/// once at startup; the host keeps running.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Model directory not found: {0}")]
    MissingModelsDir(PathBuf),

    #[error("Language data file not found: {0}")]
    MissingLanguageData(PathBuf),

    #[error("Engine creation failed: {0}")]
    Backend(String),
}

/// OCR engine runtime errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("OCR engine not initialized: {0}")]
    NotInitialized(String),

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("OCR recognition failed: {0}")]
    Recognition(String),
}

/// Extraction pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image is empty")]
    EmptyImage,

    #[error("An extraction is already in flight for this image source")]
    Busy,

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("OCR engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Worker error: {0}")]
    Worker(String),
}

/// Result type alias for convenience.
pub type AppResult<T> = Result<T, AppError>;
