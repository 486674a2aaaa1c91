//! OCR engine contract and backends.
//!
//! The pipeline only sees [`Recognizer`]: encoded image bytes in, recognized
//! text plus a mean confidence out. The real backend wraps `ocr-rs`;
//! initialization failures are surfaced once and replaced by a fail-fast
//! recognizer so later calls never attempt recognition on a dead engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error};
use ocr_rs::OcrEngine;
use parking_lot::Mutex;

use crate::error::{EngineError, InitError};

/// Raw engine output before pipeline normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// Recognized text, possibly empty.
    pub text: String,
    /// Mean confidence over all recognized blocks, 0-100.
    pub confidence: f32,
}

/// External OCR engine contract.
pub trait Recognizer: Send + Sync {
    /// Recognize text in a losslessly encoded raster image (PNG).
    fn process(&self, encoded: &[u8]) -> Result<Recognition, EngineError>;
}

/// OCR language information.
#[derive(Debug, Clone)]
pub struct LanguageInfo {
    /// Language identifier (e.g. "english").
    pub id: &'static str,
    /// Recognition model filename.
    pub rec_model: &'static str,
    /// Charset filename.
    pub charset_file: &'static str,
}

/// Language config: recognition model + charset per language id. The
/// detection model is shared by all languages.
const LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo {
        id: "english",
        rec_model: "en_PP-OCRv5_mobile_rec_infer.mnn",
        charset_file: "ppocr_keys_en.txt",
    },
    LanguageInfo {
        id: "chinese",
        rec_model: "PP-OCRv5_mobile_rec.mnn",
        charset_file: "ppocr_keys_v5.txt",
    },
    LanguageInfo {
        id: "latin",
        rec_model: "latin_PP-OCRv5_mobile_rec_infer.mnn",
        charset_file: "ppocr_keys_latin.txt",
    },
];

/// Host-provided OCR engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory containing the model files.
    pub models_dir: PathBuf,
    /// Language identifier.
    pub language: String,
}

impl EngineConfig {
    pub fn new(models_dir: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            models_dir: models_dir.into(),
            language: language.into(),
        }
    }
}

/// Resolve the model file triple (detection, recognition, charset) for the
/// given config, validating that every file exists.
pub fn model_paths(config: &EngineConfig) -> Result<(PathBuf, PathBuf, PathBuf), InitError> {
    if !config.models_dir.is_dir() {
        return Err(InitError::MissingModelsDir(config.models_dir.clone()));
    }

    let lang = LANGUAGES
        .iter()
        .find(|l| l.id == config.language)
        .unwrap_or(&LANGUAGES[0]);

    let det_path = config.models_dir.join("PP-OCRv5_mobile_det.mnn");
    let rec_path = config.models_dir.join(lang.rec_model);
    let charset_path = config.models_dir.join(lang.charset_file);

    for path in [&det_path, &rec_path, &charset_path] {
        if !path.exists() {
            return Err(InitError::MissingLanguageData(path.clone()));
        }
    }

    Ok((det_path, rec_path, charset_path))
}

/// Check whether model files exist for the given config.
pub fn models_exist(config: &EngineConfig) -> bool {
    model_paths(config).is_ok()
}

/// `ocr-rs` backed recognizer.
///
/// The engine handle is behind a mutex so one instance can be shared by the
/// worker context without assuming the backend is re-entrant.
pub struct OcrRsRecognizer {
    engine: Mutex<OcrEngine>,
}

impl OcrRsRecognizer {
    /// Create an engine for the given config. Missing model files fail here,
    /// before any recognition is attempted.
    pub fn initialize(config: &EngineConfig) -> Result<Self, InitError> {
        let (det_path, rec_path, charset_path) = model_paths(config)?;
        debug!("initializing OCR engine for language '{}'", config.language);

        let engine = OcrEngine::new(&det_path, &rec_path, &charset_path, None)
            .map_err(|e| InitError::Backend(e.to_string()))?;

        Ok(Self {
            engine: Mutex::new(engine),
        })
    }
}

impl Recognizer for OcrRsRecognizer {
    fn process(&self, encoded: &[u8]) -> Result<Recognition, EngineError> {
        let img =
            image::load_from_memory(encoded).map_err(|e| EngineError::Decode(e.to_string()))?;

        let raw = self
            .engine
            .lock()
            .recognize(&img)
            .map_err(|e| EngineError::Recognition(e.to_string()))?;

        let blocks: Vec<Block> = raw
            .into_iter()
            .filter(|r| !r.text.trim().is_empty())
            .map(|r| Block {
                text: r.text,
                confidence: r.confidence,
                x: r.bbox.rect.left(),
                y: r.bbox.rect.top(),
            })
            .collect();

        Ok(assemble_recognition(blocks))
    }
}

/// One recognized text block with its top-left position.
struct Block {
    text: String,
    confidence: f32,
    x: i32,
    y: i32,
}

/// Reading-order threshold: blocks whose tops differ by at most this many
/// pixels belong to the same line.
const LINE_HEIGHT_THRESHOLD: i32 = 20;

/// Group blocks into lines by y-proximity, join each line left to right,
/// and average the block confidences into a 0-100 mean.
fn assemble_recognition(mut blocks: Vec<Block>) -> Recognition {
    if blocks.is_empty() {
        return Recognition {
            text: String::new(),
            confidence: 0.0,
        };
    }

    let mean = blocks.iter().map(|b| b.confidence).sum::<f32>() / blocks.len() as f32;
    // Backend confidences are 0-1.
    let confidence = (mean * 100.0).clamp(0.0, 100.0);

    blocks.sort_by_key(|b| b.y);

    let mut lines: Vec<Vec<Block>> = Vec::new();
    for block in blocks {
        match lines
            .iter_mut()
            .find(|line| (block.y - line[0].y).abs() <= LINE_HEIGHT_THRESHOLD)
        {
            Some(line) => line.push(block),
            None => lines.push(vec![block]),
        }
    }

    let text = lines
        .into_iter()
        .map(|mut line| {
            line.sort_by_key(|b| b.x);
            line.iter()
                .map(|b| b.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    Recognition { text, confidence }
}

/// Stand-in recognizer installed when engine initialization failed.
///
/// Every call fails fast with the original init failure instead of
/// attempting recognition.
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Recognizer for UnavailableRecognizer {
    fn process(&self, _encoded: &[u8]) -> Result<Recognition, EngineError> {
        Err(EngineError::NotInitialized(self.reason.clone()))
    }
}

/// Initialize the OCR engine, logging a failed init once and degrading to a
/// fail-fast recognizer. The host keeps running either way.
pub fn initialize_recognizer(config: &EngineConfig) -> Arc<dyn Recognizer> {
    match OcrRsRecognizer::initialize(config) {
        Ok(recognizer) => Arc::new(recognizer),
        Err(e) => {
            error!("OCR engine unavailable: {e}");
            Arc::new(UnavailableRecognizer::new(e.to_string()))
        }
    }
}

/// Default models directory: `models/` next to the executable.
pub fn default_models_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("models")
}
