//! Settings persistence.
//!
//! JSON settings under a dot-directory in the user profile, loaded once
//! with fallback to defaults. Host-environment concerns (model directory,
//! language, output directory) live here so the core stays free of them.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::{EngineConfig, default_models_dir};

fn default_language() -> String {
    "english".to_string()
}

fn default_models_dir_string() -> String {
    default_models_dir().to_string_lossy().into_owned()
}

fn default_output_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

fn default_auto_copy() -> bool {
    false
}

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory containing the OCR model files.
    #[serde(default = "default_models_dir_string")]
    pub models_dir: String,

    /// OCR language identifier.
    #[serde(default = "default_language")]
    pub ocr_language: String,

    /// Copy extracted text to the clipboard automatically.
    #[serde(default = "default_auto_copy")]
    pub auto_copy: bool,

    /// Directory where extracted text files are saved.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir_string(),
            ocr_language: default_language(),
            auto_copy: default_auto_copy(),
            output_dir: default_output_dir(),
        }
    }
}

impl Settings {
    fn settings_dir() -> PathBuf {
        PathBuf::from(default_output_dir()).join(".textshot")
    }

    fn settings_path() -> PathBuf {
        Self::settings_dir().join("settings.json")
    }

    /// Load settings from disk.
    ///
    /// Falls back to defaults (and persists them) if loading fails.
    pub fn load() -> Self {
        let path = Self::settings_path();

        if let Ok(content) = fs::read_to_string(&path)
            && let Ok(settings) = serde_json::from_str::<Settings>(&content)
        {
            return settings;
        }

        let default_settings = Self::default();
        let _ = default_settings.save();
        default_settings
    }

    /// Save settings to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::settings_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Engine configuration derived from these settings.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(&self.models_dir, self.ocr_language.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.ocr_language, "english");
        assert!(!settings.auto_copy);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let mut settings = Settings::default();
        settings.ocr_language = "chinese".to_string();
        settings.auto_copy = true;

        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ocr_language, "chinese");
        assert!(back.auto_copy);
    }

    #[test]
    fn engine_config_uses_configured_language() {
        let mut settings = Settings::default();
        settings.ocr_language = "latin".to_string();
        let config = settings.engine_config();
        assert_eq!(config.language, "latin");
        assert_eq!(config.models_dir, PathBuf::from(&settings.models_dir));
    }
}
