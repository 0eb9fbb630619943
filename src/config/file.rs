//! TOML configuration file loading
//!
//! Supports `~/.config/pantry/config.toml` as a persistent config source.
//! Every field is optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct PantryConfigFile {
    /// Where the list and dataset live
    #[serde(default)]
    pub storage: StorageFileConfig,

    /// Language model endpoint
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice input/output
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerFileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageFileConfig {
    /// Base directory for the default file locations
    pub data_dir: Option<String>,

    /// Pantry list file
    pub pantry_file: Option<String>,

    /// Item category dataset (JSON)
    pub dataset: Option<String>,

    /// `substring` or `exact`
    pub removal: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Generate endpoint (e.g. `http://localhost:11434/api/generate`)
    pub url: Option<String>,

    /// Model name (e.g. "llama3")
    pub model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable the microphone loop
    pub enabled: Option<bool>,

    /// `whisper` or `deepgram`
    pub stt_provider: Option<String>,

    /// Whisper-compatible API base
    pub stt_url: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// `local`, `openai` or `none`
    pub tts_engine: Option<String>,

    /// OpenAI-compatible speech API base
    pub tts_url: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// Remote TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// Local TTS rate in words per minute
    pub tts_rate: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// HTTP API port
    pub port: Option<u16>,

    /// Static web UI directory
    pub static_dir: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `PantryConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> PantryConfigFile {
    config_file_path().map_or_else(PantryConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Missing or unparseable files yield the defaults.
pub fn load_from(path: &Path) -> PantryConfigFile {
    if !path.exists() {
        return PantryConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                PantryConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            PantryConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/pantry/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("pantry").join("config.toml"))
}
