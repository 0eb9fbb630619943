//! Configuration management
//!
//! Values are layered: environment variables override the TOML file, which
//! overrides built-in defaults.

pub mod file;

use std::path::PathBuf;

use crate::assistant::{DEFAULT_LLM_MODEL, DEFAULT_LLM_URL};
use crate::pantry::RemovalMode;
use crate::voice::stt::DEFAULT_WHISPER_URL;
use crate::voice::tts::DEFAULT_RATE_WPM;
use crate::voice::{SttProvider, TtsEngine};
use crate::{Error, Result};

use file::PantryConfigFile;

/// Default HTTP API port
pub const DEFAULT_PORT: u16 = 8080;

/// Default OpenAI-compatible speech synthesis base
pub const DEFAULT_TTS_URL: &str = "https://api.openai.com/v1";

/// Pantry assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Pantry list file
    pub pantry_file: PathBuf,

    /// Item category dataset
    pub dataset_file: PathBuf,

    /// How `remove` matches entries
    pub removal: RemovalMode,

    /// Language model endpoint
    pub llm: LlmConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Generate endpoint URL
    pub url: String,

    /// Model name
    pub model: String,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Run the microphone loop alongside the server
    pub enabled: bool,

    pub stt_provider: SttProvider,

    /// Whisper-compatible API base
    pub stt_url: String,

    pub stt_model: String,

    pub tts_engine: TtsEngine,

    /// OpenAI-compatible speech API base
    pub tts_url: String,

    pub tts_model: String,

    pub tts_voice: String,

    /// Remote TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Local TTS rate in words per minute
    pub tts_rate: u32,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (for Whisper and TTS)
    pub openai: Option<String>,

    pub deepgram: Option<String>,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a value has an unknown variant (e.g. `PANTRY_REMOVAL=fuzzy`)
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a value has an unknown variant
    pub fn from_sources(fc: PantryConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // Default data directory (~/.local/share/pantry on Linux)
        let data_dir = var("PANTRY_DATA_DIR")
            .or(fc.storage.data_dir)
            .map_or_else(default_data_dir, PathBuf::from);

        let pantry_file = var("PANTRY_FILE")
            .or(fc.storage.pantry_file)
            .map_or_else(|| data_dir.join("pantry.txt"), PathBuf::from);

        let dataset_file = var("PANTRY_DATASET")
            .or(fc.storage.dataset)
            .map_or_else(|| data_dir.join("grocery_dataset.json"), PathBuf::from);

        let removal = var("PANTRY_REMOVAL")
            .or(fc.storage.removal)
            .map(|s| s.parse::<RemovalMode>())
            .transpose()?
            .unwrap_or_default();

        let llm = LlmConfig {
            url: var("PANTRY_LLM_URL")
                .or(fc.llm.url)
                .unwrap_or_else(|| DEFAULT_LLM_URL.to_string()),
            model: var("PANTRY_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
        };

        let stt_provider = var("PANTRY_STT_PROVIDER")
            .or(fc.voice.stt_provider)
            .map(|s| s.parse::<SttProvider>())
            .transpose()?
            .unwrap_or(SttProvider::Whisper);

        let default_stt_model = match stt_provider {
            SttProvider::Whisper => "whisper-1",
            SttProvider::Deepgram => "nova-2",
        };

        let tts_engine = var("PANTRY_TTS_ENGINE")
            .or(fc.voice.tts_engine)
            .map(|s| s.parse::<TtsEngine>())
            .transpose()?
            .unwrap_or_default();

        let voice = VoiceConfig {
            enabled: var("PANTRY_VOICE_ENABLED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .or(fc.voice.enabled)
                .unwrap_or(true),
            stt_provider,
            stt_url: var("PANTRY_STT_URL")
                .or(fc.voice.stt_url)
                .unwrap_or_else(|| DEFAULT_WHISPER_URL.to_string()),
            stt_model: var("PANTRY_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| default_stt_model.to_string()),
            tts_engine,
            tts_url: fc
                .voice
                .tts_url
                .unwrap_or_else(|| DEFAULT_TTS_URL.to_string()),
            tts_model: var("PANTRY_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: var("PANTRY_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| "alloy".to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0).clamp(0.25, 4.0),
            tts_rate: fc.voice.tts_rate.unwrap_or(DEFAULT_RATE_WPM),
        };

        let api_keys = ApiKeys {
            openai: var("OPENAI_API_KEY").or(fc.api_keys.openai),
            deepgram: var("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram),
        };

        let port = match var("PANTRY_PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| Error::Config(format!("invalid PANTRY_PORT {p:?}")))?,
            None => fc.server.port.unwrap_or(DEFAULT_PORT),
        };

        let api_server = ApiServerConfig {
            port,
            static_dir: var("PANTRY_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
        };

        Ok(Self {
            pantry_file,
            dataset_file,
            removal,
            llm,
            voice,
            api_keys,
            api_server,
        })
    }
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".local/share/pantry"),
        |d| d.data_dir().join("pantry"),
    )
}
