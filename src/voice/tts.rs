//! Text-to-speech (TTS) output

use std::path::{Path, PathBuf};

use crate::voice::AudioPlayback;
use crate::{Error, Result};

/// Speaking rate for local engines, in words per minute
pub const DEFAULT_RATE_WPM: u32 = 170;

/// Local speech synthesizers, in order of preference
const LOCAL_ENGINES: &[&str] = &["espeak-ng", "espeak", "say"];

/// Which TTS backend to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TtsEngine {
    /// A synthesizer binary on `PATH`
    #[default]
    Local,
    /// An OpenAI-compatible `/audio/speech` endpoint
    OpenAi,
    /// Don't speak replies
    None,
}

impl std::str::FromStr for TtsEngine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "openai" => Ok(Self::OpenAi),
            "none" | "off" => Ok(Self::None),
            other => Err(Error::Config(format!("unknown TTS engine {other:?}"))),
        }
    }
}

/// Synthesizes speech through an OpenAI-compatible API
pub struct TextToSpeech {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    speed: f32,
}

impl TextToSpeech {
    /// Create a new remote TTS client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(
        base_url: String,
        api_key: String,
        model: String,
        voice: String,
        speed: f32,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            voice,
            speed,
        })
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS API error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

enum Backend {
    Local { program: PathBuf, rate: u32 },
    Remote(TextToSpeech),
}

/// Speaks replies aloud on this machine
pub struct Speaker {
    backend: Backend,
}

impl Speaker {
    /// Use the first local synthesizer found on `PATH`
    ///
    /// # Errors
    ///
    /// Returns error if none of `espeak-ng`, `espeak` or `say` is installed
    pub fn local(rate: u32) -> Result<Self> {
        let program = LOCAL_ENGINES
            .iter()
            .find_map(|name| which::which(name).ok())
            .ok_or_else(|| {
                Error::Tts(format!(
                    "no local speech engine found (tried {})",
                    LOCAL_ENGINES.join(", ")
                ))
            })?;

        tracing::debug!(program = %program.display(), rate, "using local speech engine");
        Ok(Self {
            backend: Backend::Local { program, rate },
        })
    }

    /// Speak through a remote synthesizer, playing the audio locally
    #[must_use]
    pub const fn remote(tts: TextToSpeech) -> Self {
        Self {
            backend: Backend::Remote(tts),
        }
    }

    /// Speak text, returning when it has been said
    ///
    /// # Errors
    ///
    /// Returns error if the text is empty or synthesis/playback fails
    pub async fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Tts("cannot speak empty text".to_string()));
        }

        match &self.backend {
            Backend::Local { program, rate } => speak_local(program, *rate, text).await,
            Backend::Remote(tts) => {
                let mp3 = tts.synthesize(text).await?;
                tracing::debug!(bytes = mp3.len(), "synthesized speech");
                tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_mp3(&mp3))
                    .await
                    .map_err(|e| Error::Tts(format!("playback task failed: {e}")))?
            }
        }
    }
}

/// Arguments for a local synthesizer reading its text from stdin
fn local_args(program: &Path, rate: u32) -> Vec<String> {
    // espeak takes -s, macOS say takes -r; both in words per minute
    if program.file_name().is_some_and(|n| n == "say") {
        vec!["-r".into(), rate.to_string(), "-f".into(), "-".into()]
    } else {
        vec!["-s".into(), rate.to_string(), "--stdin".into()]
    }
}

async fn speak_local(program: &Path, rate: u32, text: &str) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let spawn_err =
        |e: std::io::Error| Error::Tts(format!("failed to run {}: {e}", program.display()));

    // Text goes through stdin so a reply starting with '-' is never read as an option
    let mut child = tokio::process::Command::new(program)
        .args(local_args(program, rate))
        .stdin(std::process::Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await.map_err(spawn_err)?;
        stdin.write_all(b"\n").await.map_err(spawn_err)?;
    }

    let status = child.wait().await.map_err(spawn_err)?;
    if !status.success() {
        return Err(Error::Tts(format!(
            "{} exited with {status}",
            program.display()
        )));
    }
    Ok(())
}
