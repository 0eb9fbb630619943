//! Daemon - the long-running assistant service
//!
//! Wires configuration into a pipeline, serves the HTTP API and, when voice
//! is enabled, listens on the microphone for spoken requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use crate::api::ApiServerBuilder;
use crate::assistant::OllamaClient;
use crate::catalog::CategoryLookup;
use crate::pantry::{FileStorage, Pantry};
use crate::pipeline::{Pipeline, Turn};
use crate::session::Session;
use crate::voice::{
    AudioCapture, SAMPLE_RATE, Speaker, SpeechDetector, SpeechToText, SttProvider, TextToSpeech,
    Transcriber, TtsEngine, samples_to_wav,
};
use crate::{Config, Error, Result};

/// How often the microphone buffer is drained
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Open the pantry file named by the configuration
#[must_use]
pub fn open_pantry(config: &Config) -> Arc<Pantry> {
    let catalog = Arc::new(CategoryLookup::load(&config.dataset_file));
    tracing::debug!(
        path = %config.pantry_file.display(),
        categories = catalog.len(),
        removal = ?config.removal,
        "pantry opened"
    );
    Arc::new(
        Pantry::new(FileStorage::new(config.pantry_file.clone()), catalog)
            .with_removal_mode(config.removal),
    )
}

/// Build the configured speech-to-text client
///
/// Returns `None` (with a warning) if the provider can't be set up.
#[must_use]
pub fn build_transcriber(config: &Config) -> Option<Arc<dyn Transcriber>> {
    let voice = &config.voice;
    let stt = match voice.stt_provider {
        SttProvider::Whisper => Ok(SpeechToText::new_whisper(
            voice.stt_url.clone(),
            config.api_keys.openai.clone(),
            voice.stt_model.clone(),
        )),
        SttProvider::Deepgram => SpeechToText::new_deepgram(
            config.api_keys.deepgram.clone().unwrap_or_default(),
            voice.stt_model.clone(),
        ),
    };

    match stt {
        Ok(stt) => {
            tracing::debug!(provider = ?voice.stt_provider, model = %voice.stt_model, "speech-to-text ready");
            Some(Arc::new(stt))
        }
        Err(e) => {
            tracing::warn!(error = %e, "speech-to-text disabled");
            None
        }
    }
}

/// Build the configured speaker
///
/// Returns `None` when speech output is off or unavailable.
#[must_use]
pub fn build_speaker(config: &Config) -> Option<Arc<Speaker>> {
    let voice = &config.voice;
    let speaker = match voice.tts_engine {
        TtsEngine::None => return None,
        TtsEngine::Local => Speaker::local(voice.tts_rate),
        TtsEngine::OpenAi => TextToSpeech::new_openai(
            voice.tts_url.clone(),
            config.api_keys.openai.clone().unwrap_or_default(),
            voice.tts_model.clone(),
            voice.tts_voice.clone(),
            voice.tts_speed,
        )
        .map(Speaker::remote),
    };

    match speaker {
        Ok(speaker) => Some(Arc::new(speaker)),
        Err(e) => {
            tracing::warn!(error = %e, "speech output disabled");
            None
        }
    }
}

/// Build a pipeline from configuration
#[must_use]
pub fn build_pipeline(config: &Config) -> Pipeline {
    let model = Arc::new(OllamaClient::new(&config.llm.url, &config.llm.model));
    let pipeline = Pipeline::new(open_pantry(config), model);

    match build_transcriber(config) {
        Some(transcriber) => pipeline.with_transcriber(transcriber),
        None => pipeline,
    }
}

/// The assistant daemon - HTTP API plus optional microphone loop
pub struct Daemon {
    config: Config,
    pipeline: Pipeline,
    speaker: Option<Arc<Speaker>>,
    session: Arc<Mutex<Session>>,
}

impl Daemon {
    /// Create a new daemon instance
    #[must_use]
    pub fn new(config: Config) -> Self {
        let pipeline = build_pipeline(&config);
        let speaker = build_speaker(&config);

        Self {
            config,
            pipeline,
            speaker,
            session: Arc::default(),
        }
    }

    /// Serve the HTTP API, and listen on the microphone if `listen` is set
    ///
    /// Runs until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error if the server fails or the microphone can't be opened
    #[allow(clippy::future_not_send)]
    pub async fn run(self, listen: bool) -> Result<()> {
        tracing::info!(
            port = self.config.api_server.port,
            model = %self.config.llm.model,
            pantry = %self.config.pantry_file.display(),
            "daemon running"
        );

        let server = ApiServerBuilder::new(self.pipeline.clone(), self.config.api_server.port)
            .session(Arc::clone(&self.session))
            .speaker(self.speaker.clone())
            .static_dir(self.config.api_server.static_dir.clone())
            .build()
            .spawn();

        let mut shutdown_rx = shutdown_signal();

        if listen && self.config.voice.enabled {
            // cpal streams aren't Send, so the loop stays on this task
            tokio::select! {
                result = self.run_voice_loop(&mut shutdown_rx) => result?,
                joined = server => flatten(joined)?,
            }
        } else {
            if listen {
                tracing::info!("voice disabled in configuration, serving API only");
            }
            tokio::select! {
                _ = shutdown_rx.recv() => tracing::info!("shutdown requested"),
                joined = server => flatten(joined)?,
            }
        }

        Ok(())
    }

    /// Listen on the microphone without serving the API
    ///
    /// # Errors
    ///
    /// Returns error if the microphone can't be opened
    #[allow(clippy::future_not_send)]
    pub async fn listen(self) -> Result<()> {
        let mut shutdown_rx = shutdown_signal();
        self.run_voice_loop(&mut shutdown_rx).await
    }

    /// Run voice processing loop
    #[allow(clippy::future_not_send)]
    async fn run_voice_loop(&self, shutdown_rx: &mut mpsc::Receiver<()>) -> Result<()> {
        if !self.pipeline.has_transcriber() {
            return Err(Error::Config(
                "listening requires a speech-to-text service".to_string(),
            ));
        }

        let mut capture = AudioCapture::new()?;
        let mut detector = SpeechDetector::new();

        capture.start()?;
        tracing::info!("listening for requests, press Ctrl-C to stop");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                () = tokio::time::sleep(POLL_INTERVAL) => {
                    if let Err(e) = self.process_voice_chunk(&capture, &mut detector).await {
                        tracing::error!(error = %e, "voice processing error");
                    }
                }
            }
        }

        capture.stop();
        Ok(())
    }

    /// Process a chunk of microphone audio
    #[allow(clippy::future_not_send)]
    async fn process_voice_chunk(
        &self,
        capture: &AudioCapture,
        detector: &mut SpeechDetector,
    ) -> Result<()> {
        let samples = capture.take_buffer();
        if samples.is_empty() || !detector.process(&samples) {
            return Ok(());
        }

        let utterance = detector.take_utterance();
        tracing::debug!(samples = utterance.len(), "utterance captured");
        let wav = samples_to_wav(&utterance, SAMPLE_RATE)?;

        let turn = {
            let mut session = self.session.lock().await;
            self.pipeline.handle_audio(&mut session, &wav).await
        };

        let result = match turn {
            Ok(turn) => {
                if let Turn::Replied(exchange) = &turn {
                    println!("You: {}", exchange.transcript);
                }
                self.say(&turn).await;
                Ok(())
            }
            Err(e) => Err(e),
        };

        // Drop whatever the mic heard while we were busy (including our own voice)
        capture.clear_buffer();
        detector.reset();
        result
    }

    /// Print and speak a turn's reply
    async fn say(&self, turn: &Turn) {
        let Some(text) = turn.spoken_text() else {
            return;
        };
        println!("Assistant: {text}");

        if let Some(speaker) = &self.speaker {
            if let Err(e) = speaker.speak(text).await {
                tracing::warn!(error = %e, "failed to speak reply");
            }
        }
    }
}

/// Resolve once on Ctrl-C
fn shutdown_signal() -> mpsc::Receiver<()> {
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(()).await;
        }
    });
    shutdown_rx
}

fn flatten(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    joined.map_err(|e| Error::Config(format!("API server task failed: {e}")))?
}
