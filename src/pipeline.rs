//! One interaction, end to end
//!
//! Audio or text goes in; the pantry is consulted, the model is asked, its
//! reply is interpreted and applied, and the session history is updated.

use std::sync::Arc;

use serde::Serialize;

use crate::assistant::{self, LanguageModel};
use crate::interpreter::{self, AppliedAction};
use crate::pantry::Pantry;
use crate::session::{Role, Session};
use crate::voice::{self, Transcriber};
use crate::{Error, Result};

/// Shown when a recording has no recognisable speech
pub const NO_SPEECH_REPLY: &str = "I didn't catch that. Could you say it again?";

/// A completed question and answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    /// What the user said or typed
    pub transcript: String,
    /// Text to display and speak
    pub reply: String,
    /// List change made by this exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<AppliedAction>,
}

/// Outcome of one interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Turn {
    Replied(Exchange),
    /// Same audio payload as the previous submission; nothing was done
    Duplicate,
    /// Nothing intelligible was said
    NoSpeech { message: String },
}

impl Turn {
    fn no_speech() -> Self {
        Self::NoSpeech {
            message: NO_SPEECH_REPLY.to_string(),
        }
    }

    /// Text the user should hear, if any
    #[must_use]
    pub fn spoken_text(&self) -> Option<&str> {
        match self {
            Self::Replied(exchange) => Some(&exchange.reply),
            Self::NoSpeech { message } => Some(message),
            Self::Duplicate => None,
        }
    }
}

/// Runs interactions against a pantry and a language model
#[derive(Clone)]
pub struct Pipeline {
    pantry: Arc<Pantry>,
    model: Arc<dyn LanguageModel>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl Pipeline {
    /// Create a text-only pipeline
    #[must_use]
    pub fn new(pantry: Arc<Pantry>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            pantry,
            model,
            transcriber: None,
        }
    }

    /// Enable audio turns through the given transcriber
    #[must_use]
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// The pantry this pipeline mutates
    #[must_use]
    pub const fn pantry(&self) -> &Arc<Pantry> {
        &self.pantry
    }

    /// Whether audio turns can be transcribed
    #[must_use]
    pub const fn has_transcriber(&self) -> bool {
        self.transcriber.is_some()
    }

    /// Handle a recorded WAV payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::Audio`] if the payload isn't a readable WAV file and
    /// [`Error::Stt`] if no speech service is configured or it fails
    pub async fn handle_audio(&self, session: &mut Session, wav: &[u8]) -> Result<Turn> {
        if session.is_repeat_audio(wav) {
            return Ok(Turn::Duplicate);
        }

        let audio = voice::decode_wav(wav)?;
        if !voice::contains_speech(&audio.samples, audio.sample_rate) {
            tracing::debug!(samples = audio.samples.len(), "recording is silent");
            return Ok(Turn::no_speech());
        }

        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or_else(|| Error::Stt("no speech-to-text service configured".to_string()))?;

        let transcript = transcriber.transcribe(wav).await?;
        if transcript.is_empty() {
            return Ok(Turn::no_speech());
        }

        self.handle_text(session, &transcript).await
    }

    /// Handle a typed or transcribed utterance
    ///
    /// # Errors
    ///
    /// Returns error if the pantry can't be read
    pub async fn handle_text(&self, session: &mut Session, text: &str) -> Result<Turn> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Turn::no_speech());
        }

        let items = self.pantry.read()?;
        session.push(Role::User, text);
        tracing::info!(utterance = %text, pantry_items = items.len(), "handling utterance");

        let raw = assistant::consult(self.model.as_ref(), &items, text).await;
        let resolution = interpreter::resolve(&raw, &self.pantry);

        session.push(Role::Assistant, resolution.message.clone());
        tracing::info!(reply = %resolution.message, "replied");

        Ok(Turn::Replied(Exchange {
            transcript: text.to_string(),
            reply: resolution.message,
            action: resolution.action,
        }))
    }
}
