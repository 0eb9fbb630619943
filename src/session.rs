//! Conversation session state
//!
//! Holds what one user's conversation carries between interactions: the chat
//! history and the digest of the last submitted audio payload. Nothing here
//! is persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Who said a chat line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Lowercase role name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One line of chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Per-conversation context passed into each interaction
#[derive(Debug, Default)]
pub struct Session {
    history: Vec<ChatEntry>,
    last_audio: Option<String>,
}

impl Session {
    /// Start an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chat line
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(ChatEntry {
            role,
            content: content.into(),
            at: Utc::now(),
        });
    }

    /// Chat history, oldest first
    #[must_use]
    pub fn history(&self) -> &[ChatEntry] {
        &self.history
    }

    /// Check whether an audio payload repeats the previous submission
    ///
    /// Records the payload digest, so the next call compares against it.
    pub fn is_repeat_audio(&mut self, audio: &[u8]) -> bool {
        let digest = hex::encode(Sha256::digest(audio));
        if self.last_audio.as_deref() == Some(digest.as_str()) {
            tracing::debug!(digest = %digest, "ignoring repeated audio payload");
            return true;
        }
        self.last_audio = Some(digest);
        false
    }
}
