//! Language model client
//!
//! Builds the grocery prompt and sends it to a local generation endpoint
//! (Ollama-compatible `/api/generate`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default generation endpoint
pub const DEFAULT_LLM_URL: &str = "http://localhost:11434/api/generate";

/// Default model name
pub const DEFAULT_LLM_MODEL: &str = "llama3";

/// Reply used when the model can't be reached or answers garbage
pub const FALLBACK_REPLY: &str = "I'm having trouble connecting to my brain.";

/// Instruction block sent ahead of every utterance
const INSTRUCTIONS: &str = "\
You are a smart grocery and chef assistant.
The user's current pantry list is: [{pantry}].

INSTRUCTIONS:
1. ADDING ITEMS: If the user wants to add items, reply strictly: \"ACTION: ADD item1, item2, item3\".
2. REMOVING ITEMS: If the user wants to remove items, reply strictly: \"ACTION: REMOVE item1, item2\".
3. RECIPES: If the user asks what to cook, suggest a dish using mainly the items in the current list.
   - Mention which items they already have.
   - Mention 1 or 2 missing items they might need to buy.
   - Keep the suggestion short (2-3 sentences max).
4. GENERAL: Otherwise, answer the question normally.";

/// A text generation backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for a prompt
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable or the response is malformed
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Build the full prompt for an utterance
#[must_use]
pub fn build_prompt(pantry: &[String], utterance: &str) -> String {
    let instructions = INSTRUCTIONS.replace("{pantry}", &pantry.join(", "));
    format!("{instructions}\nUser: {utterance}\nAssistant:")
}

/// Ask the model about an utterance, falling back to [`FALLBACK_REPLY`]
pub async fn consult(model: &dyn LanguageModel, pantry: &[String], utterance: &str) -> String {
    let prompt = build_prompt(pantry, utterance);
    match model.generate(&prompt).await {
        Ok(reply) => {
            tracing::debug!(reply = %reply, "model replied");
            reply
        }
        Err(e) => {
            tracing::warn!(error = %e, "language model unavailable, using fallback reply");
            FALLBACK_REPLY.to_string()
        }
    }
}

/// Request body for `/api/generate`
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body from `/api/generate`
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local Ollama-style generation endpoint
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaClient {
    /// Create a client for the given endpoint and model
    #[must_use]
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        tracing::debug!(url = %self.url, model = %self.model, "querying language model");

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("generation endpoint error {status}: {body}")));
        }

        let body: GenerateResponse = response.json().await?;
        Ok(body.response)
    }
}
