//! Conversation endpoints: typed chat, recorded voice, history

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use super::error::ApiError;
use crate::pipeline::Turn;
use crate::session::ChatEntry;

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/voice", post(voice))
        .route("/api/history", get(history))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Newest first
    pub entries: Vec<ChatEntry>,
}

/// Handle a typed utterance
async fn chat(
    State(state): State<Arc<ApiState>>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Turn>, ApiError> {
    let Json(request) = request?;
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("empty text".to_string()));
    }

    let turn = {
        let mut session = state.session.lock().await;
        state.pipeline.handle_text(&mut session, &request.text).await?
    };

    state.announce(&turn);
    Ok(Json(turn))
}

/// Handle a recorded utterance
///
/// Accepts a WAV file as the raw request body.
async fn voice(State(state): State<Arc<ApiState>>, body: Bytes) -> Result<Json<Turn>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty audio data".to_string()));
    }

    let turn = {
        let mut session = state.session.lock().await;
        state.pipeline.handle_audio(&mut session, &body).await?
    };

    state.announce(&turn);
    Ok(Json(turn))
}

async fn history(State(state): State<Arc<ApiState>>) -> Json<HistoryResponse> {
    let session = state.session.lock().await;
    let entries = session.history().iter().rev().cloned().collect();
    Json(HistoryResponse { entries })
}
