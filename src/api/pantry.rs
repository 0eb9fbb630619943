//! Grocery list endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use super::error::ApiError;

/// Build pantry router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/pantry", get(list).delete(clear))
        .route("/api/pantry/items", post(add_item))
        .route("/api/pantry/items/{item}", delete(remove_item))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct PantryResponse {
    pub items: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub item: String,
}

#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    /// Stored entry, e.g. `"milk (dairy)"`
    pub entry: String,
}

#[derive(Debug, Serialize)]
pub struct RemoveItemResponse {
    /// Number of entries deleted
    pub removed: usize,
}

/// Current list in insertion order
async fn list(State(state): State<Arc<ApiState>>) -> Result<Json<PantryResponse>, ApiError> {
    let items = state.pipeline.pantry().read()?;
    Ok(Json(PantryResponse { items }))
}

/// Empty the list
async fn clear(State(state): State<Arc<ApiState>>) -> Result<StatusCode, ApiError> {
    state.pipeline.pantry().clear()?;
    tracing::info!("pantry cleared");
    Ok(StatusCode::NO_CONTENT)
}

async fn add_item(
    State(state): State<Arc<ApiState>>,
    request: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<AddItemResponse>, ApiError> {
    let Json(request) = request?;
    let entry = state.pipeline.pantry().add(&request.item)?;
    Ok(Json(AddItemResponse { entry }))
}

async fn remove_item(
    State(state): State<Arc<ApiState>>,
    Path(item): Path<String>,
) -> Result<Json<RemoveItemResponse>, ApiError> {
    let removed = state.pipeline.pantry().remove(&item)?;
    Ok(Json(RemoveItemResponse { removed }))
}
