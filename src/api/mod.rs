//! HTTP API server for a web front end

pub mod chat;
pub mod error;
pub mod health;
pub mod pantry;

pub use error::ApiError;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::pipeline::{Pipeline, Turn};
use crate::session::Session;
use crate::voice::Speaker;

/// Shared state for API handlers
pub struct ApiState {
    pub pipeline: Pipeline,
    /// Conversation shared with the microphone loop; one turn at a time
    pub session: Arc<Mutex<Session>>,
    /// Speaks replies on the host, if configured
    pub speaker: Option<Arc<Speaker>>,
}

impl ApiState {
    /// Speak a turn's reply in the background
    fn announce(&self, turn: &Turn) {
        let (Some(speaker), Some(text)) = (&self.speaker, turn.spoken_text()) else {
            return;
        };

        let speaker = Arc::clone(speaker);
        let text = text.to_string();
        tokio::spawn(async move {
            if let Err(e) = speaker.speak(&text).await {
                tracing::warn!(error = %e, "failed to speak reply");
            }
        });
    }
}

/// Builder for API server
pub struct ApiServerBuilder {
    pipeline: Pipeline,
    port: u16,
    session: Option<Arc<Mutex<Session>>>,
    speaker: Option<Arc<Speaker>>,
    static_dir: Option<PathBuf>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub const fn new(pipeline: Pipeline, port: u16) -> Self {
        Self {
            pipeline,
            port,
            session: None,
            speaker: None,
            static_dir: None,
        }
    }

    /// Share a session with other interaction sources
    #[must_use]
    pub fn session(mut self, session: Arc<Mutex<Session>>) -> Self {
        self.session = Some(session);
        self
    }

    /// Speak replies through this speaker
    #[must_use]
    pub fn speaker(mut self, speaker: Option<Arc<Speaker>>) -> Self {
        self.speaker = speaker;
        self
    }

    /// Set the static files directory for serving the web UI
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let state = Arc::new(ApiState {
            pipeline: self.pipeline,
            session: self.session.unwrap_or_default(),
            speaker: self.speaker,
        });

        ApiServer {
            state,
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(pantry::router(self.state.clone()))
            .merge(chat::router(self.state.clone()))
            .merge(health::router());

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        // CORS layer for cross-origin requests from frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
