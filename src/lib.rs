//! Pantry Assistant - a voice-driven grocery list
//!
//! A spoken or typed request is sent, together with the current list, to a
//! local language model. The model either answers conversationally or asks
//! for items to be added or removed, and the list file is updated to match.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │     Microphone loop  │  HTTP API  │  CLI             │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Pipeline                          │
//! │   STT  │  Assistant  │  Interpreter  │  Session      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │       Pantry (flat file)  │  Category lookup         │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod assistant;
pub mod catalog;
pub mod config;
pub mod daemon;
pub mod error;
pub mod interpreter;
pub mod pantry;
pub mod pipeline;
pub mod session;
pub mod voice;

pub use assistant::{LanguageModel, OllamaClient};
pub use catalog::CategoryLookup;
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use interpreter::Reply;
pub use pantry::{FileStorage, MemoryStorage, Pantry, PantryStorage, RemovalMode};
pub use pipeline::{Exchange, Pipeline, Turn};
pub use session::{ChatEntry, Role, Session};
