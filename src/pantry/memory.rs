//! In-memory pantry storage

use std::sync::Mutex;

use super::PantryStorage;
use crate::Result;

/// Keeps the pantry blob in memory (tests, ephemeral sessions)
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blob: Mutex<Option<String>>,
}

impl MemoryStorage {
    /// Create storage pre-populated with a blob
    #[must_use]
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }
}

impl PantryStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .blob
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, blob: &str) -> Result<()> {
        *self
            .blob
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(blob.to_string());
        Ok(())
    }
}
