//! Category lookup for known grocery items
//!
//! Loaded once from a JSON side file mapping lowercase item names to a record
//! with at least a `category` field. A missing or malformed file yields an
//! empty lookup so the assistant keeps working without annotations.

use std::collections::HashMap;
use std::path::Path;

/// Immutable mapping from item name to category label
#[derive(Debug, Clone, Default)]
pub struct CategoryLookup {
    categories: HashMap<String, String>,
}

impl CategoryLookup {
    /// Load the lookup from a dataset file
    ///
    /// Returns an empty lookup if the file doesn't exist or can't be parsed.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no category dataset, using empty lookup");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let lookup = Self::parse(&content);
                tracing::info!(
                    path = %path.display(),
                    items = lookup.len(),
                    "loaded category dataset"
                );
                lookup
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read category dataset"
                );
                Self::default()
            }
        }
    }

    /// Parse dataset JSON
    ///
    /// Blank input and invalid JSON give an empty lookup. Records without a
    /// string `category` are skipped individually.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        if content.trim().is_empty() {
            return Self::default();
        }

        let records: serde_json::Map<String, serde_json::Value> =
            match serde_json::from_str(content) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(error = %e, "category dataset is not a JSON object, ignoring");
                    return Self::default();
                }
            };

        let mut categories = HashMap::with_capacity(records.len());
        for (name, record) in records {
            match record.get("category").and_then(serde_json::Value::as_str) {
                Some(category) => {
                    categories.insert(name.trim().to_lowercase(), category.to_string());
                }
                None => tracing::debug!(item = %name, "dataset record has no category, skipping"),
            }
        }

        Self { categories }
    }

    /// Category for an exact (already normalized) item name
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&str> {
        self.categories.get(name).map(String::as_str)
    }

    /// Number of known items
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the lookup has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl<N: Into<String>, C: Into<String>> FromIterator<(N, C)> for CategoryLookup {
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        Self {
            categories: iter
                .into_iter()
                .map(|(name, category)| (name.into().trim().to_lowercase(), category.into()))
                .collect(),
        }
    }
}
