//! Pantry store
//!
//! The grocery list is a flat sequence of entries persisted as one
//! comma-joined blob. [`Pantry`] is the repository over that blob: it
//! normalizes names, annotates known items with their category and applies
//! removals. Where the blob lives is up to the [`PantryStorage`] backend.

mod file;
mod memory;

use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::catalog::CategoryLookup;
use crate::{Error, Result};

/// Separator written between entries
const ENTRY_SEPARATOR: &str = ", ";

/// Backing storage for the pantry blob
pub trait PantryStorage: Send + Sync {
    /// Load the stored blob, `None` if nothing has been written yet
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored blob
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written
    fn save(&self, blob: &str) -> Result<()>;
}

/// How `remove` matches entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovalMode {
    /// Drop every entry whose text contains the target.
    ///
    /// Over-deletes: removing "milk" also drops "milkshake mix".
    #[default]
    Substring,
    /// Drop entries whose item name (category suffix stripped) equals the target
    Exact,
}

impl FromStr for RemovalMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "exact" => Ok(Self::Exact),
            other => Err(Error::Config(format!(
                "unknown removal mode {other:?} (expected \"substring\" or \"exact\")"
            ))),
        }
    }
}

/// Grocery list repository
pub struct Pantry {
    storage: Box<dyn PantryStorage>,
    catalog: Arc<CategoryLookup>,
    removal: RemovalMode,
    write_lock: Mutex<()>,
}

impl Pantry {
    /// Create a pantry over the given storage backend
    #[must_use]
    pub fn new(storage: impl PantryStorage + 'static, catalog: Arc<CategoryLookup>) -> Self {
        Self {
            storage: Box::new(storage),
            catalog,
            removal: RemovalMode::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Set the removal matching mode
    #[must_use]
    pub fn with_removal_mode(mut self, mode: RemovalMode) -> Self {
        self.removal = mode;
        self
    }

    /// Read the current entries in insertion order
    ///
    /// # Errors
    ///
    /// Returns error if the storage backend fails
    pub fn read(&self) -> Result<Vec<String>> {
        Ok(self
            .storage
            .load()?
            .map(|blob| decode(&blob))
            .unwrap_or_default())
    }

    /// Append an item, annotated with its category when known
    ///
    /// Returns the stored entry.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or contains a comma, or the storage
    /// backend fails
    pub fn add(&self, item: &str) -> Result<String> {
        let mut entries = self.add_all(&[item])?;
        entries
            .pop()
            .ok_or_else(|| Error::InvalidItem("item name is empty".to_string()))
    }

    /// Append several items with a single write
    ///
    /// Either every item is stored or none is. Returns the stored entries.
    ///
    /// # Errors
    ///
    /// Returns error if any name is invalid or the storage backend fails
    pub fn add_all<S: AsRef<str>>(&self, items: &[S]) -> Result<Vec<String>> {
        let added = items
            .iter()
            .map(|item| normalize(item.as_ref()).map(|name| self.annotate(name)))
            .collect::<Result<Vec<_>>>()?;

        let _guard = self.lock();
        let mut entries = self.read()?;
        entries.extend(added.iter().cloned());
        self.storage.save(&encode(&entries))?;

        tracing::debug!(entries = ?added, "added pantry entries");
        Ok(added)
    }

    /// Remove entries matching an item
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid or the storage backend fails
    pub fn remove(&self, item: &str) -> Result<usize> {
        self.remove_all(&[item])
    }

    /// Remove entries matching any of several items with a single write
    ///
    /// Either every removal is stored or none is. Returns the number of
    /// entries removed.
    ///
    /// # Errors
    ///
    /// Returns error if any name is invalid or the storage backend fails
    pub fn remove_all<S: AsRef<str>>(&self, items: &[S]) -> Result<usize> {
        let targets = items
            .iter()
            .map(|item| normalize(item.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let _guard = self.lock();
        let entries = self.read()?;
        let before = entries.len();
        let kept: Vec<String> = entries
            .into_iter()
            .filter(|entry| !targets.iter().any(|target| self.matches(entry, target)))
            .collect();
        let removed = before - kept.len();
        self.storage.save(&encode(&kept))?;

        tracing::debug!(targets = ?targets, removed, mode = ?self.removal, "removed pantry entries");
        Ok(removed)
    }

    /// Empty the list
    ///
    /// # Errors
    ///
    /// Returns error if the storage backend fails
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock();
        self.storage.save("")?;
        tracing::debug!("cleared pantry");
        Ok(())
    }

    fn annotate(&self, name: String) -> String {
        match self.catalog.category(&name) {
            Some(category) => format!("{name} ({category})"),
            None => name,
        }
    }

    fn matches(&self, entry: &str, target: &str) -> bool {
        let entry = entry.to_lowercase();
        match self.removal {
            RemovalMode::Substring => entry.contains(target),
            RemovalMode::Exact => entry_name(&entry) == target,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state
        self.write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Item name of an entry with any `" (category)"` suffix stripped
#[must_use]
pub fn entry_name(entry: &str) -> &str {
    entry
        .strip_suffix(')')
        .and_then(|rest| rest.rfind(" (").map(|idx| &entry[..idx]))
        .unwrap_or(entry)
        .trim()
}

/// Title-case an entry for display ("milk (dairy)" -> "Milk (Dairy)")
#[must_use]
pub fn display_entry(entry: &str) -> String {
    let mut out = String::with_capacity(entry.len());
    let mut word_start = true;
    for c in entry.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

fn normalize(item: &str) -> Result<String> {
    let name = item.trim().to_lowercase();
    if name.is_empty() {
        return Err(Error::InvalidItem("item name is empty".to_string()));
    }
    if name.contains(',') {
        return Err(Error::InvalidItem(format!(
            "item name {name:?} contains a comma"
        )));
    }
    Ok(name)
}

fn decode(blob: &str) -> Vec<String> {
    blob.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn encode(entries: &[String]) -> String {
    entries.join(ENTRY_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Storage whose writes always fail
    struct FailingStorage(String);

    impl FailingStorage {
        fn holding(blob: &str) -> Self {
            Self(blob.to_string())
        }
    }

    impl PantryStorage for FailingStorage {
        fn load(&self) -> Result<Option<String>> {
            Ok(Some(self.0.clone()))
        }

        fn save(&self, _blob: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::other("disk full")))
        }
    }

    fn pantry_with(catalog: &[(&str, &str)]) -> Pantry {
        let catalog: CategoryLookup = catalog.iter().copied().collect();
        Pantry::new(MemoryStorage::default(), Arc::new(catalog))
    }

    #[test]
    fn read_empty_store() {
        let pantry = pantry_with(&[]);
        assert!(pantry.read().unwrap().is_empty());
    }

    #[test]
    fn read_splits_and_trims() {
        let pantry = Pantry::new(
            MemoryStorage::with_blob("milk, eggs"),
            Arc::new(CategoryLookup::default()),
        );
        assert_eq!(pantry.read().unwrap(), vec!["milk", "eggs"]);
    }

    #[test]
    fn read_drops_empty_pieces() {
        let pantry = Pantry::new(
            MemoryStorage::with_blob("milk, , eggs,"),
            Arc::new(CategoryLookup::default()),
        );
        assert_eq!(pantry.read().unwrap(), vec!["milk", "eggs"]);
    }

    #[test]
    fn add_annotates_known_items() {
        let pantry = pantry_with(&[("milk", "dairy")]);

        assert_eq!(pantry.add("  Milk ").unwrap(), "milk (dairy)");
        assert_eq!(pantry.add("kiwi").unwrap(), "kiwi");
        assert_eq!(pantry.read().unwrap(), vec!["milk (dairy)", "kiwi"]);
    }

    #[test]
    fn add_keeps_duplicates() {
        let pantry = pantry_with(&[]);
        pantry.add("eggs").unwrap();
        pantry.add("EGGS").unwrap();
        assert_eq!(pantry.read().unwrap(), vec!["eggs", "eggs"]);
    }

    #[test]
    fn add_rejects_empty_name() {
        let pantry = pantry_with(&[]);
        assert!(matches!(pantry.add("   "), Err(Error::InvalidItem(_))));
        assert!(pantry.read().unwrap().is_empty());
    }

    #[test]
    fn substring_removal_over_deletes() {
        let pantry = pantry_with(&[("milk", "dairy")]);
        pantry.add("milk").unwrap();
        pantry.add("milkshake mix").unwrap();
        pantry.add("bread").unwrap();

        assert_eq!(pantry.remove("Milk").unwrap(), 2);
        assert_eq!(pantry.read().unwrap(), vec!["bread"]);
    }

    #[test]
    fn exact_removal_keeps_longer_names() {
        let catalog: CategoryLookup = [("milk", "dairy")].into_iter().collect();
        let pantry = Pantry::new(MemoryStorage::default(), Arc::new(catalog))
            .with_removal_mode(RemovalMode::Exact);
        pantry.add("milk").unwrap();
        pantry.add("milkshake mix").unwrap();

        assert_eq!(pantry.remove("milk").unwrap(), 1);
        assert_eq!(pantry.read().unwrap(), vec!["milkshake mix"]);
    }

    #[test]
    fn remove_rejects_empty_target() {
        let pantry = pantry_with(&[]);
        pantry.add("bread").unwrap();
        assert!(pantry.remove(" ").is_err());
        assert_eq!(pantry.read().unwrap(), vec!["bread"]);
    }

    #[test]
    fn add_rejects_comma_in_name() {
        let pantry = pantry_with(&[]);
        assert!(matches!(pantry.add("salt, pepper"), Err(Error::InvalidItem(_))));
        assert!(pantry.remove("salt,").is_err());
        assert!(pantry.read().unwrap().is_empty());
    }

    #[test]
    fn add_all_writes_every_item_once() {
        let pantry = pantry_with(&[("apples", "produce")]);
        pantry.add("bread").unwrap();

        let added = pantry.add_all(&["Apples", "kiwi"]).unwrap();

        assert_eq!(added, vec!["apples (produce)", "kiwi"]);
        assert_eq!(pantry.read().unwrap(), vec!["bread", "apples (produce)", "kiwi"]);
    }

    #[test]
    fn add_all_with_one_bad_name_stores_nothing() {
        let pantry = pantry_with(&[]);
        assert!(pantry.add_all(&["rice", " ", "beans"]).is_err());
        assert!(pantry.read().unwrap().is_empty());
    }

    #[test]
    fn remove_all_counts_every_match() {
        let pantry = pantry_with(&[]);
        pantry.add_all(&["eggs", "bread", "jam"]).unwrap();

        assert_eq!(pantry.remove_all(&["eggs", "jam", "tea"]).unwrap(), 2);
        assert_eq!(pantry.read().unwrap(), vec!["bread"]);
    }

    #[test]
    fn failed_save_leaves_list_unchanged() {
        let pantry = Pantry::new(
            FailingStorage::holding("bread"),
            Arc::new(CategoryLookup::default()),
        );

        assert!(pantry.add_all(&["apples", "bananas", "cherries"]).is_err());
        assert!(pantry.remove_all(&["bread"]).is_err());
        assert_eq!(pantry.read().unwrap(), vec!["bread"]);
    }

    #[test]
    fn clear_then_read_is_empty() {
        let pantry = pantry_with(&[]);
        pantry.add("bread").unwrap();
        pantry.clear().unwrap();
        assert!(pantry.read().unwrap().is_empty());
    }

    #[test]
    fn entry_name_strips_category() {
        assert_eq!(entry_name("milk (dairy)"), "milk");
        assert_eq!(entry_name("kiwi"), "kiwi");
        assert_eq!(entry_name("salsa (hot) (condiments)"), "salsa (hot)");
    }

    #[test]
    fn display_entry_title_cases() {
        assert_eq!(display_entry("milk (dairy)"), "Milk (Dairy)");
        assert_eq!(display_entry("milkshake mix"), "Milkshake Mix");
    }

    #[test]
    fn removal_mode_parses() {
        assert_eq!("Exact".parse::<RemovalMode>().unwrap(), RemovalMode::Exact);
        assert_eq!(
            "substring".parse::<RemovalMode>().unwrap(),
            RemovalMode::Substring
        );
        assert!("fuzzy".parse::<RemovalMode>().is_err());
    }
}
