//! Terminology catalog: owns the term database and mediates every mutation.
//! Each mutating call validates first, applies, then swaps in a freshly
//! built index, so readers holding an older `Arc<TerminologyIndex>` keep a
//! consistent snapshot.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::index::TerminologyIndex;
use super::{
    CatalogError, NewTerminologyEntry, TermUpdate, TerminologyDatabase, TerminologyEntry,
};

/// Version stamped on databases created through `load` with no prior database.
pub const DEFAULT_DATABASE_VERSION: &str = "1.0.0";

pub struct TerminologyCatalog {
    database: Option<TerminologyDatabase>,
    index: Arc<TerminologyIndex>,
}

impl TerminologyCatalog {
    /// An unloaded catalog with an empty index.
    pub fn new() -> Self {
        Self {
            database: None,
            index: Arc::new(TerminologyIndex::empty()),
        }
    }

    pub fn with_database(database: TerminologyDatabase) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.load_database(database)?;
        Ok(catalog)
    }

    /// Load a JSON terminology database from disk.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let database: TerminologyDatabase = serde_json::from_str(&content)?;
        info!(path = %path.display(), entries = database.entries.len(), "terminology database read");
        Self::with_database(database)
    }

    /// Replace the whole database, keeping the caller's version string.
    pub fn load_database(&mut self, mut database: TerminologyDatabase) -> Result<(), CatalogError> {
        validate_entries(&database.entries)?;
        database.last_updated = now_millis();
        info!(
            version = %database.version,
            entries = database.entries.len(),
            "terminology database loaded"
        );
        self.database = Some(database);
        self.rebuild();
        Ok(())
    }

    /// Replace the entry sequence. Keeps the current version if one exists.
    pub fn load(&mut self, entries: Vec<TerminologyEntry>) -> Result<(), CatalogError> {
        let version = self
            .database
            .as_ref()
            .map(|db| db.version.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_VERSION.to_string());
        self.load_database(TerminologyDatabase {
            version,
            last_updated: 0,
            entries,
        })
    }

    /// Append a new entry under a freshly generated id.
    pub fn add_term(&mut self, new: NewTerminologyEntry) -> Result<TerminologyEntry, CatalogError> {
        let database = self
            .database
            .as_mut()
            .ok_or(CatalogError::NotLoaded { operation: "add_term" })?;

        let id = loop {
            let candidate = uuid::Uuid::new_v4().to_string();
            if !database.entries.iter().any(|e| e.id == candidate) {
                break candidate;
            }
        };
        if new.term.trim().is_empty() {
            return Err(CatalogError::EmptyTerm { id });
        }

        let entry = new.into_entry(id);
        database.entries.push(entry.clone());
        database.last_updated = now_millis();
        debug!(id = %entry.id, term = %entry.term, "term added");
        self.rebuild();
        Ok(entry)
    }

    /// Remove by id. The index is only rebuilt when something was removed.
    pub fn remove_term(&mut self, id: &str) -> Result<bool, CatalogError> {
        let database = self
            .database
            .as_mut()
            .ok_or(CatalogError::NotLoaded { operation: "remove_term" })?;

        let Some(pos) = database.entries.iter().position(|e| e.id == id) else {
            debug!(id, "remove_term: no such id");
            return Ok(false);
        };
        let removed = database.entries.remove(pos);
        database.last_updated = now_millis();
        debug!(id, term = %removed.term, "term removed");
        self.rebuild();
        Ok(true)
    }

    /// Patch an entry in place. `Ok(None)` if the id is unknown.
    pub fn update_term(
        &mut self,
        id: &str,
        update: TermUpdate,
    ) -> Result<Option<TerminologyEntry>, CatalogError> {
        let database = self
            .database
            .as_mut()
            .ok_or(CatalogError::NotLoaded { operation: "update_term" })?;

        let Some(slot) = database.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        let mut patched = slot.clone();
        update.apply_to(&mut patched);
        if patched.term.trim().is_empty() {
            return Err(CatalogError::EmptyTerm { id: id.to_string() });
        }
        *slot = patched.clone();
        database.last_updated = now_millis();
        debug!(id, term = %patched.term, "term updated");
        self.rebuild();
        Ok(Some(patched))
    }

    pub fn is_loaded(&self) -> bool {
        self.database.is_some()
    }

    pub fn database(&self) -> Option<&TerminologyDatabase> {
        self.database.as_ref()
    }

    pub fn entries(&self) -> &[TerminologyEntry] {
        self.database
            .as_ref()
            .map(|db| db.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn get(&self, id: &str) -> Option<&TerminologyEntry> {
        self.entries().iter().find(|e| e.id == id)
    }

    /// Current index snapshot.
    pub fn index(&self) -> Arc<TerminologyIndex> {
        Arc::clone(&self.index)
    }

    /// Case-insensitive lookup by term or alias.
    pub fn lookup(&self, surface: &str) -> Option<&TerminologyEntry> {
        self.index.lookup(surface)
    }

    pub fn find_by_category(&self, category: &str) -> Vec<&TerminologyEntry> {
        self.entries()
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Distinct categories, sorted.
    pub fn list_categories(&self) -> Vec<String> {
        self.entries()
            .iter()
            .map(|e| e.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Case-insensitive substring search over term, aliases and definition.
    /// Each entry appears at most once, in catalog order.
    pub fn search(&self, query: &str) -> Vec<&TerminologyEntry> {
        let needle = query.to_lowercase();
        self.entries()
            .iter()
            .filter(|e| {
                e.term.to_lowercase().contains(&needle)
                    || e.aliases.iter().any(|a| a.to_lowercase().contains(&needle))
                    || e.definition.to_lowercase().contains(&needle)
            })
            .collect()
    }

    fn rebuild(&mut self) {
        let entries = self.entries().to_vec();
        self.index = Arc::new(TerminologyIndex::build(entries));
    }
}

impl Default for TerminologyCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_entries(entries: &[TerminologyEntry]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.id.as_str()) {
            return Err(CatalogError::DuplicateId {
                id: entry.id.clone(),
            });
        }
        if entry.term.trim().is_empty() {
            return Err(CatalogError::EmptyTerm {
                id: entry.id.clone(),
            });
        }
    }
    Ok(())
}

/// Thread-safe catalog for multi-threaded hosts. Writers hold the lock for
/// the whole update and rebuild; readers clone the index snapshot and scan
/// without holding it.
pub struct SharedCatalog {
    inner: RwLock<TerminologyCatalog>,
}

impl SharedCatalog {
    pub fn new(catalog: TerminologyCatalog) -> Self {
        Self {
            inner: RwLock::new(catalog),
        }
    }

    pub fn snapshot(&self) -> Arc<TerminologyIndex> {
        self.inner.read().index()
    }

    /// Run a read-only closure against the catalog.
    pub fn read<R>(&self, f: impl FnOnce(&TerminologyCatalog) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn load_database(&self, database: TerminologyDatabase) -> Result<(), CatalogError> {
        self.inner.write().load_database(database)
    }

    pub fn load(&self, entries: Vec<TerminologyEntry>) -> Result<(), CatalogError> {
        self.inner.write().load(entries)
    }

    pub fn add_term(&self, new: NewTerminologyEntry) -> Result<TerminologyEntry, CatalogError> {
        self.inner.write().add_term(new)
    }

    pub fn remove_term(&self, id: &str) -> Result<bool, CatalogError> {
        self.inner.write().remove_term(id)
    }

    pub fn update_term(
        &self,
        id: &str,
        update: TermUpdate,
    ) -> Result<Option<TerminologyEntry>, CatalogError> {
        self.inner.write().update_term(id, update)
    }

    pub fn list_categories(&self) -> Vec<String> {
        self.inner.read().list_categories()
    }

    pub fn search(&self, query: &str) -> Vec<TerminologyEntry> {
        self.inner
            .read()
            .search(query)
            .into_iter()
            .cloned()
            .collect()
    }
}

impl Default for SharedCatalog {
    fn default() -> Self {
        Self::new(TerminologyCatalog::new())
    }
}

/// Current time as Unix timestamp (milliseconds).
fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
