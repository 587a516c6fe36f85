//! Terminology recognition.
//! The catalog owns the term database and rebuilds an immutable index on
//! every mutation; the matcher scans text against an index snapshot.

pub mod catalog;
pub mod check;
pub mod index;
pub mod matcher;

use serde::{Deserialize, Serialize};

/// A known domain term with its aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminologyEntry {
    pub id: String,
    /// Canonical surface form.
    pub term: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
}

impl TerminologyEntry {
    pub fn is_deprecated(&self) -> bool {
        self.deprecated.unwrap_or(false)
    }

    /// Canonical term followed by aliases.
    pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.term.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// An entry before the catalog assigns its id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTerminologyEntry {
    pub term: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub deprecated: Option<bool>,
    #[serde(default)]
    pub preferred_term: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub examples: Option<Vec<String>>,
}

impl NewTerminologyEntry {
    pub fn new(term: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub(crate) fn into_entry(self, id: String) -> TerminologyEntry {
        TerminologyEntry {
            id,
            term: self.term,
            aliases: self.aliases,
            category: self.category,
            definition: self.definition,
            deprecated: self.deprecated,
            preferred_term: self.preferred_term,
            context: self.context,
            examples: self.examples,
        }
    }
}

/// Partial update for an existing entry. `None` leaves a field untouched;
/// the id can never change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermUpdate {
    pub term: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub category: Option<String>,
    pub definition: Option<String>,
    pub deprecated: Option<bool>,
    pub preferred_term: Option<String>,
    pub context: Option<String>,
    pub examples: Option<Vec<String>>,
}

impl TermUpdate {
    pub(crate) fn apply_to(self, entry: &mut TerminologyEntry) {
        if let Some(term) = self.term {
            entry.term = term;
        }
        if let Some(aliases) = self.aliases {
            entry.aliases = aliases;
        }
        if let Some(category) = self.category {
            entry.category = category;
        }
        if let Some(definition) = self.definition {
            entry.definition = definition;
        }
        if self.deprecated.is_some() {
            entry.deprecated = self.deprecated;
        }
        if self.preferred_term.is_some() {
            entry.preferred_term = self.preferred_term;
        }
        if self.context.is_some() {
            entry.context = self.context;
        }
        if self.examples.is_some() {
            entry.examples = self.examples;
        }
    }
}

/// The catalog's persisted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminologyDatabase {
    pub version: String,
    /// Unix epoch milliseconds of the last mutation.
    pub last_updated: i64,
    /// Insertion order is tie-break priority.
    pub entries: Vec<TerminologyEntry>,
}

/// A recognized term in scanned text. Offsets are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    /// Matched text as it appears in the input.
    pub term: String,
    pub position: usize,
    pub length: usize,
    pub entry: TerminologyEntry,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Occurrence {
    pub fn end(&self) -> usize {
        self.position + self.length
    }
}

#[derive(Debug)]
pub enum CatalogError {
    /// Mutation attempted before any database was loaded.
    NotLoaded { operation: &'static str },
    DuplicateId { id: String },
    EmptyTerm { id: String },
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::NotLoaded { .. } => "CATALOG_NOT_LOADED",
            CatalogError::DuplicateId { .. }
            | CatalogError::EmptyTerm { .. }
            | CatalogError::Io(_)
            | CatalogError::Parse(_) => "CATALOG_LOAD_ERROR",
        }
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotLoaded { operation } => {
                write!(f, "terminology catalog not loaded (attempted {operation})")
            }
            CatalogError::DuplicateId { id } => write!(f, "duplicate terminology id: {id}"),
            CatalogError::EmptyTerm { id } => write!(f, "terminology entry {id} has an empty term"),
            CatalogError::Io(e) => write!(f, "terminology IO error: {e}"),
            CatalogError::Parse(e) => write!(f, "terminology parse error: {e}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(e) => Some(e),
            CatalogError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e)
    }
}
