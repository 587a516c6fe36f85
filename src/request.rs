//! Typed requests and responses at the host boundary.
//! Free-form JSON from the host is narrowed to one closed variant per
//! command before anything reaches the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::{DiffError, DiffSegment, DiffStats};
use crate::terminology::check::TermCheckReport;
use crate::terminology::{CatalogError, NewTerminologyEntry, Occurrence, TerminologyEntry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum EngineRequest {
    Scan { text: String },
    Check { text: String },
    Diff { original: String, modified: String },
    AddTerm { entry: NewTerminologyEntry },
    RemoveTerm { id: String },
    ListCategories,
    Search { query: String },
}

impl EngineRequest {
    /// Parse a request. Diff inputs that are missing or not strings are
    /// reported as `DIFF_INPUT_INVALID` naming the field.
    pub fn from_json(raw: &str) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_str(raw)?;
        if value.get("command").and_then(Value::as_str) == Some("diff") {
            for field in ["original", "modified"] {
                match value.get(field) {
                    Some(Value::String(_)) => {}
                    other => {
                        return Err(DiffError::InvalidInput {
                            field,
                            found: json_type(other).to_string(),
                        }
                        .into())
                    }
                }
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineResponse {
    Occurrences { occurrences: Vec<Occurrence> },
    Check { report: TermCheckReport },
    Diff { segments: Vec<DiffSegment>, stats: DiffStats },
    TermAdded { entry: TerminologyEntry },
    TermRemoved { removed: bool },
    Categories { categories: Vec<String> },
    Entries { entries: Vec<TerminologyEntry> },
}

#[derive(Debug)]
pub enum RequestError {
    Catalog(CatalogError),
    Diff(DiffError),
    Malformed(serde_json::Error),
}

impl RequestError {
    pub fn code(&self) -> &'static str {
        match self {
            RequestError::Catalog(e) => e.code(),
            RequestError::Diff(e) => e.code(),
            RequestError::Malformed(_) => "REQUEST_MALFORMED",
        }
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Catalog(e) => write!(f, "{e}"),
            RequestError::Diff(e) => write!(f, "{e}"),
            RequestError::Malformed(e) => write!(f, "malformed request: {e}"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Catalog(e) => Some(e),
            RequestError::Diff(e) => Some(e),
            RequestError::Malformed(e) => Some(e),
        }
    }
}

impl From<CatalogError> for RequestError {
    fn from(e: CatalogError) -> Self {
        RequestError::Catalog(e)
    }
}

impl From<DiffError> for RequestError {
    fn from(e: DiffError) -> Self {
        RequestError::Diff(e)
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(e: serde_json::Error) -> Self {
        RequestError::Malformed(e)
    }
}

fn json_type(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}
