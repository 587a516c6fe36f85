//! termlens: terminology recognition and diff reconciliation for document
//! assistance. Pure, synchronous, in-memory; hosts feed it a terminology
//! database and text snapshots and render what comes back.

pub mod config;
pub mod diff;
pub mod request;
pub mod terminology;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub use config::EngineConfig;
pub use diff::{
    apply, diff, diff_with, filter_empty, merge, revert, stats, DiffError, DiffOptions,
    DiffSegment, DiffStats, Granularity, SegmentKind,
};
pub use request::{EngineRequest, EngineResponse, RequestError};
pub use terminology::catalog::{SharedCatalog, TerminologyCatalog};
pub use terminology::check::{Severity, TermCheckReport, TermIssue};
pub use terminology::index::TerminologyIndex;
pub use terminology::matcher::scan;
pub use terminology::{
    CatalogError, NewTerminologyEntry, Occurrence, TermUpdate, TerminologyDatabase,
    TerminologyEntry,
};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to the
/// configured `log_filter`. Returns false if a global subscriber already
/// exists.
pub fn init_tracing(config: &EngineConfig) -> bool {
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref(), &config.log_filter);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .is_ok()
}

/// `RUST_LOG` wins when it parses, then the configured filter, then the
/// built-in default.
fn log_filter(rust_log: Option<&str>, configured: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| EnvFilter::new(config::DEFAULT_LOG_FILTER))
}

/// Shared catalog and diff settings behind one handle.
pub struct Engine {
    catalog: SharedCatalog,
    config: EngineConfig,
}

impl Engine {
    pub fn new(catalog: TerminologyCatalog, config: EngineConfig) -> Self {
        info!(
            loaded = catalog.is_loaded(),
            entries = catalog.entries().len(),
            char_threshold = config.diff.char_threshold,
            "engine created"
        );
        Self {
            catalog: SharedCatalog::new(catalog),
            config,
        }
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scan against the current index snapshot. Results are computed per
    /// call and never stored.
    pub fn scan(&self, text: &str) -> Vec<Occurrence> {
        scan(text, &self.catalog.snapshot())
    }

    pub fn check(&self, text: &str) -> TermCheckReport {
        let occurrences = self.scan(text);
        terminology::check::report(text, &occurrences, &self.config.diff)
    }

    pub fn diff(&self, original: &str, modified: &str) -> Vec<DiffSegment> {
        diff_with(original, modified, &self.config.diff)
    }

    pub fn handle(&self, request: EngineRequest) -> Result<EngineResponse, RequestError> {
        debug!(?request, "handling request");
        let response = match request {
            EngineRequest::Scan { text } => EngineResponse::Occurrences {
                occurrences: self.scan(&text),
            },
            EngineRequest::Check { text } => EngineResponse::Check {
                report: self.check(&text),
            },
            EngineRequest::Diff { original, modified } => {
                let segments = self.diff(&original, &modified);
                let stats = stats(&segments);
                EngineResponse::Diff { segments, stats }
            }
            EngineRequest::AddTerm { entry } => EngineResponse::TermAdded {
                entry: self.catalog.add_term(entry)?,
            },
            EngineRequest::RemoveTerm { id } => EngineResponse::TermRemoved {
                removed: self.catalog.remove_term(&id)?,
            },
            EngineRequest::ListCategories => EngineResponse::Categories {
                categories: self.catalog.list_categories(),
            },
            EngineRequest::Search { query } => EngineResponse::Entries {
                entries: self.catalog.search(&query),
            },
        };
        Ok(response)
    }

    /// Parse and handle a JSON request.
    pub fn handle_json(&self, raw: &str) -> Result<EngineResponse, RequestError> {
        self.handle(EngineRequest::from_json(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_filter_applies_without_rust_log() {
        let filter = log_filter(None, "termlens=trace");
        assert!(filter.to_string().contains("termlens=trace"));
    }

    #[test]
    fn rust_log_overrides_configured_filter() {
        let filter = log_filter(Some("termlens=warn"), "termlens=trace");
        assert!(filter.to_string().contains("termlens=warn"));
        assert!(!filter.to_string().contains("trace"));
    }

    #[test]
    fn unparsable_filters_fall_back_to_default() {
        let filter = log_filter(Some("termlens=loud"), "termlens=noisy");
        assert!(filter.to_string().contains("termlens=info"));
    }

    #[test]
    fn init_tracing_installs_once() {
        let config = EngineConfig {
            log_filter: "termlens=debug".into(),
            ..EngineConfig::default()
        };
        init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
