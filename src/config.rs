//! Engine configuration: defaults plus `TERMLENS_*` environment overrides.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::diff::DiffOptions;

pub const DEFAULT_LOG_FILTER: &str = "termlens=info";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub diff: DiffOptions,
    /// Fallback for `init_tracing` when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            diff: DiffOptions::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by environment variables. Bad values are logged
    /// and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup("TERMLENS_LOG") {
            config.log_filter = filter;
        }
        if let Some(v) = parsed::<usize>(&lookup, "TERMLENS_DIFF_CHAR_THRESHOLD") {
            config.diff.char_threshold = v;
        }
        // 0 disables the alignment time budget
        if let Some(ms) = parsed::<u64>(&lookup, "TERMLENS_DIFF_TIMEOUT_MS") {
            config.diff.timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        config
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring invalid config value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = EngineConfig::from_lookup(|_| None);
        assert_eq!(config.diff.char_threshold, 100);
        assert_eq!(config.diff.timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("TERMLENS_DIFF_CHAR_THRESHOLD", " 40 "),
            ("TERMLENS_DIFF_TIMEOUT_MS", "250"),
            ("TERMLENS_LOG", "termlens=debug"),
        ]));
        assert_eq!(config.diff.char_threshold, 40);
        assert_eq!(config.diff.timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.log_filter, "termlens=debug");

        let config = EngineConfig::from_lookup(lookup_from(&[
            ("TERMLENS_DIFF_CHAR_THRESHOLD", "lots"),
            ("TERMLENS_DIFF_TIMEOUT_MS", "0"),
        ]));
        assert_eq!(config.diff.char_threshold, 100);
        assert_eq!(config.diff.timeout, None);
    }
}
