//! Terminology check: turns scan results into user-facing issues, a
//! corrected text, and the diff between the two.

use serde::{Deserialize, Serialize};

use super::index::TerminologyIndex;
use super::matcher::scan;
use super::{Occurrence, TerminologyEntry};
use crate::diff::{self, DiffOptions, DiffSegment};

pub const TERMINOLOGY_CATEGORY: &str = "terminology";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One finding. `range` is `[start, end)` in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermIssue {
    pub message: String,
    pub suggestion: String,
    pub range: [usize; 2],
    pub severity: Severity,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermCheckReport {
    pub diffs: Vec<DiffSegment>,
    pub issues: Vec<TermIssue>,
    pub corrected_text: String,
}

/// Scan and report with default diff options.
pub fn check(text: &str, index: &TerminologyIndex) -> TermCheckReport {
    let occurrences = scan(text, index);
    report(text, &occurrences, &DiffOptions::default())
}

/// Build a report from occurrences already produced for `text`.
pub fn report(text: &str, occurrences: &[Occurrence], options: &DiffOptions) -> TermCheckReport {
    let found = issues(occurrences);
    let corrected_text = apply_suggestions(text, &found);
    let diffs = diff::diff_with(text, &corrected_text, options);
    TermCheckReport {
        diffs,
        issues: found,
        corrected_text,
    }
}

/// Deprecated entries are errors (suggesting the preferred term when one is
/// set); other non-canonical spellings are warnings.
pub fn issues(occurrences: &[Occurrence]) -> Vec<TermIssue> {
    occurrences
        .iter()
        .filter_map(|occ| {
            let entry = &occ.entry;
            let range = [occ.position, occ.end()];
            if entry.is_deprecated() {
                let preferred = entry
                    .preferred_term
                    .as_deref()
                    .filter(|p| !p.trim().is_empty());
                let (message, suggestion) = match preferred {
                    Some(p) => (
                        format!("\"{}\" is deprecated; use \"{p}\"", occ.term),
                        p.to_string(),
                    ),
                    None => (
                        format!("\"{}\" is deprecated", occ.term),
                        entry.term.clone(),
                    ),
                };
                return Some(TermIssue {
                    message,
                    suggestion,
                    range,
                    severity: Severity::Error,
                    category: TERMINOLOGY_CATEGORY.to_string(),
                });
            }
            let suggestion = occ.suggestion.clone()?;
            Some(TermIssue {
                message: format!("non-standard term \"{}\"; use \"{suggestion}\"", occ.term),
                suggestion,
                range,
                severity: Severity::Warning,
                category: TERMINOLOGY_CATEGORY.to_string(),
            })
        })
        .collect()
}

/// Replace each issue's range with its suggestion. Ranges must be ascending
/// and disjoint; overlapping or out-of-bounds ranges are skipped.
pub fn apply_suggestions(text: &str, issues: &[TermIssue]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for issue in issues {
        let [start, end] = issue.range;
        if start < last || start > end || !text.is_char_boundary(end) || !text.is_char_boundary(start) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push_str(&issue.suggestion);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

/// Entries found in `text`, each once, in order of first occurrence.
pub fn matched_entries(text: &str, index: &TerminologyIndex) -> Vec<TerminologyEntry> {
    let mut out: Vec<TerminologyEntry> = Vec::new();
    for occ in scan(text, index) {
        if !out.iter().any(|e| e.id == occ.entry.id) {
            out.push(occ.entry);
        }
    }
    out
}
