//! Text diff reconciliation.
//! Picks a granularity (char / word / line) per call, aligns the units with
//! `similar`'s LCS algorithm, and emits merged segments that replay to
//! either endpoint: non-delete values give the modified text, non-insert
//! values give the original.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};
use tracing::debug;

/// Segment type. Serialized verbatim as `equal` / `insert` / `delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Equal,
    Insert,
    Delete,
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentKind::Equal => write!(f, "equal"),
            SegmentKind::Insert => write!(f, "insert"),
            SegmentKind::Delete => write!(f, "delete"),
        }
    }
}

/// One run of text in a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub value: String,
}

impl DiffSegment {
    pub fn new(kind: SegmentKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn equal(value: impl Into<String>) -> Self {
        Self::new(SegmentKind::Equal, value)
    }

    pub fn insert(value: impl Into<String>) -> Self {
        Self::new(SegmentKind::Insert, value)
    }

    pub fn delete(value: impl Into<String>) -> Self {
        Self::new(SegmentKind::Delete, value)
    }
}

/// Character totals per segment type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    pub insertions: usize,
    pub deletions: usize,
    pub unchanged: usize,
    pub total_changes: usize,
}

/// Unit the alignment runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Char,
    Word,
    Line,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Char => write!(f, "char"),
            Granularity::Word => write!(f, "word"),
            Granularity::Line => write!(f, "line"),
        }
    }
}

/// Diff tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Both inputs shorter than this (in chars) → character-level diff.
    pub char_threshold: usize,
    /// Force a granularity instead of auto-selecting.
    pub granularity: Option<Granularity>,
    /// Alignment time budget. Past it the remaining changed region is
    /// emitted as one delete plus one insert.
    pub timeout: Option<Duration>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            char_threshold: 100,
            granularity: None,
            timeout: Some(Duration::from_secs(1)),
        }
    }
}

#[derive(Debug)]
pub enum DiffError {
    /// A diff input was missing or not a string at the request boundary.
    InvalidInput { field: &'static str, found: String },
}

impl DiffError {
    pub fn code(&self) -> &'static str {
        match self {
            DiffError::InvalidInput { .. } => "DIFF_INPUT_INVALID",
        }
    }
}

impl std::fmt::Display for DiffError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffError::InvalidInput { field, found } => {
                write!(f, "diff input `{field}` must be a string, found {found}")
            }
        }
    }
}

impl std::error::Error for DiffError {}

/// Choose the unit for a pair of texts. Applied once per call.
pub fn select_granularity(original: &str, modified: &str, options: &DiffOptions) -> Granularity {
    if let Some(forced) = options.granularity {
        return forced;
    }
    let threshold = options.char_threshold;
    if original.chars().count() < threshold && modified.chars().count() < threshold {
        Granularity::Char
    } else if original.contains('\n') || modified.contains('\n') {
        Granularity::Line
    } else {
        Granularity::Word
    }
}

/// Diff with default options.
pub fn diff(original: &str, modified: &str) -> Vec<DiffSegment> {
    diff_with(original, modified, &DiffOptions::default())
}

/// Diff two texts. The result is merged and free of empty segments; within
/// a changed run deletions come before insertions.
pub fn diff_with(original: &str, modified: &str, options: &DiffOptions) -> Vec<DiffSegment> {
    let start = Instant::now();
    let granularity = select_granularity(original, modified, options);

    let mut config = TextDiff::configure();
    config.algorithm(Algorithm::Lcs);
    if let Some(timeout) = options.timeout {
        config.timeout(timeout);
    }
    let text_diff = match granularity {
        Granularity::Char => config.diff_chars(original, modified),
        Granularity::Word => config.diff_words(original, modified),
        Granularity::Line => config.diff_lines(original, modified),
    };

    let raw: Vec<DiffSegment> = text_diff
        .iter_all_changes()
        .map(|change| {
            let kind = match change.tag() {
                ChangeTag::Equal => SegmentKind::Equal,
                ChangeTag::Insert => SegmentKind::Insert,
                ChangeTag::Delete => SegmentKind::Delete,
            };
            DiffSegment::new(kind, change.value())
        })
        .collect();
    let segments = merge(&filter_empty(&raw));

    debug!(
        %granularity,
        old_units = text_diff.old_slices().len(),
        new_units = text_diff.new_slices().len(),
        segments = segments.len(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "diff computed"
    );
    segments
}

/// Coalesce adjacent segments of the same type.
pub fn merge(segments: &[DiffSegment]) -> Vec<DiffSegment> {
    let mut out: Vec<DiffSegment> = Vec::with_capacity(segments.len());
    for seg in segments {
        match out.last_mut() {
            Some(last) if last.kind == seg.kind => last.value.push_str(&seg.value),
            _ => out.push(seg.clone()),
        }
    }
    out
}

/// Drop zero-length segments.
pub fn filter_empty(segments: &[DiffSegment]) -> Vec<DiffSegment> {
    segments
        .iter()
        .filter(|s| !s.value.is_empty())
        .cloned()
        .collect()
}

pub fn stats(segments: &[DiffSegment]) -> DiffStats {
    let mut out = DiffStats::default();
    for seg in segments {
        let len = seg.value.chars().count();
        match seg.kind {
            SegmentKind::Insert => out.insertions += len,
            SegmentKind::Delete => out.deletions += len,
            SegmentKind::Equal => out.unchanged += len,
        }
    }
    out.total_changes = out.insertions + out.deletions;
    out
}

/// Rebuild the modified text.
pub fn apply(segments: &[DiffSegment]) -> String {
    concat_except(segments, SegmentKind::Delete)
}

/// Rebuild the original text.
pub fn revert(segments: &[DiffSegment]) -> String {
    concat_except(segments, SegmentKind::Insert)
}

fn concat_except(segments: &[DiffSegment], skip: SegmentKind) -> String {
    let cap = segments
        .iter()
        .filter(|s| s.kind != skip)
        .map(|s| s.value.len())
        .sum();
    let mut out = String::with_capacity(cap);
    for seg in segments.iter().filter(|s| s.kind != skip) {
        out.push_str(&seg.value);
    }
    out
}
