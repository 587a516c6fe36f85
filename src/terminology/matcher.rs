//! Longest-match terminology scanning.
//!
//! Every surface form is searched independently (longest forms first), all
//! word-bounded hits are pooled and stably sorted by start offset, then a
//! single greedy pass keeps a hit only if it starts at or after the end of
//! the last kept hit. Only the last kept interval is consulted; this is the
//! established output shape and is kept as-is.

use std::time::Instant;

use regex::Regex;
use tracing::debug;

use super::index::TerminologyIndex;
use super::Occurrence;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    owner: usize,
}

/// Scan `text` for known terms. Returns non-overlapping occurrences ordered
/// by position.
pub fn scan(text: &str, index: &TerminologyIndex) -> Vec<Occurrence> {
    let started = Instant::now();

    let mut candidates = Vec::new();
    for form in index.forms() {
        for (start, end) in find_bounded(&form.pattern, text) {
            candidates.push(Candidate {
                start,
                end,
                owner: form.owner,
            });
        }
    }
    // Stable: co-located hits keep longest-form-first order.
    candidates.sort_by_key(|c| c.start);

    let mut kept: Vec<Candidate> = Vec::new();
    for cand in candidates {
        match kept.last() {
            Some(last) if cand.start < last.end => {}
            _ => kept.push(cand),
        }
    }

    let occurrences: Vec<Occurrence> = kept
        .into_iter()
        .filter_map(|c| {
            let entry = index.entry(c.owner)?;
            let matched = &text[c.start..c.end];
            let is_correct = matched == entry.term;
            Some(Occurrence {
                term: matched.to_string(),
                position: c.start,
                length: c.end - c.start,
                entry: entry.clone(),
                is_correct,
                suggestion: (!is_correct).then(|| entry.term.clone()),
            })
        })
        .collect();

    debug!(
        text_len = text.len(),
        forms = index.len(),
        occurrences = occurrences.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "terminology scan"
    );
    occurrences
}

/// All matches of `pattern` in `text` whose edges are not adjacent to an
/// alphanumeric character. A rejected hit resumes the search one char later.
fn find_bounded(pattern: &Regex, text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut at = 0;
    while at < text.len() {
        let Some(m) = pattern.find_at(text, at) else {
            break;
        };
        if m.start() == m.end() {
            break;
        }
        if is_word_bounded(text, m.start(), m.end()) {
            out.push((m.start(), m.end()));
            at = m.end();
        } else {
            at = text[m.start()..]
                .chars()
                .next()
                .map_or(text.len(), |c| m.start() + c.len_utf8());
        }
    }
    out
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}
