//! Immutable lookup snapshot built from the catalog's entry sequence.
//! Every term and alias is registered case-folded; when two entries claim
//! the same surface form the later registration owns it. Surface forms are
//! kept in descending length order (stable on registration order) and each
//! carries a compiled case-insensitive pattern for the matcher.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::TerminologyEntry;

/// A searchable string with its compiled pattern and owning entry.
#[derive(Debug)]
pub struct SurfaceForm {
    pub(crate) form: String,
    pub(crate) char_len: usize,
    pub(crate) owner: usize,
    pub(crate) pattern: Regex,
}

impl SurfaceForm {
    pub fn text(&self) -> &str {
        &self.form
    }
}

#[derive(Debug)]
pub struct TerminologyIndex {
    entries: Vec<TerminologyEntry>,
    lookup: HashMap<String, usize>,
    forms: Vec<SurfaceForm>,
}

impl TerminologyIndex {
    pub fn empty() -> Self {
        Self::build(Vec::new())
    }

    /// Rebuild from scratch. Never updated in place.
    pub fn build(entries: Vec<TerminologyEntry>) -> Self {
        let mut lookup: HashMap<String, usize> = HashMap::new();
        // (folded key, first spelling) in first-registration order.
        let mut registered: Vec<(String, String)> = Vec::new();

        for (idx, entry) in entries.iter().enumerate() {
            for form in entry.surface_forms() {
                if form.trim().is_empty() {
                    continue;
                }
                let folded = form.to_lowercase();
                if lookup.insert(folded.clone(), idx).is_none() {
                    registered.push((folded, form.to_string()));
                }
            }
        }

        let mut forms: Vec<SurfaceForm> = registered
            .into_iter()
            .filter_map(|(folded, form)| {
                let owner = *lookup.get(&folded)?;
                let pattern = match RegexBuilder::new(&regex::escape(&form))
                    .case_insensitive(true)
                    .build()
                {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(%form, error = %e, "surface form pattern rejected");
                        return None;
                    }
                };
                Some(SurfaceForm {
                    char_len: form.chars().count(),
                    form,
                    owner,
                    pattern,
                })
            })
            .collect();
        // sort_by is stable: equal lengths keep registration order
        forms.sort_by(|a, b| b.char_len.cmp(&a.char_len));

        debug!(
            entries = entries.len(),
            forms = forms.len(),
            "terminology index rebuilt"
        );

        Self {
            entries,
            lookup,
            forms,
        }
    }

    /// Case-insensitive lookup by canonical term or alias.
    pub fn lookup(&self, surface: &str) -> Option<&TerminologyEntry> {
        let idx = *self.lookup.get(&surface.to_lowercase())?;
        self.entries.get(idx)
    }

    /// Surface forms in scan order (longest first).
    pub fn forms(&self) -> &[SurfaceForm] {
        &self.forms
    }

    pub fn entries(&self) -> &[TerminologyEntry] {
        &self.entries
    }

    pub(crate) fn entry(&self, idx: usize) -> Option<&TerminologyEntry> {
        self.entries.get(idx)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl Default for TerminologyIndex {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, term: &str, aliases: &[&str]) -> TerminologyEntry {
        TerminologyEntry {
            id: id.into(),
            term: term.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            category: "os".into(),
            definition: String::new(),
            deprecated: None,
            preferred_term: None,
            context: None,
            examples: None,
        }
    }

    #[test]
    fn forms_sorted_longest_first_with_stable_ties() {
        let index = TerminologyIndex::build(vec![
            entry("1", "RPM", &["rpm", "yum"]),
            entry("2", "RPM-based", &["dnf"]),
        ]);
        let forms: Vec<&str> = index.forms().iter().map(SurfaceForm::text).collect();
        assert_eq!(forms, vec!["RPM-based", "RPM", "yum", "dnf"]);
    }

    #[test]
    fn later_registration_wins() {
        let index = TerminologyIndex::build(vec![
            entry("1", "openEuler", &["euler"]),
            entry("2", "Euler", &[]),
        ]);
        assert_eq!(index.lookup("EULER").map(|e| e.id.as_str()), Some("2"));
        assert_eq!(index.lookup("OpenEuler").map(|e| e.id.as_str()), Some("1"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn blank_aliases_are_skipped() {
        let index = TerminologyIndex::build(vec![entry("1", "RPM", &["", "  "])]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn pattern_keeps_first_spelling() {
        // "İ" lowercases to "i̇" (two chars); the pattern must still match
        // the dotted capital as written.
        let index = TerminologyIndex::build(vec![entry("1", "İzmir", &[])]);
        let form = &index.forms()[0];
        assert_eq!(form.text(), "İzmir");
        assert_eq!(form.char_len, 5);
        assert!(form.pattern.is_match("visit İzmir today"));
        assert_eq!(index.lookup("İZMIR").map(|e| e.id.as_str()), Some("1"));
    }
}
