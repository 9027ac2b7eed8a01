//! Controlled-term labels used when rendering the table

use std::collections::HashMap;

/// Resolves a controlled term uid to its display label
pub trait TermLabelLookup {
    fn label(&self, term_uid: &str) -> Option<String>;

    /// Label, or the uid itself when the term is unknown
    fn label_or_uid(&self, term_uid: &str) -> String {
        self.label(term_uid)
            .unwrap_or_else(|| term_uid.to_string())
    }
}

/// In-memory term labels, typically loaded from the `ct_terms` table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodelistLabels {
    labels: HashMap<String, String>,
}

impl CodelistLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, term_uid: &str, label: &str) -> Self {
        self.insert(term_uid, label);
        self
    }

    pub fn insert(&mut self, term_uid: &str, label: &str) {
        self.labels.insert(term_uid.to_string(), label.to_string());
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(String, String)> for CodelistLabels {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

impl TermLabelLookup for CodelistLabels {
    fn label(&self, term_uid: &str) -> Option<String> {
        self.labels.get(term_uid).cloned()
    }
}
