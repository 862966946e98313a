//! Unrolled vocabulary and exact matching.
//!
//! The vocabulary is the flattened set of every canonical name and alias in
//! a [`Catalog`]. It keeps catalog order alongside the lookup set so the
//! embedding index can be built from the same terms in a stable order.

use std::collections::HashSet;

use crate::catalog::Catalog;

#[derive(Debug, Clone, Default)]
pub struct UnrolledVocabulary {
    ordered: Vec<String>,
    lookup: HashSet<String>,
}

impl UnrolledVocabulary {
    /// Derive the vocabulary from a catalog. Rebuild after every catalog change.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let ordered = catalog.unrolled();
        let lookup = ordered.iter().cloned().collect();
        Self { ordered, lookup }
    }

    /// Literal lookup. Returns the vocabulary's own copy of the term.
    pub fn exact_match(&self, candidate: &str) -> Option<&str> {
        self.lookup.get(candidate).map(String::as_str)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.lookup.contains(term)
    }

    /// Terms in catalog order: each canonical name followed by its aliases.
    pub fn terms(&self) -> &[String] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogRecord;

    #[test]
    fn test_exact_match_names_and_aliases() {
        let catalog = Catalog::from_records(vec![
            CatalogRecord::new("egg", &[]),
            CatalogRecord::new("all-purpose flour", &["flour"]),
        ])
        .unwrap();
        let vocab = UnrolledVocabulary::from_catalog(&catalog);

        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.exact_match("flour"), Some("flour"));
        assert_eq!(vocab.exact_match("egg"), Some("egg"));
        assert_eq!(vocab.exact_match("eggs"), None);
        assert_eq!(vocab.exact_match("Flour"), None);
    }

    #[test]
    fn test_empty_catalog() {
        let vocab = UnrolledVocabulary::from_catalog(&Catalog::default());
        assert!(vocab.is_empty());
        assert_eq!(vocab.exact_match(""), None);
    }
}
