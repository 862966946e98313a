//! Ingredient normalization.
//!
//! Maps free-text ingredient phrases to canonical catalog names:
//!
//! ```text
//! phrase ──lowercase──▶ parser ──▶ (name, foundation)
//!                                   │
//!            ignored term? ◀────────┤ drop silently
//!                                   ▼
//!        exact: phrase, then name, then foundation
//!                                   │ miss
//!                                   ▼
//!        semantic: best of {name, foundation, phrase} ≥ threshold
//!                                   │
//!                                   ▼
//!        resolve hit to canonical ──▶ matched / unmatched
//! ```
//!
//! A phrase that is itself a vocabulary term is taken literally before the
//! parsed name is tried, so canonical names and aliases always match
//! exactly, whatever the parser does with them.

use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::{clean_term, Catalog};
use crate::config::NormalizerConfig;
use crate::embedding::Embedder;
use crate::error::PantryError;
use crate::match_log::{MatchEvent, MatchLog, ScoredTerm};
use crate::models::{CatalogEntry, NormalizedResult, ParsedPhrase};
use crate::parser::PhraseParser;
use crate::semantic::SemanticMatcher;
use crate::vocabulary::UnrolledVocabulary;

/// How a single phrase was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum PhraseOutcome {
    /// The phrase names an ignored ingredient.
    Ignored,
    Exact { canonical: String },
    Semantic { canonical: String, score: f32 },
    Unmatched,
}

impl PhraseOutcome {
    pub fn canonical(&self) -> Option<&str> {
        match self {
            PhraseOutcome::Exact { canonical } | PhraseOutcome::Semantic { canonical, .. } => {
                Some(canonical)
            }
            _ => None,
        }
    }
}

pub struct IngredientNormalizer {
    catalog: Catalog,
    vocabulary: UnrolledVocabulary,
    semantic: SemanticMatcher,
    parser: Arc<dyn PhraseParser>,
    ignored: HashSet<String>,
    top_k: usize,
    audit_log: Arc<MatchLog>,
}

impl IngredientNormalizer {
    pub fn new(
        catalog: Catalog,
        semantic: SemanticMatcher,
        parser: Arc<dyn PhraseParser>,
        config: &NormalizerConfig,
        audit_log: Arc<MatchLog>,
    ) -> Self {
        let vocabulary = UnrolledVocabulary::from_catalog(&catalog);
        Self {
            catalog,
            vocabulary,
            semantic,
            parser,
            ignored: config.ignored.iter().map(|t| clean_term(t)).collect(),
            top_k: config.top_k,
            audit_log,
        }
    }

    /// Derive the vocabulary from `catalog`, embed it, and assemble a
    /// normalizer. This is the blocking startup step.
    pub fn build(
        catalog: Catalog,
        embedder: Arc<dyn Embedder>,
        parser: Arc<dyn PhraseParser>,
        config: &NormalizerConfig,
        audit_log: Arc<MatchLog>,
        miss_log: Arc<MatchLog>,
    ) -> Result<Self> {
        let vocabulary = UnrolledVocabulary::from_catalog(&catalog);
        let semantic = SemanticMatcher::build(
            embedder,
            vocabulary.terms(),
            config.similarity_threshold,
            miss_log,
        )?;
        debug!(
            entries = catalog.len(),
            terms = vocabulary.len(),
            "ingredient normalizer ready"
        );
        Ok(Self::new(catalog, semantic, parser, config, audit_log))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn vocabulary(&self) -> &UnrolledVocabulary {
        &self.vocabulary
    }

    /// Lower-case a phrase and split it into (name, foundation food).
    pub fn trim_phrase(&self, phrase: &str) -> ParsedPhrase {
        let lowered = phrase.to_lowercase();
        let parsed = self.parser.parse(&lowered, true);
        ParsedPhrase {
            name: parsed.name.map(|n| clean_term(&n)).filter(|n| !n.is_empty()),
            foundation_food: parsed
                .foundation_food
                .map(|f| clean_term(&f))
                .filter(|f| !f.is_empty()),
        }
    }

    /// Normalize a batch. Phrases that cannot be resolved land in
    /// `unmatched`; only integrity and embedding failures abort the batch.
    pub fn normalize<I, S>(&self, inputs: I) -> Result<NormalizedResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = NormalizedResult::default();
        for input in inputs {
            let phrase = input.as_ref();
            match self.normalize_phrase(phrase)? {
                PhraseOutcome::Ignored => {}
                PhraseOutcome::Unmatched => result.unmatched.push(phrase.to_string()),
                PhraseOutcome::Exact { canonical } | PhraseOutcome::Semantic { canonical, .. } => {
                    result.matched.push(canonical)
                }
            }
        }
        Ok(result)
    }

    /// Resolve one phrase.
    pub fn normalize_phrase(&self, phrase: &str) -> Result<PhraseOutcome> {
        let literal = clean_term(phrase);
        let parsed = self.trim_phrase(phrase);

        if self.is_ignored(&parsed) {
            debug!(phrase, "ignored ingredient");
            return Ok(PhraseOutcome::Ignored);
        }

        let exact_candidates = [
            Some(literal.as_str()),
            parsed.name.as_deref(),
            parsed.foundation_food.as_deref(),
        ];
        for candidate in exact_candidates.into_iter().flatten() {
            if let Some(hit) = self.vocabulary.exact_match(candidate) {
                let canonical = self.catalog.resolve_canonical(hit)?.to_string();
                debug!(phrase, hit, canonical = %canonical, "exact match");
                return Ok(PhraseOutcome::Exact { canonical });
            }
        }

        match self.best_semantic(&parsed, &literal)? {
            Some(best) => {
                let canonical = self.catalog.resolve_canonical(&best.term)?.to_string();
                debug!(phrase, term = %best.term, score = best.score, "semantic match");
                self.audit_log.record(MatchEvent::Accepted {
                    phrase: phrase.to_string(),
                    canonical_name: canonical.clone(),
                    score: best.score,
                });
                Ok(PhraseOutcome::Semantic {
                    canonical,
                    score: best.score,
                })
            }
            None => {
                debug!(phrase, "unmatched");
                Ok(PhraseOutcome::Unmatched)
            }
        }
    }

    fn is_ignored(&self, parsed: &ParsedPhrase) -> bool {
        [parsed.name.as_deref(), parsed.foundation_food.as_deref()]
            .into_iter()
            .flatten()
            .any(|term| self.ignored.contains(term))
    }

    /// Highest-scoring semantic hit over every distinct candidate string.
    fn best_semantic(&self, parsed: &ParsedPhrase, literal: &str) -> Result<Option<ScoredTerm>> {
        let mut seen: Vec<&str> = Vec::with_capacity(3);
        let mut best: Option<ScoredTerm> = None;

        let candidates = [
            parsed.name.as_deref(),
            parsed.foundation_food.as_deref(),
            Some(literal),
        ];
        for candidate in candidates.into_iter().flatten() {
            if candidate.is_empty() || seen.contains(&candidate) {
                continue;
            }
            seen.push(candidate);

            if let Some(hit) = self.semantic.search(candidate, self.top_k)? {
                if best.as_ref().map_or(true, |b| hit.score > b.score) {
                    best = Some(hit);
                }
            }
        }

        Ok(best)
    }

    /// Add a canonical ingredient and rebuild the vocabulary.
    ///
    /// The embedding index is not rebuilt: the new name matches exactly
    /// at once, and semantically only after the next startup.
    pub fn add_ingredient(&mut self, name: &str) -> Result<CatalogEntry, PantryError> {
        let entry = self.catalog.add_ingredient(name)?.clone();
        self.vocabulary = UnrolledVocabulary::from_catalog(&self.catalog);
        Ok(entry)
    }

    /// Attach aliases to an existing entry and rebuild the vocabulary.
    pub fn append_aliases(
        &mut self,
        name: &str,
        aliases: &[String],
    ) -> Result<Vec<String>, PantryError> {
        let added = self.catalog.append_aliases(name, aliases)?;
        self.vocabulary = UnrolledVocabulary::from_catalog(&self.catalog);
        Ok(added)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::embedding::HashedEmbedder;
    use crate::models::CatalogRecord;
    use crate::parser::HeuristicParser;
    use crate::semantic::tests::TableEmbedder;
    use crate::semantic::EmbeddingIndex;

    fn catalog() -> Catalog {
        Catalog::from_records(vec![
            CatalogRecord::new("egg", &[]),
            CatalogRecord::new("all-purpose flour", &["flour"]),
            CatalogRecord::new("brown sugar", &["light brown sugar"]),
            CatalogRecord::new("olive oil", &["extra virgin olive oil"]),
            CatalogRecord::new("salt", &[]),
        ])
        .unwrap()
    }

    fn hashed_normalizer() -> IngredientNormalizer {
        IngredientNormalizer::build(
            catalog(),
            Arc::new(HashedEmbedder::new(256)),
            Arc::new(HeuristicParser),
            &NormalizerConfig::default(),
            Arc::new(MatchLog::disabled()),
            Arc::new(MatchLog::disabled()),
        )
        .unwrap()
    }

    /// Parser that returns canned answers keyed by the lowered phrase.
    struct CannedParser(Vec<(&'static str, Option<&'static str>, Option<&'static str>)>);

    impl PhraseParser for CannedParser {
        fn parse(&self, phrase: &str, _foundation_foods: bool) -> ParsedPhrase {
            self.0
                .iter()
                .find(|(p, _, _)| *p == phrase)
                .map(|(_, n, f)| ParsedPhrase {
                    name: n.map(str::to_string),
                    foundation_food: f.map(str::to_string),
                })
                .unwrap_or_default()
        }
    }

    #[test]
    fn test_scenario_eggs_and_flour() {
        let n = IngredientNormalizer::build(
            Catalog::from_records(vec![
                CatalogRecord::new("egg", &[]),
                CatalogRecord::new("all-purpose flour", &["flour"]),
            ])
            .unwrap(),
            Arc::new(HashedEmbedder::new(64)),
            Arc::new(CannedParser(vec![
                ("2 eggs", Some("egg"), None),
                ("1 cup flour", Some("flour"), None),
            ])),
            &NormalizerConfig::default(),
            Arc::new(MatchLog::disabled()),
            Arc::new(MatchLog::disabled()),
        )
        .unwrap();

        let result = n.normalize(["2 eggs", "1 cup flour"]).unwrap();
        assert_eq!(result.matched, vec!["egg", "all-purpose flour"]);
        assert!(result.unmatched.is_empty());
    }

    #[test]
    fn test_canonical_names_and_aliases_self_match() {
        let n = hashed_normalizer();
        for entry in n.catalog().entries() {
            let result = n.normalize([entry.canonical_name.as_str()]).unwrap();
            assert_eq!(result.matched, vec![entry.canonical_name.clone()]);
            assert!(result.unmatched.is_empty());

            for alias in &entry.aliases {
                let result = n.normalize([alias.as_str()]).unwrap();
                assert_eq!(result.matched, vec![entry.canonical_name.clone()]);
            }
        }
    }

    #[test]
    fn test_ignored_terms_vanish() {
        let n = hashed_normalizer();
        let result = n.normalize(["2 cups water", "Water"]).unwrap();
        assert!(result.matched.is_empty());
        assert!(result.unmatched.is_empty());
    }

    #[test]
    fn test_core_name_wins_over_foundation() {
        let n = hashed_normalizer();
        // name "light brown sugar" is an alias; foundation "brown sugar" is a name
        let outcome = n.normalize_phrase("1 cup Light Brown Sugar").unwrap();
        assert_eq!(
            outcome,
            PhraseOutcome::Exact {
                canonical: "brown sugar".to_string()
            }
        );

        // name "packed light brown sugar" misses; foundation "brown sugar" hits
        let outcome = n.normalize_phrase("2 tablespoons packed light brown sugar").unwrap();
        assert_eq!(outcome.canonical(), Some("brown sugar"));
    }

    #[test]
    fn test_idempotent_on_matched_output() {
        let n = hashed_normalizer();
        let first = n
            .normalize(["2 large eggs", "1 cup flour", "salt to taste"])
            .unwrap();
        assert_eq!(first.matched, vec!["egg", "all-purpose flour", "salt"]);

        let second = n.normalize(&first.matched).unwrap();
        assert_eq!(second.matched, first.matched);
        assert!(second.unmatched.is_empty());
    }

    #[test]
    fn test_repeated_ingredients_are_kept_in_order() {
        let n = hashed_normalizer();
        let result = n.normalize(["2 eggs", "1 cup flour", "egg"]).unwrap();
        assert_eq!(result.matched, vec!["egg", "all-purpose flour", "egg"]);
    }

    #[test]
    fn test_empty_input() {
        let n = hashed_normalizer();
        let result = n.normalize(Vec::<String>::new()).unwrap();
        assert_eq!(result, NormalizedResult::default());
    }

    fn table_normalizer(audit: Arc<MatchLog>) -> IngredientNormalizer {
        let embedder = TableEmbedder::new(
            &[
                ("olive oil", vec![1.0, 0.0, 0.0]),
                ("salt", vec![0.0, 1.0, 0.0]),
                ("evoo", vec![0.95, 0.05, 0.0]),
            ],
            vec![0.0, 0.0, 1.0],
        );
        let catalog = Catalog::from_records(vec![
            CatalogRecord::new("olive oil", &[]),
            CatalogRecord::new("salt", &[]),
        ])
        .unwrap();
        IngredientNormalizer::build(
            catalog,
            Arc::new(embedder),
            Arc::new(HeuristicParser),
            &NormalizerConfig::default(),
            audit,
            Arc::new(MatchLog::disabled()),
        )
        .unwrap()
    }

    #[test]
    fn test_semantic_fallback_and_audit_log() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("audit.jsonl");
        let n = table_normalizer(Arc::new(MatchLog::open(&path).unwrap()));

        let result = n.normalize(["2 tbsp evoo", "1 dragonfruit"]).unwrap();
        assert_eq!(result.matched, vec!["olive oil"]);
        assert_eq!(result.unmatched, vec!["1 dragonfruit"]);
        drop(n);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["phrase"], "2 tbsp evoo");
        assert_eq!(record["canonical_name"], "olive oil");
    }

    #[test]
    fn test_semantic_alias_hit_resolves_to_canonical() {
        let embedder = TableEmbedder::new(
            &[
                ("all-purpose flour", vec![0.0, 1.0]),
                ("flour", vec![1.0, 0.0]),
                ("flor", vec![0.99, 0.1]),
            ],
            vec![0.7, -0.7],
        );
        let n = IngredientNormalizer::build(
            Catalog::from_records(vec![CatalogRecord::new("all-purpose flour", &["flour"])])
                .unwrap(),
            Arc::new(embedder),
            Arc::new(HeuristicParser),
            &NormalizerConfig::default(),
            Arc::new(MatchLog::disabled()),
            Arc::new(MatchLog::disabled()),
        )
        .unwrap();

        let outcome = n.normalize_phrase("flor").unwrap();
        assert_eq!(outcome.canonical(), Some("all-purpose flour"));
        assert!(matches!(outcome, PhraseOutcome::Semantic { .. }));
    }

    /// Normalizer over the test catalog whose vocabulary was derived from a
    /// catalog holding only `saffron`.
    pub(crate) fn desynchronized_normalizer() -> IngredientNormalizer {
        let embedder: Arc<dyn Embedder> = Arc::new(HashedEmbedder::new(32));
        let index = EmbeddingIndex::build(embedder.as_ref(), &[]).unwrap();
        let semantic =
            SemanticMatcher::new(index, embedder, 0.75, Arc::new(MatchLog::disabled()));
        let mut n = IngredientNormalizer::new(
            catalog(),
            semantic,
            Arc::new(HeuristicParser),
            &NormalizerConfig::default(),
            Arc::new(MatchLog::disabled()),
        );
        let other =
            Catalog::from_records(vec![CatalogRecord::new("saffron", &[])]).unwrap();
        n.vocabulary = UnrolledVocabulary::from_catalog(&other);
        n
    }

    #[test]
    fn test_desynchronized_vocabulary_is_fatal() {
        let n = desynchronized_normalizer();
        let err = n.normalize(["egg", "saffron"]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PantryError>(),
            Some(&PantryError::Integrity {
                term: "saffron".to_string()
            })
        );
    }

    #[test]
    fn test_add_ingredient_matches_exactly_at_once() {
        let mut n = hashed_normalizer();
        n.add_ingredient("Fig Jam").unwrap();
        let result = n.normalize(["2 tbsp fig jam"]).unwrap();
        assert_eq!(result.matched, vec!["fig jam"]);

        n.append_aliases("fig jam", &["fig preserves".to_string()])
            .unwrap();
        let result = n.normalize(["fig preserves"]).unwrap();
        assert_eq!(result.matched, vec!["fig jam"]);
    }
}
