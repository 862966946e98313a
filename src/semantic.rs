//! Semantic fallback matching over an embedding index.
//!
//! [`EmbeddingIndex`] pairs every vocabulary term with its unit-length
//! embedding. It is built once, in one blocking step, and is immutable
//! afterwards; a changed catalog needs a new index.
//!
//! Search is a brute-force cosine scan. Candidates are ordered by a stable
//! sort on descending score, so among equal scores the term inserted first
//! wins.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::debug;

use crate::embedding::{cosine_similarity, embed_query, l2_normalize, Embedder};
use crate::match_log::{MatchEvent, MatchLog, ScoredTerm};

pub struct EmbeddingIndex {
    terms: Vec<String>,
    vectors: Vec<Vec<f32>>,
    dims: usize,
}

impl EmbeddingIndex {
    /// Embed `terms` in one pass and normalize every vector.
    pub fn build(embedder: &dyn Embedder, terms: &[String]) -> Result<Self> {
        if terms.is_empty() {
            return Ok(Self {
                terms: Vec::new(),
                vectors: Vec::new(),
                dims: embedder.dims(),
            });
        }

        let mut vectors = embedder.embed(terms)?;
        if vectors.len() != terms.len() {
            bail!(
                "embedder returned {} vectors for {} terms",
                vectors.len(),
                terms.len()
            );
        }

        let dims = vectors[0].len();
        for (term, vec) in terms.iter().zip(vectors.iter_mut()) {
            if vec.len() != dims {
                bail!(
                    "embedding for '{}' has {} dims, expected {}",
                    term,
                    vec.len(),
                    dims
                );
            }
            l2_normalize(vec);
        }

        debug!(terms = terms.len(), dims, model = embedder.model_name(), "embedding index built");

        Ok(Self {
            terms: terms.to_vec(),
            vectors,
            dims,
        })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The `top_k` most similar terms to a unit-length query vector.
    /// NaN scores are never candidates.
    pub fn nearest(&self, query: &[f32], top_k: usize) -> Vec<ScoredTerm> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .filter(|(_, score)| !score.is_nan())
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(top_k)
            .map(|(i, score)| ScoredTerm {
                term: self.terms[i].clone(),
                score,
            })
            .collect()
    }
}

/// Nearest-term lookup with a confidence threshold.
pub struct SemanticMatcher {
    index: EmbeddingIndex,
    embedder: Arc<dyn Embedder>,
    threshold: f32,
    miss_log: Arc<MatchLog>,
}

impl SemanticMatcher {
    pub fn new(
        index: EmbeddingIndex,
        embedder: Arc<dyn Embedder>,
        threshold: f32,
        miss_log: Arc<MatchLog>,
    ) -> Self {
        Self {
            index,
            embedder,
            threshold,
            miss_log,
        }
    }

    /// Build the index from `terms` with `embedder`, then wrap it.
    pub fn build(
        embedder: Arc<dyn Embedder>,
        terms: &[String],
        threshold: f32,
        miss_log: Arc<MatchLog>,
    ) -> Result<Self> {
        let index = EmbeddingIndex::build(embedder.as_ref(), terms)?;
        Ok(Self::new(index, embedder, threshold, miss_log))
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Best vocabulary term for `query`, if its similarity clears the threshold.
    ///
    /// Below the threshold this returns `Ok(None)` and records the ranked
    /// candidates in the miss log.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Option<ScoredTerm>> {
        let mut query_vec = embed_query(self.embedder.as_ref(), query)?;
        if !self.index.is_empty() && query_vec.len() != self.index.dims() {
            bail!(
                "query embedding has {} dims, index has {}",
                query_vec.len(),
                self.index.dims()
            );
        }
        l2_normalize(&mut query_vec);

        let candidates = self.index.nearest(&query_vec, top_k.max(1));
        match candidates.first() {
            Some(best) if best.score >= self.threshold => Ok(Some(best.clone())),
            _ => {
                debug!(query, threshold = self.threshold, "no semantic match above threshold");
                self.miss_log.record(MatchEvent::Rejected {
                    query: query.to_string(),
                    threshold: self.threshold,
                    candidates,
                });
                Ok(None)
            }
        }
    }
}
