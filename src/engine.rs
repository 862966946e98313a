//! The constructed matching context.
//!
//! A [`RecipeEngine`] owns one catalog, one vocabulary, one embedding index
//! and the stores they came from. Construction is a single blocking step;
//! afterwards every query is a concurrent read. Several engines can live in
//! one process, each over its own catalog.
//!
//! Normalization is CPU-bound (and blocking for remote embedders), so the
//! async entry points hand it to tokio's blocking pool. The normalizer sits
//! behind a `tokio::sync::RwLock`: readers on the blocking pool take it with
//! `blocking_read`, catalog edits wait for it with `write().await` without
//! parking a runtime worker.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::embedding::{create_embedder, Embedder};
use crate::match_log::MatchLog;
use crate::models::{CatalogEntry, NormalizedResult, RankedMatch};
use crate::normalizer::IngredientNormalizer;
use crate::parser::{HeuristicParser, PhraseParser};
use crate::ranker;
use crate::store::{load_catalog, open_stores, IngredientWriter, RecipeStore};

pub struct RecipeEngine {
    normalizer: RwLock<IngredientNormalizer>,
    catalog_store: Arc<dyn IngredientWriter>,
    recipe_store: Arc<dyn RecipeStore>,
    max_unknown_per_recipe: usize,
}

impl RecipeEngine {
    pub fn new(
        normalizer: IngredientNormalizer,
        catalog_store: Arc<dyn IngredientWriter>,
        recipe_store: Arc<dyn RecipeStore>,
        max_unknown_per_recipe: usize,
    ) -> Self {
        Self {
            normalizer: RwLock::new(normalizer),
            catalog_store,
            recipe_store,
            max_unknown_per_recipe,
        }
    }

    /// Open the configured stores and build the engine.
    ///
    /// The catalog comes from `[catalog].json_path` when set, otherwise
    /// from the SQLite database; recipes always live in SQLite.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let (catalog_store, sqlite) = open_stores(config).await?;
        Self::build(config, catalog_store, sqlite).await
    }

    /// Load the catalog from `catalog_store`, create the configured
    /// embedder, and embed the vocabulary.
    pub async fn build(
        config: &Config,
        catalog_store: Arc<dyn IngredientWriter>,
        recipe_store: Arc<dyn RecipeStore>,
    ) -> Result<Self> {
        let embedding = config.embedding.clone();
        let embedder = tokio::task::spawn_blocking(move || create_embedder(&embedding))
            .await
            .context("embedder construction panicked")??;

        Self::build_with_embedder(config, catalog_store, recipe_store, Arc::from(embedder)).await
    }

    /// Like [`RecipeEngine::build`] with a caller-supplied embedder.
    pub async fn build_with_embedder(
        config: &Config,
        catalog_store: Arc<dyn IngredientWriter>,
        recipe_store: Arc<dyn RecipeStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let catalog = load_catalog(catalog_store.as_ref())
            .await
            .context("Failed to load ingredient catalog")?;

        let audit_log = Arc::new(MatchLog::open_optional(config.logs.audit_path.as_deref())?);
        let miss_log = Arc::new(MatchLog::open_optional(config.logs.miss_path.as_deref())?);
        let parser: Arc<dyn PhraseParser> = Arc::new(HeuristicParser::new());
        let normalizer_config = config.normalizer.clone();

        let entries = catalog.len();
        let model = embedder.model_name().to_string();
        let normalizer = tokio::task::spawn_blocking(move || {
            IngredientNormalizer::build(
                catalog,
                embedder,
                parser,
                &normalizer_config,
                audit_log,
                miss_log,
            )
        })
        .await
        .context("embedding index construction panicked")??;

        info!(
            entries,
            terms = normalizer.vocabulary().len(),
            model = %model,
            "recipe engine ready"
        );

        Ok(Self::new(
            normalizer,
            catalog_store,
            recipe_store,
            config.normalizer.max_unknown_per_recipe,
        ))
    }

    pub fn catalog_store(&self) -> &Arc<dyn IngredientWriter> {
        &self.catalog_store
    }

    pub fn recipe_store(&self) -> &Arc<dyn RecipeStore> {
        &self.recipe_store
    }

    pub fn max_unknown_per_recipe(&self) -> usize {
        self.max_unknown_per_recipe
    }

    /// Run `f` against the current normalizer.
    ///
    /// Blocks until no catalog edit is in progress. Call it from the blocking
    /// pool or a plain thread, never from async code.
    pub fn with_normalizer<T>(
        &self,
        f: impl FnOnce(&IngredientNormalizer) -> Result<T>,
    ) -> Result<T> {
        let normalizer = self.normalizer.blocking_read();
        f(&normalizer)
    }

    /// Number of vocabulary terms currently matchable.
    pub async fn vocabulary_len(&self) -> usize {
        self.normalizer.read().await.vocabulary().len()
    }

    /// Normalize on the calling thread. Same restriction as
    /// [`RecipeEngine::with_normalizer`].
    pub fn normalize_blocking(&self, phrases: &[String]) -> Result<NormalizedResult> {
        self.with_normalizer(|n| n.normalize(phrases))
    }

    /// Normalize on tokio's blocking pool.
    pub async fn normalize(self: &Arc<Self>, phrases: Vec<String>) -> Result<NormalizedResult> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.normalize_blocking(&phrases))
            .await
            .context("normalization task panicked")?
    }

    /// Normalize raw phrases, then return the closest stored recipe.
    pub async fn find_recipe(
        self: &Arc<Self>,
        phrases: Vec<String>,
        max_missing: usize,
    ) -> Result<Option<RankedMatch>> {
        let normalized = self.normalize(phrases).await?;
        ranker::find_best_match(self.recipe_store.as_ref(), &normalized.matched, max_missing)
            .await
    }

    /// Persist a new canonical ingredient, then make it matchable.
    pub async fn add_ingredient(&self, name: &str) -> Result<CatalogEntry> {
        self.catalog_store.insert_ingredient(name).await?;
        let mut normalizer = self.normalizer.write().await;
        let entry = normalizer.add_ingredient(name)?;
        info!(name = %entry.canonical_name, "ingredient added");
        Ok(entry)
    }

    /// Persist new aliases for an ingredient, then make them matchable.
    pub async fn append_aliases(&self, name: &str, aliases: &[String]) -> Result<Vec<String>> {
        let added = self.catalog_store.append_aliases(name, aliases).await?;
        let mut normalizer = self.normalizer.write().await;
        normalizer.append_aliases(name, &added)?;
        Ok(added)
    }
}
