//! Storage abstraction for catalogs and recipes.
//!
//! The normalizer and ranker only see these traits, never a storage
//! technology. Three backends implement them:
//!
//! | Backend | Catalog | Recipes |
//! |---------|---------|---------|
//! | [`json::JsonCatalogStore`] | flat JSON file | no |
//! | [`memory::InMemoryStore`] | yes | yes |
//! | [`sqlite::SqliteStore`] | `ingredients` table | `recipes` table |
//!
//! All operations are async (via `async-trait`); in-memory implementations
//! return immediately-ready futures.

pub mod json;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::PantryError;
use crate::models::{CatalogRecord, Recipe};
use crate::{db, migrate};

use json::JsonCatalogStore;
use sqlite::SqliteStore;

/// Read side of a catalog source.
#[async_trait]
pub trait IngredientReader: Send + Sync {
    /// Every canonical name followed by its aliases, entry by entry.
    async fn unrolled_ingredients(&self) -> Result<Vec<String>>;

    /// Every catalog record in source order.
    async fn all_ingredients(&self) -> Result<Vec<CatalogRecord>>;
}

/// Write side of a catalog source.
#[async_trait]
pub trait IngredientWriter: IngredientReader {
    /// Store a new canonical ingredient as `{normalized_name, alias: []}`.
    async fn insert_ingredient(&self, name: &str) -> Result<()>;

    /// Attach aliases to an existing canonical ingredient. Returns the
    /// aliases that were not already present.
    async fn append_aliases(&self, name: &str, aliases: &[String]) -> Result<Vec<String>>;
}

/// Counts reported by a bulk recipe insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: usize,
    /// Recipes skipped because their `source_url` was already stored.
    pub duplicates: usize,
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Every stored recipe, in insertion order.
    async fn all_recipes(&self) -> Result<Vec<Recipe>>;

    /// Insert recipes, skipping any whose `source_url` already exists.
    async fn insert_recipes(&self, recipes: &[Recipe]) -> Result<InsertSummary>;
}

/// Open the configured stores: the catalog source and the SQLite store.
///
/// The catalog is the JSON file at `[catalog].json_path` when set,
/// otherwise the `ingredients` table of the SQLite database.
pub async fn open_stores(config: &Config) -> Result<(Arc<dyn IngredientWriter>, Arc<SqliteStore>)> {
    let pool = db::connect(config).await?;
    migrate::create_tables(&pool).await?;
    let sqlite = Arc::new(SqliteStore::new(pool));

    let catalog: Arc<dyn IngredientWriter> = match &config.catalog.json_path {
        Some(path) => Arc::new(JsonCatalogStore::new(path)),
        None => sqlite.clone(),
    };
    Ok((catalog, sqlite))
}

/// Load and validate a full catalog from any reader.
pub async fn load_catalog<R: IngredientReader + ?Sized>(reader: &R) -> Result<Catalog> {
    let records = reader.all_ingredients().await?;
    Ok(Catalog::from_records(records)?)
}

/// Unroll records the way every reader does: name, then its aliases.
pub(crate) fn unroll_records(records: &[CatalogRecord]) -> Vec<String> {
    let mut terms = Vec::new();
    for record in records {
        terms.push(record.name.clone());
        terms.extend(record.alias.iter().cloned());
    }
    terms
}

/// Records after adding `name`, validated through [`Catalog`].
pub(crate) fn records_with_ingredient(
    records: Vec<CatalogRecord>,
    name: &str,
) -> Result<Vec<CatalogRecord>, PantryError> {
    let mut catalog = Catalog::from_records(records)?;
    catalog.add_ingredient(name)?;
    Ok(catalog.to_records())
}

/// Records after appending `aliases` to `name`, plus the aliases that were new.
pub(crate) fn records_with_aliases(
    records: Vec<CatalogRecord>,
    name: &str,
    aliases: &[String],
) -> Result<(Vec<CatalogRecord>, Vec<String>), PantryError> {
    let mut catalog = Catalog::from_records(records)?;
    let added = catalog.append_aliases(name, aliases)?;
    Ok((catalog.to_records(), added))
}
