//! Bulk recipe import.
//!
//! Reads raw recipes (`[{recipe_name, source_url, ingredients: [...]}]`),
//! normalizes each one, drops those with too many unknown ingredients, and
//! inserts the rest. Recipes whose `source_url` is already stored are
//! skipped, not updated.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::RecipeEngine;
use crate::error::PantryError;
use crate::models::{RawRecipe, Recipe};
use crate::ranker::admit_recipe;
use crate::store::RecipeStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub read: usize,
    pub inserted: usize,
    pub duplicates: usize,
    /// `(source_url, reason)` for every recipe that was not admitted.
    pub rejected: Vec<(String, String)>,
}

pub fn read_raw_recipes(path: &Path) -> Result<Vec<RawRecipe>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read recipe file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse recipe file: {}", path.display()))
}

/// Admit and store a batch of raw recipes.
///
/// Recipes that fail admission are reported in [`ImportReport::rejected`].
/// Any other error, including a vocabulary/catalog integrity violation,
/// aborts the whole batch before anything is stored.
pub async fn import_recipes(engine: &Arc<RecipeEngine>, raws: Vec<RawRecipe>) -> Result<ImportReport> {
    let read = raws.len();
    let max_unknown = engine.max_unknown_per_recipe();

    let worker = Arc::clone(engine);
    let (admitted, rejected) = tokio::task::spawn_blocking(move || {
        worker.with_normalizer(|normalizer| {
            let mut admitted: Vec<Recipe> = Vec::new();
            let mut rejected = Vec::new();
            for raw in raws {
                let url = raw.source_url.clone();
                match admit_recipe(normalizer, raw, max_unknown) {
                    Ok(recipe) => admitted.push(recipe),
                    Err(e) if matches!(
                        e.downcast_ref::<PantryError>(),
                        Some(PantryError::MalformedInput(_))
                    ) =>
                    {
                        warn!(source_url = %url, error = %e, "recipe rejected");
                        rejected.push((url, e.to_string()));
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok((admitted, rejected))
        })
    })
    .await
    .context("recipe admission task panicked")??;

    let summary = engine.recipe_store().insert_recipes(&admitted).await?;
    info!(
        read,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        rejected = rejected.len(),
        "recipe import finished"
    );

    Ok(ImportReport {
        read,
        inserted: summary.inserted,
        duplicates: summary.duplicates,
        rejected,
    })
}

pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let raws = read_raw_recipes(path)?;
    let engine = Arc::new(RecipeEngine::from_config(config).await?);
    let report = import_recipes(&engine, raws).await?;

    println!("import {}", path.display());
    println!("  read:       {}", report.read);
    println!("  inserted:   {}", report.inserted);
    println!("  duplicates: {}", report.duplicates);
    println!("  rejected:   {}", report.rejected.len());
    for (url, reason) in &report.rejected {
        println!("    {} ({})", url, reason);
    }
    Ok(())
}
