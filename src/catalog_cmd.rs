//! `pantry init` and `pantry catalog ...` commands.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::catalog::{find_conflicts, Catalog};
use crate::config::Config;
use crate::models::CatalogRecord;
use crate::store::sqlite::SqliteStore;
use crate::store::{open_stores, IngredientReader, IngredientWriter};
use crate::{db, migrate};

/// Create the database, optionally seeding the SQLite catalog from a
/// JSON file of `{name, alias}` records.
pub async fn run_init(config: &Config, seed: Option<&Path>) -> Result<()> {
    migrate::run_migrations(config).await?;
    println!("Database initialized successfully.");

    if let Some(path) = seed {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        let records: Vec<CatalogRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?;
        let catalog = Catalog::from_records(records)?;

        let sqlite = SqliteStore::new(db::connect(config).await?);
        sqlite.replace_ingredients(&catalog.to_records()).await?;
        println!("Seeded {} ingredients from {}", catalog.len(), path.display());
    }
    Ok(())
}

pub async fn run_catalog_list(config: &Config) -> Result<()> {
    let (store, _) = open_stores(config).await?;
    let records = store.all_ingredients().await?;
    if records.is_empty() {
        println!("Catalog is empty.");
        return Ok(());
    }

    for record in &records {
        if record.alias.is_empty() {
            println!("{}", record.name);
        } else {
            println!("{}  (aliases: {})", record.name, record.alias.join(", "));
        }
    }
    println!();
    println!("{} ingredients", records.len());
    Ok(())
}

/// Report duplicate names and overlapping aliases. Fails when any exist.
pub async fn run_catalog_check(config: &Config) -> Result<()> {
    let (store, _) = open_stores(config).await?;
    let records = store.all_ingredients().await?;
    let conflicts = find_conflicts(&records);

    if conflicts.is_empty() {
        println!("catalog check");
        println!("  ingredients: {}", records.len());
        println!("  no conflicts");
        return Ok(());
    }

    println!("catalog check");
    println!("  ingredients: {}", records.len());
    println!("  conflicts:   {}", conflicts.len());
    for conflict in &conflicts {
        println!("    {}", conflict);
    }
    bail!("catalog has {} conflicts", conflicts.len());
}

pub async fn run_catalog_add(config: &Config, name: &str) -> Result<()> {
    let (store, _) = open_stores(config).await?;
    store.insert_ingredient(name).await?;
    println!("Added ingredient: {}", name.trim().to_lowercase());
    Ok(())
}

pub async fn run_catalog_alias(config: &Config, name: &str, aliases: &[String]) -> Result<()> {
    let (store, _) = open_stores(config).await?;
    let added = store.append_aliases(name, aliases).await?;
    if added.is_empty() {
        println!("No new aliases for {}", name);
    } else {
        println!("Added aliases to {}: {}", name, added.join(", "));
    }
    Ok(())
}
