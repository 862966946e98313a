//! SQLite-backed catalog and recipe store.
//!
//! Tables are created by [`crate::migrate`]. Alias lists and recipe
//! ingredient sets are stored as JSON text columns.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::catalog::clean_term;
use crate::models::{CatalogRecord, Recipe};

use super::{
    records_with_aliases, records_with_ingredient, unroll_records, IngredientReader,
    IngredientWriter, InsertSummary, RecipeStore,
};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Replace the whole catalog, e.g. when seeding from a JSON file.
    pub async fn replace_ingredients(&self, records: &[CatalogRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM ingredients")
            .execute(&mut *tx)
            .await?;
        for record in records {
            sqlx::query("INSERT INTO ingredients (name, aliases_json) VALUES (?, ?)")
                .bind(&record.name)
                .bind(serde_json::to_string(&record.alias)?)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert ingredient '{}'", record.name))?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl IngredientReader for SqliteStore {
    async fn unrolled_ingredients(&self) -> Result<Vec<String>> {
        Ok(unroll_records(&self.all_ingredients().await?))
    }

    async fn all_ingredients(&self) -> Result<Vec<CatalogRecord>> {
        let rows = sqlx::query("SELECT name, aliases_json FROM ingredients ORDER BY position")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let name: String = row.get("name");
                let aliases_json: String = row.get("aliases_json");
                let alias: Vec<String> = serde_json::from_str(&aliases_json)
                    .with_context(|| format!("Corrupt alias list for ingredient '{}'", name))?;
                Ok(CatalogRecord { name, alias })
            })
            .collect()
    }
}

#[async_trait]
impl IngredientWriter for SqliteStore {
    async fn insert_ingredient(&self, name: &str) -> Result<()> {
        records_with_ingredient(self.all_ingredients().await?, name)?;

        sqlx::query("INSERT INTO ingredients (name, aliases_json) VALUES (?, '[]')")
            .bind(clean_term(name))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_aliases(&self, name: &str, aliases: &[String]) -> Result<Vec<String>> {
        let name = clean_term(name);
        let (records, added) =
            records_with_aliases(self.all_ingredients().await?, &name, aliases)?;
        if added.is_empty() {
            return Ok(added);
        }

        if let Some(updated) = records.iter().find(|r| r.name == name) {
            sqlx::query("UPDATE ingredients SET aliases_json = ? WHERE name = ?")
                .bind(serde_json::to_string(&updated.alias)?)
                .bind(&name)
                .execute(&self.pool)
                .await?;
        }
        Ok(added)
    }
}

#[async_trait]
impl RecipeStore for SqliteStore {
    async fn all_recipes(&self) -> Result<Vec<Recipe>> {
        let rows = sqlx::query(
            "SELECT recipe_name, source_url, ingredients_json FROM recipes ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let source_url: String = row.get("source_url");
                let ingredients_json: String = row.get("ingredients_json");
                let ingredients: BTreeSet<String> = serde_json::from_str(&ingredients_json)
                    .with_context(|| format!("Corrupt ingredient set for recipe {}", source_url))?;
                Ok(Recipe {
                    name: row.get("recipe_name"),
                    source_url,
                    ingredients,
                })
            })
            .collect()
    }

    async fn insert_recipes(&self, recipes: &[Recipe]) -> Result<InsertSummary> {
        let now = chrono::Utc::now().timestamp();
        let mut summary = InsertSummary::default();
        let mut tx = self.pool.begin().await?;

        for recipe in recipes {
            let result = sqlx::query(
                r#"
                INSERT INTO recipes (source_url, recipe_name, ingredients_json, created_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(source_url) DO NOTHING
                "#,
            )
            .bind(&recipe.source_url)
            .bind(&recipe.name)
            .bind(serde_json::to_string(&recipe.ingredients)?)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                summary.duplicates += 1;
            } else {
                summary.inserted += 1;
            }
        }

        tx.commit().await?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::error::PantryError;
    use crate::migrate::create_tables;
    use tempfile::TempDir;

    async fn open(tmp: &TempDir) -> SqliteStore {
        let pool = db::connect_path(&tmp.path().join("pantry.sqlite"))
            .await
            .unwrap();
        create_tables(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn recipe(url: &str, name: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            name: name.to_string(),
            source_url: url.to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_catalog_round_trip_keeps_order() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp).await;
        store
            .replace_ingredients(&[
                CatalogRecord::new("egg", &[]),
                CatalogRecord::new("all-purpose flour", &["flour"]),
            ])
            .await
            .unwrap();

        store.insert_ingredient("Salt").await.unwrap();
        let added = store
            .append_aliases("salt", &["sea salt".to_string()])
            .await
            .unwrap();
        assert_eq!(added, vec!["sea salt"]);

        assert_eq!(
            store.unrolled_ingredients().await.unwrap(),
            vec!["egg", "all-purpose flour", "flour", "salt", "sea salt"]
        );
    }

    #[tokio::test]
    async fn test_insert_ingredient_rejects_alias_collision() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp).await;
        store
            .replace_ingredients(&[CatalogRecord::new("all-purpose flour", &["flour"])])
            .await
            .unwrap();

        let err = store.insert_ingredient("flour").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<PantryError>(),
            Some(&PantryError::DuplicateIngredient("flour".to_string()))
        );
    }

    #[tokio::test]
    async fn test_recipes_ignore_duplicate_urls() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp).await;

        let summary = store
            .insert_recipes(&[
                recipe("https://example.com/pancakes", "Pancakes", &["egg", "flour", "milk"]),
                recipe("https://example.com/omelette", "Omelette", &["egg", "salt"]),
                recipe("https://example.com/pancakes", "Pancakes again", &["egg"]),
            ])
            .await
            .unwrap();
        assert_eq!(summary, InsertSummary { inserted: 2, duplicates: 1 });

        let recipes = store.all_recipes().await.unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].name, "Pancakes");
        assert_eq!(
            recipes[0].ingredients.iter().collect::<Vec<_>>(),
            vec!["egg", "flour", "milk"]
        );
        assert_eq!(recipes[1].source_url, "https://example.com/omelette");
    }
}
