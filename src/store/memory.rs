//! In-memory store for tests and scratch runs.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Catalog writes go through
//! [`Catalog`](crate::catalog::Catalog) validation, so the same conflicts
//! rejected at load time are rejected here.

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{CatalogRecord, Recipe};

use super::{
    records_with_aliases, records_with_ingredient, unroll_records, IngredientReader,
    IngredientWriter, InsertSummary, RecipeStore,
};

#[derive(Default)]
pub struct InMemoryStore {
    ingredients: RwLock<Vec<CatalogRecord>>,
    recipes: RwLock<Vec<Recipe>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<CatalogRecord>) -> Self {
        Self {
            ingredients: RwLock::new(records),
            recipes: RwLock::new(Vec::new()),
        }
    }

    pub fn with_recipes(mut self, recipes: Vec<Recipe>) -> Self {
        self.recipes = RwLock::new(recipes);
        self
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

#[async_trait]
impl IngredientReader for InMemoryStore {
    async fn unrolled_ingredients(&self) -> Result<Vec<String>> {
        Ok(unroll_records(&read(&self.ingredients)?))
    }

    async fn all_ingredients(&self) -> Result<Vec<CatalogRecord>> {
        Ok(read(&self.ingredients)?.clone())
    }
}

#[async_trait]
impl IngredientWriter for InMemoryStore {
    async fn insert_ingredient(&self, name: &str) -> Result<()> {
        let mut records = write(&self.ingredients)?;
        *records = records_with_ingredient(records.clone(), name)?;
        Ok(())
    }

    async fn append_aliases(&self, name: &str, aliases: &[String]) -> Result<Vec<String>> {
        let mut records = write(&self.ingredients)?;
        let (updated, added) = records_with_aliases(records.clone(), name, aliases)?;
        *records = updated;
        Ok(added)
    }
}

#[async_trait]
impl RecipeStore for InMemoryStore {
    async fn all_recipes(&self) -> Result<Vec<Recipe>> {
        Ok(read(&self.recipes)?.clone())
    }

    async fn insert_recipes(&self, recipes: &[Recipe]) -> Result<InsertSummary> {
        let mut stored = write(&self.recipes)?;
        let mut seen: HashSet<String> = stored.iter().map(|r| r.source_url.clone()).collect();
        let mut summary = InsertSummary::default();
        for recipe in recipes {
            if seen.insert(recipe.source_url.clone()) {
                stored.push(recipe.clone());
                summary.inserted += 1;
            } else {
                summary.duplicates += 1;
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PantryError;
    use std::collections::BTreeSet;

    fn recipe(url: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            name: format!("recipe at {}", url),
            source_url: url.to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    #[tokio::test]
    async fn test_unrolled_keeps_entry_order() {
        let store = InMemoryStore::with_records(vec![
            CatalogRecord::new("egg", &[]),
            CatalogRecord::new("all-purpose flour", &["flour", "ap flour"]),
        ]);
        assert_eq!(
            store.unrolled_ingredients().await.unwrap(),
            vec!["egg", "all-purpose flour", "flour", "ap flour"]
        );
    }

    #[tokio::test]
    async fn test_insert_ingredient_rejects_duplicates() {
        let store = InMemoryStore::with_records(vec![CatalogRecord::new("salt", &["sea salt"])]);
        store.insert_ingredient("Pepper").await.unwrap();

        let err = store.insert_ingredient("sea salt").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<PantryError>(),
            Some(&PantryError::DuplicateIngredient("sea salt".to_string()))
        );

        let names: Vec<String> = store
            .all_ingredients()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["salt", "pepper"]);
    }

    #[tokio::test]
    async fn test_append_aliases() {
        let store = InMemoryStore::with_records(vec![CatalogRecord::new("scallion", &[])]);
        let added = store
            .append_aliases("scallion", &["green onion".to_string(), "scallion".to_string()])
            .await
            .unwrap();
        assert_eq!(added, vec!["green onion"]);
        assert!(store
            .unrolled_ingredients()
            .await
            .unwrap()
            .contains(&"green onion".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_source_urls_are_skipped() {
        let store = InMemoryStore::new();
        let first = store
            .insert_recipes(&[recipe("a", &["egg"]), recipe("b", &["salt"])])
            .await
            .unwrap();
        assert_eq!(first, InsertSummary { inserted: 2, duplicates: 0 });

        let second = store
            .insert_recipes(&[recipe("b", &["pepper"]), recipe("c", &["egg"]), recipe("c", &["egg"])])
            .await
            .unwrap();
        assert_eq!(second, InsertSummary { inserted: 1, duplicates: 2 });

        let urls: Vec<String> = store
            .all_recipes()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.source_url)
            .collect();
        assert_eq!(urls, vec!["a", "b", "c"]);
    }
}
