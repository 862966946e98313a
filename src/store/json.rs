//! Flat-file catalog: a JSON array of `{name, alias}` records.
//!
//! The file is re-read on every call. Writes replace it atomically through
//! a sibling temp file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::models::CatalogRecord;

use super::{
    records_with_aliases, records_with_ingredient, unroll_records, IngredientReader,
    IngredientWriter,
};

pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_records(&self) -> Result<Vec<CatalogRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read catalog file: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file: {}", self.path.display()))
    }

    async fn write_records(&self, records: &[CatalogRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write catalog file: {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace catalog file: {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl IngredientReader for JsonCatalogStore {
    async fn unrolled_ingredients(&self) -> Result<Vec<String>> {
        Ok(unroll_records(&self.read_records().await?))
    }

    async fn all_ingredients(&self) -> Result<Vec<CatalogRecord>> {
        self.read_records().await
    }
}

#[async_trait]
impl IngredientWriter for JsonCatalogStore {
    async fn insert_ingredient(&self, name: &str) -> Result<()> {
        let records = records_with_ingredient(self.read_records().await?, name)?;
        self.write_records(&records).await
    }

    async fn append_aliases(&self, name: &str, aliases: &[String]) -> Result<Vec<String>> {
        let (records, added) = records_with_aliases(self.read_records().await?, name, aliases)?;
        self.write_records(&records).await?;
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_catalog(dir: &TempDir, json: &str) -> JsonCatalogStore {
        let path = dir.path().join("ingredients.json");
        std::fs::write(&path, json).unwrap();
        JsonCatalogStore::new(path)
    }

    #[tokio::test]
    async fn test_reads_name_and_normalized_name_records() {
        let tmp = TempDir::new().unwrap();
        let store = write_catalog(
            &tmp,
            r#"[
                {"name": "egg", "alias": []},
                {"name": "all-purpose flour", "alias": ["flour"]},
                {"normalized_name": "saffron", "alias": []}
            ]"#,
        );
        assert_eq!(
            store.unrolled_ingredients().await.unwrap(),
            vec!["egg", "all-purpose flour", "flour", "saffron"]
        );
    }

    #[tokio::test]
    async fn test_missing_alias_field_defaults_to_empty() {
        let tmp = TempDir::new().unwrap();
        let store = write_catalog(&tmp, r#"[{"name": "salt"}]"#);
        let records = store.all_ingredients().await.unwrap();
        assert_eq!(records, vec![CatalogRecord::new("salt", &[])]);
    }

    #[tokio::test]
    async fn test_writes_persist() {
        let tmp = TempDir::new().unwrap();
        let store = write_catalog(&tmp, r#"[{"name": "salt", "alias": []}]"#);
        store.insert_ingredient("black pepper").await.unwrap();
        store
            .append_aliases("black pepper", &["pepper".to_string()])
            .await
            .unwrap();

        let reopened = JsonCatalogStore::new(store.path());
        assert_eq!(
            reopened.unrolled_ingredients().await.unwrap(),
            vec!["salt", "black pepper", "pepper"]
        );
    }

    #[tokio::test]
    async fn test_unreadable_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = JsonCatalogStore::new(tmp.path().join("missing.json"));
        assert!(store.all_ingredients().await.is_err());

        let bad = write_catalog(&tmp, "{not json");
        assert!(bad.all_ingredients().await.is_err());
    }
}
