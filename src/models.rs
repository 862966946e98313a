//! Core data types shared by the catalog, normalizer, and ranker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A catalog record as stored by a catalog source.
///
/// Flat files use `name`; records written by the add-ingredient
/// operation use `normalized_name`. Both deserialize into `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(alias = "normalized_name")]
    pub name: String,
    #[serde(default)]
    pub alias: Vec<String>,
}

impl CatalogRecord {
    pub fn new(name: impl Into<String>, alias: &[&str]) -> Self {
        Self {
            name: name.into(),
            alias: alias.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// One canonical ingredient and the alternate strings that refer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub canonical_name: String,
    pub aliases: BTreeSet<String>,
}

/// Output of the external phrase parser. Either field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPhrase {
    pub name: Option<String>,
    pub foundation_food: Option<String>,
}

/// Result of normalizing a batch of phrases.
///
/// `matched` holds canonical names in input order; `unmatched` holds the
/// original input strings that could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub matched: Vec<String>,
    pub unmatched: Vec<String>,
}

/// A stored recipe whose ingredients are canonical names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "recipe_name")]
    pub name: String,
    pub source_url: String,
    pub ingredients: BTreeSet<String>,
}

/// A recipe as delivered by a recipe provider, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecipe {
    pub recipe_name: String,
    pub source_url: String,
    pub ingredients: Vec<String>,
}

/// The closest recipe for a query and what the user is missing for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedMatch {
    pub recipe: Recipe,
    pub missing_ingredients: BTreeSet<String>,
    pub missing_count: usize,
}
