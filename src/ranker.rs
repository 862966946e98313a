//! Recipe ranking by missing ingredients.
//!
//! For each recipe the missing set is `recipe.ingredients − have`. The
//! recipe with the smallest missing set wins; among equal counts the one
//! stored first wins. A best recipe missing more than the allowed number
//! of ingredients is no match at all.

use anyhow::Result;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::error::PantryError;
use crate::models::{RankedMatch, RawRecipe, Recipe};
use crate::normalizer::IngredientNormalizer;
use crate::store::RecipeStore;

/// The closest recipe to `have`, or `None` when the closest still misses
/// more than `max_missing` ingredients (or there are no recipes).
pub fn rank_recipes<S: AsRef<str>>(
    recipes: &[Recipe],
    have: &[S],
    max_missing: usize,
) -> Option<RankedMatch> {
    let have: HashSet<&str> = have.iter().map(AsRef::as_ref).collect();

    let mut best: Option<(&Recipe, usize)> = None;
    for recipe in recipes {
        let missing_count = recipe
            .ingredients
            .iter()
            .filter(|i| !have.contains(i.as_str()))
            .count();
        if best.map_or(true, |(_, count)| missing_count < count) {
            best = Some((recipe, missing_count));
            if missing_count == 0 {
                break;
            }
        }
    }

    let (recipe, missing_count) = best?;
    if missing_count > max_missing {
        debug!(
            recipe = %recipe.source_url,
            missing_count,
            max_missing,
            "closest recipe exceeds tolerance"
        );
        return None;
    }

    let missing_ingredients: BTreeSet<String> = recipe
        .ingredients
        .iter()
        .filter(|i| !have.contains(i.as_str()))
        .cloned()
        .collect();

    Some(RankedMatch {
        recipe: recipe.clone(),
        missing_ingredients,
        missing_count,
    })
}

/// Rank every recipe in `store` against already-normalized ingredients.
pub async fn find_best_match(
    store: &dyn RecipeStore,
    normalized_ingredients: &[String],
    max_missing: usize,
) -> Result<Option<RankedMatch>> {
    let recipes = store.all_recipes().await?;
    Ok(rank_recipes(&recipes, normalized_ingredients, max_missing))
}

/// Normalize a raw recipe into a storable one.
///
/// The recipe is rejected once `max_unknown` of its ingredients fail to
/// normalize. Accepted recipes keep a sorted, de-duplicated ingredient set.
pub fn admit_recipe(
    normalizer: &IngredientNormalizer,
    raw: RawRecipe,
    max_unknown: usize,
) -> Result<Recipe> {
    if raw.source_url.trim().is_empty() {
        return Err(PantryError::MalformedInput(format!(
            "recipe '{}' has no source_url",
            raw.recipe_name
        ))
        .into());
    }

    let normalized = normalizer.normalize(&raw.ingredients)?;
    if normalized.unmatched.len() >= max_unknown {
        return Err(PantryError::MalformedInput(format!(
            "recipe {} has {} unknown ingredients: {}",
            raw.source_url,
            normalized.unmatched.len(),
            normalized.unmatched.join(", ")
        ))
        .into());
    }

    Ok(Recipe {
        name: raw.recipe_name,
        source_url: raw.source_url,
        ingredients: normalized.matched.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::NormalizerConfig;
    use crate::embedding::HashedEmbedder;
    use crate::match_log::MatchLog;
    use crate::models::CatalogRecord;
    use crate::parser::HeuristicParser;
    use crate::store::memory::InMemoryStore;
    use std::sync::Arc;

    fn recipe(name: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            name: name.to_string(),
            source_url: format!("https://example.com/{}", name),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn query(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_recipe() {
        let recipes = vec![recipe("pancakes", &["egg", "flour", "salt"])];
        let hit = rank_recipes(&recipes, &query(&["egg", "flour", "salt"]), 0).unwrap();
        assert_eq!(hit.recipe.name, "pancakes");
        assert_eq!(hit.missing_count, 0);
        assert!(hit.missing_ingredients.is_empty());
    }

    #[test]
    fn test_tolerance_boundary() {
        let recipes = vec![recipe("pancakes", &["egg", "flour", "salt"])];
        let have = query(&["egg", "flour"]);

        assert_eq!(rank_recipes(&recipes, &have, 0), None);

        let hit = rank_recipes(&recipes, &have, 1).unwrap();
        assert_eq!(hit.missing_count, 1);
        assert_eq!(
            hit.missing_ingredients,
            BTreeSet::from(["salt".to_string()])
        );
    }

    #[test]
    fn test_empty_recipe_list() {
        assert_eq!(rank_recipes::<String>(&[], &[], 10), None);
    }

    #[test]
    fn test_smallest_missing_set_wins() {
        let recipes = vec![
            recipe("cake", &["egg", "flour", "sugar", "butter"]),
            recipe("omelette", &["egg", "salt", "butter"]),
            recipe("toast", &["bread", "butter"]),
        ];
        let hit = rank_recipes(&recipes, &query(&["egg", "salt"]), 5).unwrap();
        assert_eq!(hit.recipe.name, "omelette");
        assert_eq!(hit.missing_ingredients, BTreeSet::from(["butter".to_string()]));
    }

    #[test]
    fn test_ties_go_to_first_stored() {
        let recipes = vec![
            recipe("first", &["egg", "milk"]),
            recipe("second", &["egg", "cream"]),
        ];
        let hit = rank_recipes(&recipes, &query(&["egg"]), 1).unwrap();
        assert_eq!(hit.recipe.name, "first");
    }

    #[test]
    fn test_extra_ingredients_do_not_count() {
        let recipes = vec![recipe("salad", &["lettuce"])];
        let hit = rank_recipes(&recipes, &query(&["lettuce", "egg", "saffron"]), 0).unwrap();
        assert_eq!(hit.missing_count, 0);
    }

    #[tokio::test]
    async fn test_find_best_match_reads_store() {
        let store = InMemoryStore::new().with_recipes(vec![
            recipe("pancakes", &["egg", "flour", "salt"]),
            recipe("boiled egg", &["egg"]),
        ]);
        let hit = find_best_match(&store, &query(&["egg"]), 0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.recipe.name, "boiled egg");

        let empty = InMemoryStore::new();
        assert_eq!(find_best_match(&empty, &query(&["egg"]), 3).await.unwrap(), None);
    }

    fn normalizer() -> IngredientNormalizer {
        IngredientNormalizer::build(
            Catalog::from_records(vec![
                CatalogRecord::new("egg", &[]),
                CatalogRecord::new("all-purpose flour", &["flour"]),
                CatalogRecord::new("salt", &[]),
            ])
            .unwrap(),
            Arc::new(HashedEmbedder::new(128)),
            Arc::new(HeuristicParser),
            &NormalizerConfig::default(),
            Arc::new(MatchLog::disabled()),
            Arc::new(MatchLog::disabled()),
        )
        .unwrap()
    }

    fn raw(ingredients: &[&str]) -> RawRecipe {
        RawRecipe {
            recipe_name: "Pancakes".to_string(),
            source_url: "https://example.com/pancakes".to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_admit_recipe_sorts_and_dedups() {
        let n = normalizer();
        let recipe = admit_recipe(
            &n,
            raw(&["1 pinch salt", "2 eggs", "1 cup flour", "1 egg yolk", "1 cup water"]),
            3,
        )
        .unwrap();
        assert_eq!(
            recipe.ingredients.into_iter().collect::<Vec<_>>(),
            vec!["all-purpose flour", "egg", "salt"]
        );
    }

    #[test]
    fn test_admit_recipe_rejects_too_many_unknowns() {
        let n = normalizer();
        let admitted = admit_recipe(&n, raw(&["2 eggs", "1 cup quinoa", "3 dates"]), 3);
        assert!(admitted.is_ok());

        let err = admit_recipe(
            &n,
            raw(&["2 eggs", "1 cup quinoa", "3 dates", "1 bunch kale"]),
            3,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PantryError>(),
            Some(PantryError::MalformedInput(_))
        ));
    }
}
