//! `pantry normalize` and `pantry find` commands.

use std::sync::Arc;

use anyhow::Result;

use crate::api::FindRecipeResponse;
use crate::config::Config;
use crate::engine::RecipeEngine;

pub async fn run_normalize(config: &Config, phrases: Vec<String>, json: bool) -> Result<()> {
    let engine = Arc::new(RecipeEngine::from_config(config).await?);
    let result = engine.normalize(phrases).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("matched:");
    for name in &result.matched {
        println!("  {}", name);
    }
    println!("unmatched:");
    for phrase in &result.unmatched {
        println!("  {}", phrase);
    }
    Ok(())
}

pub async fn run_find(
    config: &Config,
    phrases: Vec<String>,
    allowed: usize,
    json: bool,
) -> Result<()> {
    let engine = Arc::new(RecipeEngine::from_config(config).await?);
    let ranked = engine.find_recipe(phrases, allowed).await?;

    if json {
        let response = FindRecipeResponse::from(ranked);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match ranked {
        None => println!("No recipe within {} missing ingredients.", allowed),
        Some(m) => {
            let ingredients: Vec<&str> = m.recipe.ingredients.iter().map(String::as_str).collect();
            let missing: Vec<&str> = m.missing_ingredients.iter().map(String::as_str).collect();
            println!("{}", m.recipe.name);
            println!("    url: {}", m.recipe.source_url);
            println!("    ingredients: {}", ingredients.join(", "));
            println!("    missing ({}): {}", m.missing_count, missing.join(", "));
        }
    }
    Ok(())
}
