//! Request and response shapes for the service layer.
//!
//! ```json
//! POST /normalize      {"ingredients_list": ["2 eggs", "1 cup flour"]}
//!                   -> {"matched": ["egg", "all-purpose flour"], "unmatched": []}
//!
//! POST /recipes/find   {"num_missing_ingredients_allowed": 1,
//!                       "ingredients_list": ["egg", "flour"]}
//!                   -> {"success": true,
//!                       "recipe": {"recipe_name": "...", "source_url": "...", "ingredients": [...]},
//!                       "number_missing_ingredients": 1,
//!                       "missing_ingredients": ["salt"]}
//!                   or {"success": false}
//! ```
//!
//! `ingredients_list` may also be a single string. Any other type is
//! rejected as malformed input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PantryError;
use crate::models::{RankedMatch, Recipe};

/// One phrase or a list of phrases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct IngredientInput(Vec<String>);

impl IngredientInput {
    pub fn into_phrases(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for IngredientInput {
    fn from(phrases: Vec<String>) -> Self {
        Self(phrases)
    }
}

impl TryFrom<Value> for IngredientInput {
    type Error = PantryError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(phrase) => Ok(Self(vec![phrase])),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(phrase) => Ok(phrase),
                    other => Err(PantryError::MalformedInput(format!(
                        "ingredients_list[{}] must be a string, got {}",
                        i,
                        type_name(&other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self),
            other => Err(PantryError::MalformedInput(format!(
                "ingredients_list must be a string or a list of strings, got {}",
                type_name(&other)
            ))),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeRequest {
    pub ingredients_list: IngredientInput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindRecipeRequest {
    pub num_missing_ingredients_allowed: usize,
    pub ingredients_list: IngredientInput,
}

/// Decode a request body, reporting any shape error as malformed input.
pub fn parse_request<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, PantryError> {
    serde_json::from_value(body).map_err(|e| PantryError::MalformedInput(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindRecipeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub found: Option<FoundRecipe>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundRecipe {
    pub recipe: Recipe,
    pub number_missing_ingredients: usize,
    pub missing_ingredients: Vec<String>,
}

impl From<Option<RankedMatch>> for FindRecipeResponse {
    fn from(ranked: Option<RankedMatch>) -> Self {
        match ranked {
            Some(m) => Self {
                success: true,
                found: Some(FoundRecipe {
                    recipe: m.recipe,
                    number_missing_ingredients: m.missing_count,
                    missing_ingredients: m.missing_ingredients.into_iter().collect(),
                }),
            },
            None => Self {
                success: false,
                found: None,
            },
        }
    }
}
