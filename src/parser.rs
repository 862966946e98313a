//! Ingredient phrase parsing.
//!
//! The normalizer only depends on the [`PhraseParser`] trait: given a raw
//! phrase such as `"2 tablespoons packed light brown sugar"` it wants the
//! ingredient name (`"packed light brown sugar"`) and, when foundation
//! simplification is requested, a stripped-down foundation food
//! (`"brown sugar"`). Any linguistic parser can sit behind the trait.
//!
//! [`HeuristicParser`] is the built-in implementation. It works on word
//! lists: it drops quantities, units, parenthetical notes, preparation
//! clauses after a comma, and trailing "to taste"; takes the first option
//! of "x or y"; then removes descriptor words to form the foundation food.

use crate::models::ParsedPhrase;

pub trait PhraseParser: Send + Sync {
    fn parse(&self, phrase: &str, foundation_foods: bool) -> ParsedPhrase;
}

/// Words that describe a measure rather than an ingredient.
const UNITS: &[&str] = &[
    "cup", "c", "teaspoon", "tsp", "t", "tablespoon", "tbsp", "tbs", "tb", "ml", "milliliter",
    "millilitre", "liter", "litre", "l", "pint", "pt", "quart", "qt", "gallon", "gal", "fl",
    "fluid", "pinch", "dash", "drop", "gram", "g", "kilogram", "kg", "mg", "ounce", "oz", "pound",
    "lb", "piece", "clove", "head", "bunch", "can", "package", "pkg", "packet", "bottle", "box",
    "bag", "container", "jar", "stick", "slice", "sprig", "handful", "inch", "cm",
];

/// Leading filler that carries no ingredient meaning.
const FILLERS: &[&str] = &["of", "a", "an", "about", "approximately", "around", "some", "few"];

/// Descriptors dropped when forming the foundation food.
const DESCRIPTORS: &[&str] = &[
    "packed", "light", "dark", "large", "small", "medium", "extra", "fresh", "freshly", "frozen",
    "dried", "organic", "chopped", "diced", "minced", "sliced", "grated", "shredded", "ground",
    "crushed", "softened", "melted", "cold", "warm", "hot", "boneless", "skinless", "lean",
    "lower-sodium", "low-sodium", "reduced-fat", "low-fat", "unsalted", "salted", "whole",
    "mixed", "finely", "roughly", "thinly", "peeled", "raw", "cooked", "ripe", "plain",
    "virgin", "granulated", "powdered", "kosher", "coarse",
];

/// Words that look plural but are not.
const UNINFLECTED: &[&str] = &[
    "molasses", "hummus", "couscous", "asparagus", "citrus", "swiss", "grits", "brussels",
];

const VULGAR_FRACTIONS: &[char] = &['¼', '½', '¾', '⅓', '⅔', '⅛', '⅜', '⅝', '⅞', '⅕'];

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicParser;

impl HeuristicParser {
    pub fn new() -> Self {
        Self
    }
}

impl PhraseParser for HeuristicParser {
    fn parse(&self, phrase: &str, foundation_foods: bool) -> ParsedPhrase {
        let words = core_words(phrase);
        if words.is_empty() {
            return ParsedPhrase::default();
        }

        let name = singularize_last(&words.join(" "));
        let foundation_food = if foundation_foods {
            let kept: Vec<&str> = words
                .iter()
                .map(String::as_str)
                .filter(|w| !DESCRIPTORS.contains(w) && !w.ends_with('%'))
                .collect();
            if kept.is_empty() || kept.len() == words.len() {
                None
            } else {
                Some(singularize_last(&kept.join(" ")))
            }
        } else {
            None
        };

        ParsedPhrase {
            name: Some(name),
            foundation_food,
        }
    }
}

/// Reduce a phrase to the words that name the ingredient.
fn core_words(phrase: &str) -> Vec<String> {
    let without_parens = strip_parentheticals(&phrase.to_lowercase());

    // "butter or olive oil, 1 tbsp" -> "butter"; "chicken, diced" -> "chicken"
    let mut head = without_parens.as_str();
    if let Some((first, _)) = head.split_once(',') {
        if has_ingredient_word(first) {
            head = first;
        }
    }
    if let Some((first, _)) = head.split_once(" or ") {
        if has_ingredient_word(first) {
            head = first;
        }
    }

    let mut words: Vec<String> = head
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c == '.' || c == ',' || c == ';').to_string())
        .filter(|w| !w.is_empty())
        .collect();

    if words.len() >= 2 && words[words.len() - 2] == "to" && words[words.len() - 1] == "taste" {
        words.truncate(words.len() - 2);
    }

    let mut start = 0;
    while start < words.len() {
        let w = words[start].as_str();
        if is_quantity(w) || is_unit(w) || FILLERS.contains(&w) {
            start += 1;
        } else {
            break;
        }
    }

    words.split_off(start)
}

fn has_ingredient_word(fragment: &str) -> bool {
    fragment
        .split_whitespace()
        .any(|w| !is_quantity(w) && !is_unit(w) && !FILLERS.contains(&w))
}

fn strip_parentheticals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn is_quantity(word: &str) -> bool {
    if word.chars().all(|c| VULGAR_FRACTIONS.contains(&c)) {
        return true;
    }
    let trimmed = word.trim_start_matches(|c: char| c.is_ascii_digit());
    if !trimmed.is_empty()
        && trimmed.len() < word.len()
        && trimmed.chars().all(|c| VULGAR_FRACTIONS.contains(&c))
    {
        return true;
    }
    if word.parse::<f64>().is_ok() {
        return true;
    }
    if let Some((num, den)) = word.split_once('/') {
        return num.parse::<u32>().is_ok() && den.parse::<u32>().map(|d| d != 0).unwrap_or(false);
    }
    if let Some((lo, hi)) = word.split_once('-') {
        return lo.parse::<f64>().is_ok() && hi.parse::<f64>().is_ok();
    }
    false
}

fn is_unit(word: &str) -> bool {
    let stem_es = word.len() > 2 && word.ends_with("es") && UNITS.contains(&&word[..word.len() - 2]);
    let singular = if stem_es {
        &word[..word.len() - 2]
    } else if word.len() > 1 && word.ends_with('s') {
        &word[..word.len() - 1]
    } else {
        word
    };
    UNITS.contains(&word) || UNITS.contains(&singular)
}

/// Singularize the final word of a name: "large eggs" -> "large egg".
fn singularize_last(name: &str) -> String {
    let (prefix, last) = match name.rsplit_once(' ') {
        Some((p, l)) => (Some(p), l),
        None => (None, name),
    };

    let singular = if UNINFLECTED.contains(&last) {
        last.to_string()
    } else if last.len() > 4 && last.ends_with("ies") {
        format!("{}y", &last[..last.len() - 3])
    } else if last.len() > 4
        && (last.ends_with("oes") || last.ends_with("shes") || last.ends_with("ches"))
    {
        last[..last.len() - 2].to_string()
    } else if last.len() > 3 && last.ends_with('s') && !last.ends_with("ss") {
        last[..last.len() - 1].to_string()
    } else {
        last.to_string()
    };

    match prefix {
        Some(p) => format!("{} {}", p, singular),
        None => singular,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(phrase: &str) -> (Option<String>, Option<String>) {
        let parsed = HeuristicParser.parse(phrase, true);
        (parsed.name, parsed.foundation_food)
    }

    #[test]
    fn test_quantity_and_unit_stripped() {
        assert_eq!(parse("1 cup flour"), (Some("flour".to_string()), None));
        assert_eq!(parse("2 eggs"), (Some("egg".to_string()), None));
        assert_eq!(parse("1/2 teaspoon salt").0, Some("salt".to_string()));
        assert_eq!(parse("½ cup chopped onion").0, Some("chopped onion".to_string()));
        assert_eq!(parse("2 ½ tablespoons pesto").0, Some("pesto".to_string()));
    }

    #[test]
    fn test_foundation_food_drops_descriptors() {
        assert_eq!(
            parse("2 tablespoons packed light brown sugar"),
            (
                Some("packed light brown sugar".to_string()),
                Some("brown sugar".to_string())
            )
        );
        assert_eq!(
            parse("2 pounds 85% lean ground beef"),
            (Some("85% lean ground beef".to_string()), Some("beef".to_string()))
        );
    }

    #[test]
    fn test_parentheticals_and_alternatives() {
        assert_eq!(parse("1 (16 ounce) package pasta").0, Some("pasta".to_string()));
        assert_eq!(parse("butter or olive oil, 1 tbsp").0, Some("butter".to_string()));
        assert_eq!(parse("salt to taste").0, Some("salt".to_string()));
        assert_eq!(
            parse("ground black pepper to taste"),
            (
                Some("ground black pepper".to_string()),
                Some("black pepper".to_string())
            )
        );
    }

    #[test]
    fn test_foundation_disabled() {
        let parsed = HeuristicParser.parse("1 large organic cucumber", false);
        assert_eq!(parsed.name, Some("large organic cucumber".to_string()));
        assert_eq!(parsed.foundation_food, None);
    }

    #[test]
    fn test_nothing_left() {
        assert_eq!(HeuristicParser.parse("2 cups", true), ParsedPhrase::default());
        assert_eq!(HeuristicParser.parse("", true), ParsedPhrase::default());
    }

    #[test]
    fn test_singularize_last() {
        assert_eq!(singularize_last("green olives"), "green olive");
        assert_eq!(singularize_last("cherries"), "cherry");
        assert_eq!(singularize_last("tomatoes"), "tomato");
        assert_eq!(singularize_last("molasses"), "molasses");
        assert_eq!(singularize_last("couscous"), "couscous");
        assert_eq!(singularize_last("peas"), "pea");
    }
}
