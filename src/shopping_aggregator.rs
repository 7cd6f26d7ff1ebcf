//! # Shopping List Aggregation
//!
//! This module builds a shopping list from the recipes of a week. Ingredients with
//! the same name and a compatible unit are summed; everything else is carried over
//! line by line.
//!
//! ## Algorithm
//!
//! 1. Every ingredient amount is parsed with [`parse_amount`] and its unit classified
//!    with [`classify_unit`].
//! 2. Volumes and spoon measures are converted to milliliters, weights to grams and
//!    pieces are kept as "st". Each `(normalized name, base unit)` pair is a bucket.
//! 3. Buckets are emitted in first-occurrence order, re-expressed in deciliters
//!    (from 100 ml) or kilograms (from 1000 g), with a decimal comma.
//! 4. Missing, unparseable and unrecognized amounts follow as pass-through lines,
//!    verbatim and without deduplication.
//!
//! The aggregation is a pure function; persisting its result is up to the caller.

use crate::amount_parser::{classify_unit, parse_amount, ParsedAmount, UnitClass};
use crate::recipe_model::{Ingredient, Recipe, ShoppingItem};
use crate::units::{COUNT_UNIT, VOLUME_BASE, WEIGHT_BASE};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Values closer than this to an integer are printed without decimals
const INTEGER_TOLERANCE: f64 = 1e-6;

/// Grouping key of summed ingredients
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationKey {
    /// Ingredient name, trimmed and lower-cased
    pub normalized_name: String,
    /// "ml", "g" or "st"
    pub base_unit: &'static str,
}

/// Running sum of one key
#[derive(Debug, Clone)]
struct Bucket {
    display_name: String,
    total: f64,
}

/// Where a single ingredient ends up
#[derive(Debug, Clone, PartialEq)]
enum Placement {
    Summed(AggregationKey, f64),
    PassThrough,
}

/// Aggregate the ingredients of the given recipes into shopping items
///
/// # Arguments
///
/// * `recipes` - Recipes in menu order; their order decides the output order
///
/// # Returns
///
/// Summed items in first-occurrence order followed by pass-through items in their
/// original order. All items are unchecked. No recipes yield an empty list.
///
/// # Examples
///
/// ```rust
/// use matsedel::recipe_model::{Ingredient, NewRecipe};
/// use matsedel::shopping_aggregator::aggregate_ingredients;
///
/// let ingredients = vec![
///     Ingredient::new("Mjölk").with_amount("2 dl"),
///     Ingredient::new("mjölk ").with_amount("150 ml"),
/// ];
/// let items = aggregate_ingredients(ingredients.iter());
///
/// assert_eq!(items.len(), 1);
/// assert_eq!(items[0].name, "Mjölk");
/// assert_eq!(items[0].amount.as_deref(), Some("3,5 dl"));
/// ```
pub fn aggregate_recipes(recipes: &[Recipe]) -> Vec<ShoppingItem> {
    debug!(recipes = recipes.len(), "Aggregating shopping list");
    aggregate_ingredients(recipes.iter().flat_map(|recipe| recipe.ingredients.iter()))
}

/// Aggregate a flat, ordered sequence of ingredients
pub fn aggregate_ingredients<'a, I>(ingredients: I) -> Vec<ShoppingItem>
where
    I: IntoIterator<Item = &'a Ingredient>,
{
    let mut order: Vec<AggregationKey> = Vec::new();
    let mut buckets: HashMap<AggregationKey, Bucket> = HashMap::new();
    let mut pass_through: Vec<ShoppingItem> = Vec::new();

    for ingredient in ingredients {
        match place_ingredient(ingredient) {
            Placement::Summed(key, base_value) => {
                trace!(
                    name = %key.normalized_name,
                    unit = key.base_unit,
                    value = base_value,
                    "Adding to bucket"
                );
                buckets
                    .entry(key.clone())
                    .or_insert_with(|| {
                        order.push(key);
                        Bucket {
                            display_name: ingredient.name.trim().to_string(),
                            total: 0.0,
                        }
                    })
                    .total += base_value;
            }
            Placement::PassThrough => {
                trace!(name = %ingredient.name, amount = ?ingredient.amount, "Passing through");
                pass_through.push(ShoppingItem::new(&ingredient.name, ingredient.amount.as_deref()));
            }
        }
    }

    let mut items: Vec<ShoppingItem> = order
        .iter()
        .filter_map(|key| {
            let bucket = buckets.get(key)?;
            let amount = format_amount(bucket.total, key.base_unit);
            Some(ShoppingItem::new(&bucket.display_name, Some(&amount)))
        })
        .collect();

    debug!(
        summed = items.len(),
        pass_through = pass_through.len(),
        "Shopping list aggregated"
    );

    items.extend(pass_through);
    items
}

fn place_ingredient(ingredient: &Ingredient) -> Placement {
    let ParsedAmount::Parsed { value, unit_text } = parse_amount(ingredient.amount.as_deref()) else {
        return Placement::PassThrough;
    };

    let (base_unit, base_value) = match classify_unit(&unit_text) {
        UnitClass::Volume(factor) => (VOLUME_BASE, value * factor),
        UnitClass::Weight(factor) => (WEIGHT_BASE, value * factor),
        UnitClass::Count => (COUNT_UNIT, value),
        UnitClass::Unrecognized => return Placement::PassThrough,
    };

    let key = AggregationKey {
        normalized_name: normalize_name(&ingredient.name),
        base_unit,
    };
    Placement::Summed(key, base_value)
}

/// Normalize an ingredient name for grouping (trim, lower-case)
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Pick the most readable unit for a summed base value
///
/// 100 ml and more is shown in deciliters, 1000 g and more in kilograms.
pub fn display_unit(total: f64, base_unit: &'static str) -> (f64, &'static str) {
    match base_unit {
        VOLUME_BASE if total >= 100.0 => (total / 100.0, "dl"),
        WEIGHT_BASE if total >= 1000.0 => (total / 1000.0, "kg"),
        _ => (total, base_unit),
    }
}

/// Format a number the Swedish way: integers bare, otherwise one decimal with a comma
pub fn format_number(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < INTEGER_TOLERANCE {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", value).replace('.', ",")
    }
}

/// Format a summed base value as "<number> <unit>"
pub fn format_amount(total: f64, base_unit: &'static str) -> String {
    let (value, unit) = display_unit(total, base_unit);
    format!("{} {}", format_number(value), unit).trim().to_string()
}
