//! # Recipe Import and Export
//!
//! Recipes travel as JSON, either as a bare list or wrapped as
//! `{"recipes": [...]}`. Import is lenient: entries without a title are skipped,
//! ingredients without a name are dropped and non-string steps or tags are
//! ignored. Export writes the wrapped form, which imports again unchanged.

use crate::db::{add_recipes, list_recipes};
use crate::errors::PlannerError;
use crate::recipe_model::{Ingredient, NewRecipe, Recipe};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::fmt;
use tracing::{debug, info};

/// Outcome of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportSummary {
    /// Recipes stored
    pub imported: usize,
    /// Entries in the payload, stored or not
    pub total: usize,
}

impl ImportSummary {
    pub fn skipped(&self) -> usize {
        self.total - self.imported
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Importerade {} av {} recept", self.imported, self.total)
    }
}

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    recipes: &'a [Recipe],
}

/// Parse an import payload into recipe drafts
///
/// Returns the usable drafts and the number of entries in the payload. Drafts
/// without a `created_by` belong to `profile_id`.
pub fn parse_import_payload(
    json: &str,
    profile_id: i64,
) -> std::result::Result<(Vec<NewRecipe>, usize), PlannerError> {
    let payload: Value = serde_json::from_str(json)
        .map_err(|e| PlannerError::InvalidImport(format!("not valid JSON: {}", e)))?;

    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("recipes") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(PlannerError::InvalidImport(
                    "expected a list of recipes".to_string(),
                ))
            }
        },
        _ => {
            return Err(PlannerError::InvalidImport(
                "expected a list of recipes".to_string(),
            ))
        }
    };

    let total = entries.len();
    let drafts: Vec<NewRecipe> = entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| recipe_from_entry(entry, profile_id))
        .collect();

    debug!(total, usable = drafts.len(), "Parsed import payload");
    Ok((drafts, total))
}

fn recipe_from_entry(entry: &Map<String, Value>, profile_id: i64) -> Option<NewRecipe> {
    let title = text_field(entry, "title")?;

    Some(NewRecipe {
        title,
        description: text_field(entry, "description"),
        servings: entry.get("servings").and_then(servings_value),
        image_url: text_field(entry, "image_url"),
        archived: entry.get("archived").and_then(Value::as_bool).unwrap_or(false),
        ingredients: entry
            .get("ingredients")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(ingredient_value).collect())
            .unwrap_or_default(),
        steps: string_list(entry.get("steps")),
        tags: string_list(entry.get("tags")),
        created_by: Some(entry.get("created_by").and_then(Value::as_i64).unwrap_or(profile_id)),
    })
}

/// Non-empty trimmed string field
fn text_field(entry: &Map<String, Value>, key: &str) -> Option<String> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Servings given as a number or a numeric string
fn servings_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn ingredient_value(value: &Value) -> Option<Ingredient> {
    let entry = value.as_object()?;
    let name = text_field(entry, "name")?;
    let amount = match entry.get("amount") {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    };
    Some(Ingredient { name, amount })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Import recipes from a JSON payload
///
/// # Arguments
///
/// * `pool` - Database pool
/// * `json` - A list of recipes or `{"recipes": [...]}`
/// * `profile_id` - Owner of recipes that do not name one
///
/// # Returns
///
/// How many entries were stored out of the total, or
/// [`PlannerError::InvalidImport`] when the payload has no recipe list. The
/// usable entries are stored in one transaction: when one fails, none is kept.
pub async fn import_recipes_json(pool: &SqlitePool, json: &str, profile_id: i64) -> Result<ImportSummary> {
    let (drafts, total) = parse_import_payload(json, profile_id)?;

    add_recipes(pool, &drafts)
        .await
        .context("Failed to import recipes, nothing was stored")?;

    let summary = ImportSummary {
        imported: drafts.len(),
        total,
    };
    info!(imported = summary.imported, total = summary.total, profile_id, "Imported recipes");
    Ok(summary)
}

/// Export recipes, archived ones included, as pretty-printed JSON
///
/// `profile_id` limits the export to the recipes of one profile.
pub async fn export_recipes_json(pool: &SqlitePool, profile_id: Option<i64>) -> Result<String> {
    let recipes = list_recipes(pool, profile_id, true).await?;
    let json = serde_json::to_string_pretty(&ExportDocument { recipes: &recipes })
        .context("Failed to serialize recipes")?;

    info!(count = recipes.len(), "Exported recipes");
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_list() {
        let json = r#"[{"title": "Pannkakor", "ingredients": [{"name": "Mjölk", "amount": "6 dl"}]}]"#;
        let (drafts, total) = parse_import_payload(json, 2).unwrap();

        assert_eq!(total, 1);
        assert_eq!(drafts[0].title, "Pannkakor");
        assert_eq!(drafts[0].ingredients, vec![Ingredient::new("Mjölk").with_amount("6 dl")]);
        assert_eq!(drafts[0].created_by, Some(2));
    }

    #[test]
    fn test_parse_wrapped_list_skips_untitled() {
        let json = r#"{"recipes": [{"title": "  "}, {"description": "ingen titel"}, {"title": "Soppa"}, 5]}"#;
        let (drafts, total) = parse_import_payload(json, 1).unwrap();

        assert_eq!(total, 4);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Soppa");
    }

    #[test]
    fn test_parse_lenient_fields() {
        let json = r#"[{
            "title": "Gryta",
            "servings": "4",
            "archived": true,
            "created_by": 3,
            "ingredients": [{"name": ""}, {"amount": "1 dl"}, {"name": "Salt"}, {"name": "Ägg", "amount": 2}],
            "steps": ["Koka", 7, null, "Servera"],
            "tags": ["middag", {"x": 1}]
        }]"#;
        let (drafts, _) = parse_import_payload(json, 1).unwrap();
        let draft = &drafts[0];

        assert_eq!(draft.servings, Some(4));
        assert!(draft.archived);
        assert_eq!(draft.created_by, Some(3));
        assert_eq!(
            draft.ingredients,
            vec![Ingredient::new("Salt"), Ingredient::new("Ägg").with_amount("2")]
        );
        assert_eq!(draft.steps, vec!["Koka", "Servera"]);
        assert_eq!(draft.tags, vec!["middag"]);
    }

    #[test]
    fn test_parse_invalid_servings_is_dropped() {
        let (drafts, _) = parse_import_payload(r#"[{"title": "A", "servings": "fyra"}]"#, 1).unwrap();
        assert_eq!(drafts[0].servings, None);
    }

    #[test]
    fn test_parse_rejects_payload_without_list() {
        assert!(matches!(
            parse_import_payload("{not json", 1),
            Err(PlannerError::InvalidImport(_))
        ));
        assert!(matches!(
            parse_import_payload(r#"{"title": "Soppa"}"#, 1),
            Err(PlannerError::InvalidImport(_))
        ));
        assert!(matches!(
            parse_import_payload("42", 1),
            Err(PlannerError::InvalidImport(_))
        ));
    }

    #[test]
    fn test_summary_display() {
        let summary = ImportSummary { imported: 2, total: 3 };
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.to_string(), "Importerade 2 av 3 recept");
    }
}
