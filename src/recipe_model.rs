//! # Recipe, Menu and Shopping List Data Model
//!
//! This module defines the records the planner stores and passes around:
//! recipes with their ingredients, profiles, weekly menus and shopping lists.
//!
//! ## Core Concepts
//!
//! - **Ingredient**: a named item with a free-text amount, owned by one recipe
//! - **Recipe**: title, ingredients, steps and tags, created by a profile
//! - **WeeklyMenu**: recipes assigned to weekdays for a profile, week and year
//! - **ShoppingItem**: one line of a profile's shopping list
//!
//! ## Usage
//!
//! ```rust
//! use matsedel::recipe_model::{Ingredient, NewRecipe};
//!
//! let pancakes = NewRecipe::new("Pannkakor")
//!     .with_ingredient(Ingredient::new("Mjölk").with_amount("6 dl"))
//!     .with_ingredient(Ingredient::new("Ägg").with_amount("3 st"))
//!     .with_step("Vispa ihop allt");
//!
//! assert_eq!(pancakes.ingredients.len(), 2);
//! ```

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weekdays a menu is laid out on, Monday first
pub const WEEK_DAYS: [&str; 7] = [
    "Måndag", "Tisdag", "Onsdag", "Torsdag", "Fredag", "Lördag", "Söndag",
];

/// An ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Name of the ingredient (e.g. "Mjölk", "Gul lök")
    pub name: String,

    /// Free-text amount (e.g. "2 dl", "1 nypa"), missing for "salt"-style lines
    #[serde(default)]
    pub amount: Option<String>,
}

/// A stored recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub servings: Option<i64>,
    pub image_url: Option<String>,
    pub archived: bool,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
    /// Profile that created the recipe
    pub created_by: Option<i64>,
}

/// A recipe that has not been stored yet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    pub description: Option<String>,
    pub servings: Option<i64>,
    pub image_url: Option<String>,
    pub archived: bool,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
    pub created_by: Option<i64>,
}

/// Partial update of a recipe; `None` leaves a field untouched
///
/// Ingredients, steps and tags are replaced wholesale when given.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecipeUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub servings: Option<i64>,
    pub image_url: Option<String>,
    pub archived: Option<bool>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub steps: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// A household profile, used to partition data (not for authentication)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    /// light, dark or auto
    pub theme_preference: Option<String>,
}

/// Partial update of a profile
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub theme_preference: Option<String>,
}

/// A recipe assigned to a day of the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuEntry {
    pub day: String,
    pub recipe_id: Option<i64>,
}

/// The weekly menu of a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMenu {
    pub profile_id: i64,
    /// Profile responsible for cooking or shopping this week
    pub responsible_profile_id: Option<i64>,
    /// ISO week number
    pub week_number: u32,
    pub year: i32,
    pub entries: Vec<MenuEntry>,
}

/// One line of a shopping list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub name: String,
    /// Formatted amount ("3,5 dl") or the verbatim text of a pass-through line
    pub amount: Option<String>,
    pub checked: bool,
}

/// The shopping list of a profile, in stored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub profile_id: i64,
    pub items: Vec<ShoppingItem>,
}

/// Resolve an optional week and year against today's ISO week
pub fn resolve_week(week_number: Option<u32>, year: Option<i32>) -> (u32, i32) {
    resolve_week_from(Local::now().date_naive(), week_number, year)
}

/// Resolve an optional week and year against the ISO week of `today`
///
/// Zero values count as missing.
pub fn resolve_week_from(today: NaiveDate, week_number: Option<u32>, year: Option<i32>) -> (u32, i32) {
    let current = today.iso_week();
    (
        week_number.filter(|week| *week > 0).unwrap_or(current.week()),
        year.filter(|year| *year > 0).unwrap_or(current.year()),
    )
}

/// Check if a day name is one of the menu weekdays
pub fn is_week_day(day: &str) -> bool {
    WEEK_DAYS.contains(&day)
}

impl Ingredient {
    /// Create an ingredient with just a name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            amount: None,
        }
    }

    /// Add an amount to this ingredient
    pub fn with_amount(mut self, amount: &str) -> Self {
        self.amount = Some(amount.to_string());
        self
    }
}

impl NewRecipe {
    /// Create a recipe draft with a title
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_servings(mut self, servings: i64) -> Self {
        self.servings = Some(servings);
        self
    }

    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    pub fn with_step(mut self, step: &str) -> Self {
        self.steps.push(step.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn created_by(mut self, profile_id: i64) -> Self {
        self.created_by = Some(profile_id);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }
}

impl ShoppingItem {
    /// Create an unchecked shopping item
    pub fn new(name: &str, amount: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            amount: amount.map(str::to_string),
            checked: false,
        }
    }
}

impl WeeklyMenu {
    /// Recipe ids of the menu in day order, skipping empty days
    pub fn recipe_ids(&self) -> Vec<i64> {
        self.entries.iter().filter_map(|entry| entry.recipe_id).collect()
    }

    /// Check if no recipe is planned
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|entry| entry.recipe_id.is_none())
    }
}

impl ShoppingList {
    /// Number of items not yet checked off
    pub fn remaining_count(&self) -> usize {
        self.items.iter().filter(|item| !item.checked).count()
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.amount {
            Some(amount) if !amount.trim().is_empty() => write!(f, "{} {}", amount, self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for ShoppingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.checked { "x" } else { " " };
        match &self.amount {
            Some(amount) if !amount.is_empty() => write!(f, "[{}] {} {}", mark, self.name, amount),
            _ => write!(f, "[{}] {}", mark, self.name),
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.title)?;
        if let Some(servings) = self.servings {
            write!(f, " ({} portioner)", servings)?;
        }
        if self.archived {
            write!(f, " [arkiverad]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_recipe_builder() {
        let recipe = NewRecipe::new("Köttbullar")
            .with_description("Klassiska")
            .with_servings(4)
            .with_ingredient(Ingredient::new("Köttfärs").with_amount("500 g"))
            .with_step("Rulla bullar")
            .with_tag("vardag")
            .created_by(2);

        assert_eq!(recipe.title, "Köttbullar");
        assert_eq!(recipe.servings, Some(4));
        assert_eq!(recipe.ingredients[0].amount.as_deref(), Some("500 g"));
        assert_eq!(recipe.steps, vec!["Rulla bullar".to_string()]);
        assert_eq!(recipe.created_by, Some(2));
        assert!(!recipe.archived);
    }

    #[test]
    fn test_ingredient_display() {
        assert_eq!(Ingredient::new("Salt").to_string(), "Salt");
        assert_eq!(Ingredient::new("Mjölk").with_amount("2 dl").to_string(), "2 dl Mjölk");
    }

    #[test]
    fn test_shopping_item_display() {
        let mut item = ShoppingItem::new("Mjölk", Some("3,5 dl"));
        assert_eq!(item.to_string(), "[ ] Mjölk 3,5 dl");
        item.checked = true;
        assert_eq!(item.to_string(), "[x] Mjölk 3,5 dl");
        assert_eq!(ShoppingItem::new("Salt", None).to_string(), "[ ] Salt");
    }

    #[test]
    fn test_menu_recipe_ids_skip_empty_days() {
        let menu = WeeklyMenu {
            profile_id: 1,
            responsible_profile_id: None,
            week_number: 12,
            year: 2025,
            entries: vec![
                MenuEntry { day: "Måndag".into(), recipe_id: Some(3) },
                MenuEntry { day: "Tisdag".into(), recipe_id: None },
                MenuEntry { day: "Onsdag".into(), recipe_id: Some(1) },
            ],
        };
        assert_eq!(menu.recipe_ids(), vec![3, 1]);
        assert!(!menu.is_empty());
    }

    #[test]
    fn test_resolve_week_from_today() {
        // 2025-01-01 belongs to ISO week 1 of 2025; 2024-12-30 too
        let today = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(resolve_week_from(today, None, None), (1, 2025));
        assert_eq!(resolve_week_from(today, Some(10), None), (10, 2025));
        assert_eq!(resolve_week_from(today, Some(0), Some(2023)), (1, 2023));
    }

    #[test]
    fn test_week_days() {
        assert!(is_week_day("Måndag"));
        assert!(!is_week_day("Monday"));
    }

    #[test]
    fn test_ingredient_deserialize_without_amount() {
        let ingredient: Ingredient = serde_json::from_str(r#"{"name": "Salt"}"#).unwrap();
        assert_eq!(ingredient, Ingredient::new("Salt"));
    }
}
