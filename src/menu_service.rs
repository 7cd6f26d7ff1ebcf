//! # Weekly Menu Service
//!
//! Validated menu workflows on top of the storage layer. Recipe and profile ids
//! are checked before anything is written, and removing a day keeps the
//! shopping list in step with the menu.

use crate::db;
use crate::errors::PlannerError;
use crate::recipe_model::{is_week_day, ShoppingList, WeeklyMenu};
use crate::shopping_service::rebuild_after_menu_removal;
use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Replace a week's menu with the selected recipes
///
/// Fails with [`PlannerError::NoRecipesSelected`] for an empty selection and
/// [`PlannerError::RecipeNotFound`] for an unknown id. At most seven recipes
/// are placed, Monday first.
pub async fn create_weekly_menu(
    pool: &SqlitePool,
    profile_id: i64,
    recipe_ids: &[i64],
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<WeeklyMenu> {
    if recipe_ids.is_empty() {
        return Err(PlannerError::NoRecipesSelected.into());
    }
    ensure_recipes_exist(pool, recipe_ids).await?;
    db::replace_menu(pool, profile_id, recipe_ids, week_number, year).await
}

/// Add recipes to the free days of a week's menu
pub async fn add_to_menu(
    pool: &SqlitePool,
    profile_id: i64,
    recipe_ids: &[i64],
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<WeeklyMenu> {
    if recipe_ids.is_empty() {
        return Err(PlannerError::NoRecipesSelected.into());
    }
    ensure_recipes_exist(pool, recipe_ids).await?;
    db::append_recipes(pool, profile_id, recipe_ids, week_number, year).await
}

/// Remove a day from the menu and rebuild the shopping list
pub async fn remove_day(
    pool: &SqlitePool,
    profile_id: i64,
    day: &str,
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<(WeeklyMenu, ShoppingList)> {
    if !is_week_day(day) {
        return Err(PlannerError::InvalidDay(day.to_string()).into());
    }

    let menu = db::remove_menu_entry(pool, profile_id, day, week_number, year).await?;
    let list =
        rebuild_after_menu_removal(pool, profile_id, Some(menu.week_number), Some(menu.year)).await?;

    info!(profile_id, day, items = list.items.len(), "Removed day and rebuilt shopping list");
    Ok((menu, list))
}

/// Assign the profile responsible for a week, or clear it with `None`
pub async fn assign_responsible(
    pool: &SqlitePool,
    profile_id: i64,
    responsible_profile_id: Option<i64>,
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<WeeklyMenu> {
    if let Some(responsible) = responsible_profile_id {
        if db::get_profile(pool, responsible).await?.is_none() {
            return Err(PlannerError::ProfileNotFound(responsible).into());
        }
    }
    db::set_responsible(pool, profile_id, responsible_profile_id, week_number, year).await
}

async fn ensure_recipes_exist(pool: &SqlitePool, recipe_ids: &[i64]) -> Result<()> {
    for &recipe_id in recipe_ids {
        if db::get_recipe(pool, recipe_id).await?.is_none() {
            return Err(PlannerError::RecipeNotFound(recipe_id).into());
        }
    }
    Ok(())
}
