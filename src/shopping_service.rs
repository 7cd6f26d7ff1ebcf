//! # Shopping List Service
//!
//! Connects the weekly menu, the aggregation engine and the shopping list
//! storage: read the menu, load its recipes, aggregate their ingredients and
//! replace the stored list with the result.

use crate::db::{get_menu, get_recipes, replace_shopping_list};
use crate::errors::PlannerError;
use crate::recipe_model::{Recipe, ShoppingList};
use crate::shopping_aggregator::aggregate_recipes;
use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Build and store the shopping list for a profile's weekly menu
///
/// # Arguments
///
/// * `pool` - Database pool
/// * `profile_id` - Profile whose menu and list are used
/// * `week_number`, `year` - Week of the menu, the current ISO week when `None`
///
/// # Returns
///
/// The stored list, or [`PlannerError::EmptyMenu`] when none of the menu's
/// recipes can be loaded. The previous list is left untouched in that case.
pub async fn build_shopping_list_for_menu(
    pool: &SqlitePool,
    profile_id: i64,
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<ShoppingList> {
    let menu = get_menu(pool, profile_id, week_number, year).await?;
    let recipes = get_recipes(pool, &menu.recipe_ids()).await?;
    if recipes.is_empty() {
        return Err(PlannerError::EmptyMenu.into());
    }
    store_aggregated_list(pool, profile_id, &recipes).await
}

/// Rebuild the shopping list after a menu entry was removed
///
/// Unlike [`build_shopping_list_for_menu`] an empty menu is fine here and
/// clears the list.
pub async fn rebuild_after_menu_removal(
    pool: &SqlitePool,
    profile_id: i64,
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<ShoppingList> {
    let menu = get_menu(pool, profile_id, week_number, year).await?;
    let recipes = get_recipes(pool, &menu.recipe_ids()).await?;
    store_aggregated_list(pool, profile_id, &recipes).await
}

async fn store_aggregated_list(pool: &SqlitePool, profile_id: i64, recipes: &[Recipe]) -> Result<ShoppingList> {
    let items = aggregate_recipes(recipes);

    info!(
        profile_id,
        recipes = recipes.len(),
        items = items.len(),
        "Built shopping list from menu"
    );

    replace_shopping_list(pool, profile_id, &items).await
}

/// Format a shopping list for terminal display
pub fn format_shopping_list_for_display(list: &ShoppingList) -> String {
    if list.items.is_empty() {
        return "🛒 Inköpslistan är tom.".to_string();
    }

    let mut output = format!(
        "🛒 **Inköpslista** ({} kvar av {})\n\n",
        list.remaining_count(),
        list.items.len()
    );
    for (index, item) in list.items.iter().enumerate() {
        output.push_str(&format!("{:>2}. {}\n", index + 1, item));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe_model::ShoppingItem;

    #[test]
    fn test_format_empty_list() {
        let list = ShoppingList {
            profile_id: 1,
            items: vec![],
        };
        assert_eq!(format_shopping_list_for_display(&list), "🛒 Inköpslistan är tom.");
    }

    #[test]
    fn test_format_list_with_items() {
        let mut salt = ShoppingItem::new("Salt", Some("1 nypa"));
        salt.checked = true;
        let list = ShoppingList {
            profile_id: 1,
            items: vec![ShoppingItem::new("Mjölk", Some("3,5 dl")), salt],
        };

        let output = format_shopping_list_for_display(&list);
        assert!(output.starts_with("🛒 **Inköpslista** (1 kvar av 2)"));
        assert!(output.contains(" 1. [ ] Mjölk 3,5 dl\n"));
        assert!(output.contains(" 2. [x] Salt 1 nypa\n"));
    }
}
