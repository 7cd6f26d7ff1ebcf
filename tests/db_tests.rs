use anyhow::Result;
use matsedel::config::AppConfig;
use matsedel::db::*;
use matsedel::recipe_model::{
    Ingredient, NewRecipe, ProfileUpdate, RecipeUpdate, ShoppingItem, WEEK_DAYS,
};
use sqlx::SqlitePool;

const WEEK: Option<u32> = Some(12);
const YEAR: Option<i32> = Some(2025);

async fn setup_test_db() -> Result<SqlitePool> {
    open_in_memory().await
}

async fn add_simple_recipe(pool: &SqlitePool, title: &str) -> Result<i64> {
    let recipe = add_recipe(pool, &NewRecipe::new(title).created_by(1)).await?;
    Ok(recipe.id)
}

#[tokio::test]
async fn test_profile_operations() -> Result<()> {
    let pool = setup_test_db().await?;

    let anna = create_profile(&pool, " Anna ", Some("anna@example.com"), Some("  ")).await?;
    assert_eq!(anna.name, "Anna");
    assert_eq!(anna.email.as_deref(), Some("anna@example.com"));
    assert_eq!(anna.avatar_url, None);
    assert_eq!(anna.theme_preference.as_deref(), Some("auto"));

    let update = ProfileUpdate {
        theme_preference: Some("dark".to_string()),
        ..Default::default()
    };
    let updated = update_profile(&pool, anna.id, &update).await?.unwrap();
    assert_eq!(updated.name, "Anna");
    assert_eq!(updated.theme_preference.as_deref(), Some("dark"));

    assert!(update_profile(&pool, 999, &update).await?.is_none());
    assert_eq!(list_profiles(&pool).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_resolve_profile_falls_back_to_default() -> Result<()> {
    let pool = setup_test_db().await?;
    let bo = create_profile(&pool, "Bo", None, None).await?;

    assert_eq!(resolve_profile_id(&pool, None, 1).await?, 1);
    assert_eq!(resolve_profile_id(&pool, Some(bo.id), 1).await?, bo.id);
    assert_eq!(resolve_profile_id(&pool, Some(42), 1).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_recipe_crud() -> Result<()> {
    let pool = setup_test_db().await?;

    let draft = NewRecipe::new("Pannkakor")
        .with_servings(4)
        .with_ingredient(Ingredient::new("Vetemjöl").with_amount("2,5 dl"))
        .with_ingredient(Ingredient::new("Mjölk").with_amount("6 dl"))
        .with_ingredient(Ingredient::new("Salt"))
        .with_step("Vispa")
        .with_step("Stek")
        .with_tag("frukost")
        .created_by(1);

    let stored = add_recipe(&pool, &draft).await?;
    assert_eq!(stored.title, "Pannkakor");
    assert_eq!(stored.ingredients, draft.ingredients);
    assert_eq!(stored.steps, vec!["Vispa", "Stek"]);

    let read = get_recipe(&pool, stored.id).await?.unwrap();
    assert_eq!(read, stored);

    // Only the title changes
    let update = RecipeUpdate {
        title: Some("Tunna pannkakor".to_string()),
        ..Default::default()
    };
    let renamed = update_recipe(&pool, stored.id, &update).await?.unwrap();
    assert_eq!(renamed.title, "Tunna pannkakor");
    assert_eq!(renamed.servings, Some(4));
    assert_eq!(renamed.ingredients.len(), 3);

    // Child lists are replaced wholesale
    let update = RecipeUpdate {
        ingredients: Some(vec![Ingredient::new("Ägg").with_amount("3 st")]),
        tags: Some(vec![]),
        ..Default::default()
    };
    let replaced = update_recipe(&pool, stored.id, &update).await?.unwrap();
    assert_eq!(replaced.ingredients, vec![Ingredient::new("Ägg").with_amount("3 st")]);
    assert!(replaced.tags.is_empty());
    assert_eq!(replaced.steps.len(), 2);

    assert!(update_recipe(&pool, 999, &update).await?.is_none());
    assert!(get_recipe(&pool, 999).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_list_recipes_filters_profile_and_archived() -> Result<()> {
    let pool = setup_test_db().await?;
    let bo = create_profile(&pool, "Bo", None, None).await?;

    add_recipe(&pool, &NewRecipe::new("Bos soppa").created_by(bo.id)).await?;
    let old = add_recipe(&pool, &NewRecipe::new("Bos gamla gryta").created_by(bo.id)).await?;
    assert!(set_recipe_archived(&pool, old.id, true).await?);

    let active = list_recipes(&pool, Some(bo.id), false).await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].title, "Bos soppa");

    assert_eq!(list_recipes(&pool, Some(bo.id), true).await?.len(), 2);

    // Seeded example recipe plus Bo's active one
    assert_eq!(list_recipes(&pool, None, false).await?.len(), 2);

    assert!(set_recipe_archived(&pool, old.id, false).await?);
    assert_eq!(list_recipes(&pool, Some(bo.id), false).await?.len(), 2);
    assert!(!set_recipe_archived(&pool, 999, true).await?);
    Ok(())
}

#[tokio::test]
async fn test_search_recipes() -> Result<()> {
    let pool = setup_test_db().await?;

    add_recipe(
        &pool,
        &NewRecipe::new("Pannkakor")
            .with_ingredient(Ingredient::new("Mjölk").with_amount("6 dl"))
            .with_tag("frukost"),
    )
    .await?;
    add_recipe(&pool, &NewRecipe::new("Köttbullar").with_tag("vardag")).await?;

    let by_title = search_recipes(&pool, "PANN", None, false).await?;
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].title, "Pannkakor");

    let by_ingredient = search_recipes(&pool, "mjölk", None, false).await?;
    assert_eq!(by_ingredient[0].title, "Pannkakor");

    let by_tag = search_recipes(&pool, "vardag", None, false).await?;
    assert_eq!(by_tag[0].title, "Köttbullar");

    assert!(search_recipes(&pool, "sushi", None, false).await?.is_empty());
    assert_eq!(search_recipes(&pool, "  ", None, false).await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_delete_recipe_removes_menu_entries() -> Result<()> {
    let pool = setup_test_db().await?;
    let soup = add_simple_recipe(&pool, "Soppa").await?;
    let stew = add_simple_recipe(&pool, "Gryta").await?;

    replace_menu(&pool, 1, &[soup, stew], WEEK, YEAR).await?;

    assert!(delete_recipe(&pool, soup).await?);
    assert!(get_recipe(&pool, soup).await?.is_none());

    let menu = get_menu(&pool, 1, WEEK, YEAR).await?;
    assert_eq!(menu.recipe_ids(), vec![stew]);

    assert!(!delete_recipe(&pool, soup).await?);
    Ok(())
}

#[tokio::test]
async fn test_replace_menu_fills_at_most_seven_days() -> Result<()> {
    let pool = setup_test_db().await?;
    let mut ids = Vec::new();
    for n in 0..9 {
        ids.push(add_simple_recipe(&pool, &format!("Rätt {}", n)).await?);
    }

    let menu = replace_menu(&pool, 1, &ids, WEEK, YEAR).await?;
    assert_eq!(menu.week_number, 12);
    assert_eq!(menu.year, 2025);
    assert_eq!(menu.entries.len(), 7);
    let days: Vec<&str> = menu.entries.iter().map(|e| e.day.as_str()).collect();
    assert_eq!(days, WEEK_DAYS.to_vec());
    assert_eq!(menu.recipe_ids(), ids[..7].to_vec());

    // Replacing drops the previous entries of the same week
    let menu = replace_menu(&pool, 1, &ids[7..], WEEK, YEAR).await?;
    assert_eq!(menu.recipe_ids(), ids[7..].to_vec());

    // Other weeks are separate
    assert!(get_menu(&pool, 1, Some(13), YEAR).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_append_recipes_uses_free_days() -> Result<()> {
    let pool = setup_test_db().await?;
    let a = add_simple_recipe(&pool, "A").await?;
    let b = add_simple_recipe(&pool, "B").await?;
    let c = add_simple_recipe(&pool, "C").await?;

    replace_menu(&pool, 1, &[a, b], WEEK, YEAR).await?;
    remove_menu_entry(&pool, 1, "Måndag", WEEK, YEAR).await?;

    let menu = append_recipes(&pool, 1, &[c, a], WEEK, YEAR).await?;
    let placed: Vec<(&str, Option<i64>)> = menu
        .entries
        .iter()
        .map(|e| (e.day.as_str(), e.recipe_id))
        .collect();
    assert_eq!(
        placed,
        vec![("Tisdag", Some(b)), ("Måndag", Some(c)), ("Onsdag", Some(a))]
    );

    let unchanged = append_recipes(&pool, 1, &[], WEEK, YEAR).await?;
    assert_eq!(unchanged.entries.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_menus_are_per_profile() -> Result<()> {
    let pool = setup_test_db().await?;
    let bo = create_profile(&pool, "Bo", None, None).await?;
    let a = add_simple_recipe(&pool, "A").await?;

    replace_menu(&pool, 1, &[a], WEEK, YEAR).await?;
    assert!(get_menu(&pool, bo.id, WEEK, YEAR).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_responsible_profile_belongs_to_its_week() -> Result<()> {
    let pool = setup_test_db().await?;
    let bo = create_profile(&pool, "Bo", None, None).await?;
    let a = add_simple_recipe(&pool, "A").await?;

    let menu = set_responsible(&pool, 1, Some(bo.id), WEEK, YEAR).await?;
    assert_eq!(menu.responsible_profile_id, Some(bo.id));

    // Rewriting the same week keeps the responsible profile
    let menu = replace_menu(&pool, 1, &[a], WEEK, YEAR).await?;
    assert_eq!(menu.responsible_profile_id, Some(bo.id));

    // Another week does not inherit it
    let other = get_menu(&pool, 1, Some(20), YEAR).await?;
    assert_eq!(other.responsible_profile_id, None);

    let cleared = set_responsible(&pool, 1, None, WEEK, YEAR).await?;
    assert_eq!(cleared.responsible_profile_id, None);
    Ok(())
}

#[tokio::test]
async fn test_replace_shopping_list() -> Result<()> {
    let pool = setup_test_db().await?;

    let first = vec![
        ShoppingItem::new("Mjölk", Some("3,5 dl")),
        ShoppingItem::new("Salt", Some("1 nypa")),
    ];
    let list = replace_shopping_list(&pool, 1, &first).await?;
    assert_eq!(list.items, first);

    let second = vec![ShoppingItem::new("Ägg", Some("6 st"))];
    let list = replace_shopping_list(&pool, 1, &second).await?;
    assert_eq!(list.items, second);

    // Another profile's list is untouched
    let bo = create_profile(&pool, "Bo", None, None).await?;
    replace_shopping_list(&pool, bo.id, &first).await?;
    assert_eq!(get_shopping_list(&pool, 1).await?.items, second);

    let emptied = replace_shopping_list(&pool, 1, &[]).await?;
    assert!(emptied.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_replace_keeps_previous_list() -> Result<()> {
    let pool = setup_test_db().await?;
    let previous = vec![ShoppingItem::new("Mjölk", Some("2 dl"))];
    replace_shopping_list(&pool, 1, &previous).await?;

    // Make the second insert of the next replace fail
    sqlx::query(
        "CREATE TRIGGER reject_eggs BEFORE INSERT ON shopping_items
         WHEN NEW.name = 'Ägg'
         BEGIN
             SELECT RAISE(ABORT, 'no eggs');
         END",
    )
    .execute(&pool)
    .await?;

    let next = vec![
        ShoppingItem::new("Salt", Some("1 nypa")),
        ShoppingItem::new("Ägg", Some("2 st")),
    ];
    assert!(replace_shopping_list(&pool, 1, &next).await.is_err());

    assert_eq!(get_shopping_list(&pool, 1).await?.items, previous);
    Ok(())
}

#[tokio::test]
async fn test_toggle_targets_one_row() -> Result<()> {
    let pool = setup_test_db().await?;

    // Two identical pass-through lines
    let items = vec![
        ShoppingItem::new("Salt", Some("1 nypa")),
        ShoppingItem::new("Salt", Some("1 nypa")),
    ];
    replace_shopping_list(&pool, 1, &items).await?;

    let list = toggle_shopping_item(&pool, 1, 1).await?;
    assert!(!list.items[0].checked);
    assert!(list.items[1].checked);
    assert_eq!(list.remaining_count(), 1);

    let list = toggle_shopping_item(&pool, 1, 1).await?;
    assert!(!list.items[1].checked);

    let list = toggle_shopping_item(&pool, 1, 5).await?;
    assert_eq!(list.remaining_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_add_and_delete_shopping_items() -> Result<()> {
    let pool = setup_test_db().await?;

    add_shopping_item(&pool, 1, "Kaffe", None).await?;
    let list = add_shopping_item(&pool, 1, " Bröd ", Some("1 st")).await?;
    assert_eq!(
        list.items,
        vec![
            ShoppingItem::new("Kaffe", None),
            ShoppingItem::new("Bröd", Some("1 st")),
        ]
    );

    assert!(delete_shopping_item(&pool, 1, 0).await?);
    assert!(!delete_shopping_item(&pool, 1, 3).await?);
    assert_eq!(get_shopping_list(&pool, 1).await?.items, vec![ShoppingItem::new("Bröd", Some("1 st"))]);
    Ok(())
}

#[tokio::test]
async fn test_file_database_persists() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("app.db");
    let config = AppConfig {
        database_url: format!("sqlite://{}", path.display()),
        ..AppConfig::default()
    };

    {
        let pool = connect(&config).await?;
        init_database_schema(&pool).await?;
        add_shopping_item(&pool, 1, "Kaffe", None).await?;
        pool.close().await;
    }
    assert!(path.exists());

    let pool = connect(&config).await?;
    init_database_schema(&pool).await?;
    assert_eq!(get_shopping_list(&pool, 1).await?.items.len(), 1);
    assert_eq!(list_profiles(&pool).await?.len(), 1);
    Ok(())
}
