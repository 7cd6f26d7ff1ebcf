//! # Database Module
//!
//! SQLite storage for profiles, recipes, weekly menus and shopping lists, built
//! on a `sqlx` connection pool.
//!
//! Every profile owns its own menus and shopping list. Recipes carry the profile
//! that created them. Child rows (ingredients, steps, tags) keep their insertion
//! order through their row id.
//!
//! Multi-statement writes run in a transaction so that a failure leaves the
//! previous state in place.

use crate::config::AppConfig;
use crate::recipe_model::{
    resolve_week, Ingredient, MenuEntry, NewRecipe, Profile, ProfileUpdate, Recipe, RecipeUpdate,
    ShoppingItem, ShoppingList, WeeklyMenu, WEEK_DAYS,
};
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Name of the profile created on an empty database
pub const DEFAULT_PROFILE_NAME: &str = "Hushållet";

#[derive(Debug, sqlx::FromRow)]
struct RecipeRow {
    id: i64,
    title: String,
    description: Option<String>,
    servings: Option<i64>,
    image_url: Option<String>,
    archived: Option<bool>,
    created_by: Option<i64>,
}

/// Open a connection pool for the configured database
///
/// File databases get their parent directory created. In-memory databases use a
/// single connection that is never recycled, otherwise each new connection
/// would see an empty database.
pub async fn connect(config: &AppConfig) -> Result<SqlitePool> {
    info!(database_url = %config.database_url, "Connecting to database");

    if let Some(path) = config.database_path() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }

    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("Invalid database URL: {}", config.database_url))?
        .create_if_missing(true);

    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    info!("Database connection established");
    Ok(pool)
}

/// Open a fresh in-memory database with schema and seed data
pub async fn open_in_memory() -> Result<SqlitePool> {
    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        ..AppConfig::default()
    };
    let pool = connect(&config).await?;
    init_database_schema(&pool).await?;
    Ok(pool)
}

/// Initialize the database schema and seed an empty database
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            avatar_url TEXT,
            theme_preference TEXT DEFAULT 'auto'
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create profiles table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            servings INTEGER,
            image_url TEXT,
            archived INTEGER NOT NULL DEFAULT 0,
            created_by INTEGER
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create recipes table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            amount TEXT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create ingredients table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS steps (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL,
            content TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create steps table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL,
            name TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create tags table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS menu_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            profile_id INTEGER NOT NULL,
            day TEXT NOT NULL,
            recipe_id INTEGER,
            week_number INTEGER,
            year INTEGER
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create menu_entries table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS menu_meta (
            profile_id INTEGER PRIMARY KEY,
            responsible_profile_id INTEGER,
            week_number INTEGER,
            year INTEGER
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create menu_meta table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS shopping_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            profile_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            amount TEXT,
            checked INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create shopping_items table")?;

    // Create indexes for the per-profile lookups
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ingredients_recipe ON ingredients(recipe_id)")
        .execute(pool)
        .await
        .context("Failed to create ingredients index")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_menu_entries_profile ON menu_entries(profile_id, year, week_number)",
    )
    .execute(pool)
    .await
    .context("Failed to create menu_entries index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_shopping_items_profile ON shopping_items(profile_id)")
        .execute(pool)
        .await
        .context("Failed to create shopping_items index")?;

    seed_defaults(pool).await?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Insert a default profile and an example recipe into empty tables
async fn seed_defaults(pool: &SqlitePool) -> Result<()> {
    let profile_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(pool)
        .await
        .context("Failed to count profiles")?;

    if profile_count == 0 {
        sqlx::query("INSERT INTO profiles (id, name, theme_preference) VALUES (1, ?1, 'auto')")
            .bind(DEFAULT_PROFILE_NAME)
            .execute(pool)
            .await
            .context("Failed to seed default profile")?;
        info!(name = DEFAULT_PROFILE_NAME, "Seeded default profile");
    }

    let recipe_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await
        .context("Failed to count recipes")?;

    if recipe_count == 0 {
        let example = NewRecipe::new("Exempelrecept")
            .with_description("Ett enkelt exempel")
            .with_servings(2)
            .with_ingredient(Ingredient::new("Potatis").with_amount("2 st"))
            .with_step("Skala potatis")
            .with_step("Koka tills mjuk")
            .with_tag("enkelt")
            .with_tag("snabbt")
            .created_by(1);
        add_recipe(pool, &example).await?;
        info!("Seeded example recipe");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// List all profiles ordered by id
pub async fn list_profiles(pool: &SqlitePool) -> Result<Vec<Profile>> {
    sqlx::query_as::<_, Profile>(
        "SELECT id, name, email, avatar_url, theme_preference FROM profiles ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list profiles")
}

/// Read a profile by id
pub async fn get_profile(pool: &SqlitePool, profile_id: i64) -> Result<Option<Profile>> {
    sqlx::query_as::<_, Profile>(
        "SELECT id, name, email, avatar_url, theme_preference FROM profiles WHERE id = ?1",
    )
    .bind(profile_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to read profile {}", profile_id))
}

/// Create a profile and return it
///
/// Empty email or avatar values are stored as NULL.
pub async fn create_profile(
    pool: &SqlitePool,
    name: &str,
    email: Option<&str>,
    avatar_url: Option<&str>,
) -> Result<Profile> {
    info!(name, "Creating profile");

    let profile_id = sqlx::query(
        "INSERT INTO profiles (name, email, avatar_url, theme_preference) VALUES (?1, ?2, ?3, 'auto')",
    )
    .bind(name.trim())
    .bind(non_blank(email))
    .bind(non_blank(avatar_url))
    .execute(pool)
    .await
    .context("Failed to insert profile")?
    .last_insert_rowid();

    get_profile(pool, profile_id)
        .await?
        .with_context(|| format!("Profile {} missing after insert", profile_id))
}

/// Update the given fields of a profile
///
/// Returns `None` when the profile does not exist.
pub async fn update_profile(
    pool: &SqlitePool,
    profile_id: i64,
    update: &ProfileUpdate,
) -> Result<Option<Profile>> {
    info!(profile_id, "Updating profile");

    let result = sqlx::query(
        "UPDATE profiles SET
            name = COALESCE(?1, name),
            email = COALESCE(?2, email),
            avatar_url = COALESCE(?3, avatar_url),
            theme_preference = COALESCE(?4, theme_preference)
         WHERE id = ?5",
    )
    .bind(update.name.as_deref())
    .bind(update.email.as_deref())
    .bind(update.avatar_url.as_deref())
    .bind(update.theme_preference.as_deref())
    .bind(profile_id)
    .execute(pool)
    .await
    .context("Failed to update profile")?;

    if result.rows_affected() == 0 {
        info!(profile_id, "No profile found");
        return Ok(None);
    }
    get_profile(pool, profile_id).await
}

/// Resolve the profile to act as
///
/// An unknown or missing id falls back to `default_id`.
pub async fn resolve_profile_id(
    pool: &SqlitePool,
    profile_id: Option<i64>,
    default_id: i64,
) -> Result<i64> {
    let Some(profile_id) = profile_id else {
        return Ok(default_id);
    };
    if get_profile(pool, profile_id).await?.is_some() {
        Ok(profile_id)
    } else {
        warn!(profile_id, default_id, "Unknown profile, using default");
        Ok(default_id)
    }
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// List recipes ordered by id
///
/// # Arguments
///
/// * `profile_id` - Only recipes created by this profile, or all when `None`
/// * `include_archived` - Whether archived recipes are part of the result
pub async fn list_recipes(
    pool: &SqlitePool,
    profile_id: Option<i64>,
    include_archived: bool,
) -> Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(
        "SELECT id, title, description, servings, image_url, archived, created_by
         FROM recipes
         WHERE (?1 IS NULL OR created_by = ?1)
           AND (?2 OR COALESCE(archived, 0) = 0)
         ORDER BY id",
    )
    .bind(profile_id)
    .bind(include_archived)
    .fetch_all(pool)
    .await
    .context("Failed to list recipes")?;

    let mut recipes = Vec::with_capacity(rows.len());
    for row in rows {
        recipes.push(load_recipe_children(pool, row).await?);
    }
    debug!(count = recipes.len(), "Listed recipes");
    Ok(recipes)
}

/// Read a recipe with its ingredients, steps and tags
pub async fn get_recipe(pool: &SqlitePool, recipe_id: i64) -> Result<Option<Recipe>> {
    let row = sqlx::query_as::<_, RecipeRow>(
        "SELECT id, title, description, servings, image_url, archived, created_by
         FROM recipes WHERE id = ?1",
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to read recipe {}", recipe_id))?;

    match row {
        Some(row) => Ok(Some(load_recipe_children(pool, row).await?)),
        None => {
            debug!(recipe_id, "No recipe found");
            Ok(None)
        }
    }
}

/// Read several recipes, keeping the order of `recipe_ids`
///
/// Ids without a recipe are skipped; duplicates yield the recipe again.
pub async fn get_recipes(pool: &SqlitePool, recipe_ids: &[i64]) -> Result<Vec<Recipe>> {
    let mut recipes = Vec::with_capacity(recipe_ids.len());
    for &recipe_id in recipe_ids {
        match get_recipe(pool, recipe_id).await? {
            Some(recipe) => recipes.push(recipe),
            None => warn!(recipe_id, "Menu refers to a missing recipe"),
        }
    }
    Ok(recipes)
}

async fn load_recipe_children(pool: &SqlitePool, row: RecipeRow) -> Result<Recipe> {
    let ingredients = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT name, amount FROM ingredients WHERE recipe_id = ?1 ORDER BY id",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await
    .context("Failed to read ingredients")?
    .into_iter()
    .map(|(name, amount)| Ingredient { name, amount })
    .collect();

    let steps = sqlx::query_scalar::<_, String>(
        "SELECT content FROM steps WHERE recipe_id = ?1 ORDER BY id",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await
    .context("Failed to read steps")?;

    let tags = sqlx::query_scalar::<_, String>(
        "SELECT name FROM tags WHERE recipe_id = ?1 ORDER BY id",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await
    .context("Failed to read tags")?;

    Ok(Recipe {
        id: row.id,
        title: row.title,
        description: row.description,
        servings: row.servings,
        image_url: row.image_url,
        archived: row.archived.unwrap_or(false),
        ingredients,
        steps,
        tags,
        created_by: row.created_by,
    })
}

/// Store a new recipe and return it with its id
pub async fn add_recipe(pool: &SqlitePool, recipe: &NewRecipe) -> Result<Recipe> {
    info!(title = %recipe.title, "Adding recipe");

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let recipe_id = insert_recipe(&mut tx, recipe).await?;
    tx.commit().await.context("Failed to commit recipe")?;

    info!(recipe_id, "Recipe added");
    get_recipe(pool, recipe_id)
        .await?
        .with_context(|| format!("Recipe {} missing after insert", recipe_id))
}

/// Store several recipes in one transaction and return their ids
///
/// Either all recipes are stored or none.
pub async fn add_recipes(pool: &SqlitePool, recipes: &[NewRecipe]) -> Result<Vec<i64>> {
    info!(count = recipes.len(), "Adding recipes");

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut ids = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let recipe_id = insert_recipe(&mut tx, recipe)
            .await
            .with_context(|| format!("Failed to store recipe '{}'", recipe.title))?;
        ids.push(recipe_id);
    }
    tx.commit().await.context("Failed to commit recipes")?;

    Ok(ids)
}

async fn insert_recipe(conn: &mut SqliteConnection, recipe: &NewRecipe) -> Result<i64> {
    let recipe_id = sqlx::query(
        "INSERT INTO recipes (title, description, servings, image_url, archived, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&recipe.title)
    .bind(recipe.description.as_deref())
    .bind(recipe.servings)
    .bind(recipe.image_url.as_deref())
    .bind(recipe.archived)
    .bind(recipe.created_by)
    .execute(&mut *conn)
    .await
    .context("Failed to insert recipe")?
    .last_insert_rowid();

    replace_ingredients(conn, recipe_id, &recipe.ingredients).await?;
    replace_steps(conn, recipe_id, &recipe.steps).await?;
    replace_tags(conn, recipe_id, &recipe.tags).await?;

    Ok(recipe_id)
}

/// Update the given fields of a recipe
///
/// Returns `None` when the recipe does not exist.
pub async fn update_recipe(
    pool: &SqlitePool,
    recipe_id: i64,
    update: &RecipeUpdate,
) -> Result<Option<Recipe>> {
    info!(recipe_id, "Updating recipe");

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        "UPDATE recipes SET
            title = COALESCE(?1, title),
            description = COALESCE(?2, description),
            servings = COALESCE(?3, servings),
            image_url = COALESCE(?4, image_url),
            archived = COALESCE(?5, archived)
         WHERE id = ?6",
    )
    .bind(update.title.as_deref())
    .bind(update.description.as_deref())
    .bind(update.servings)
    .bind(update.image_url.as_deref())
    .bind(update.archived)
    .bind(recipe_id)
    .execute(&mut *tx)
    .await
    .context("Failed to update recipe")?;

    if result.rows_affected() == 0 {
        info!(recipe_id, "No recipe found");
        return Ok(None);
    }

    if let Some(ingredients) = &update.ingredients {
        replace_ingredients(&mut tx, recipe_id, ingredients).await?;
    }
    if let Some(steps) = &update.steps {
        replace_steps(&mut tx, recipe_id, steps).await?;
    }
    if let Some(tags) = &update.tags {
        replace_tags(&mut tx, recipe_id, tags).await?;
    }

    tx.commit().await.context("Failed to commit recipe update")?;
    get_recipe(pool, recipe_id).await
}

/// Archive or restore a recipe
pub async fn set_recipe_archived(pool: &SqlitePool, recipe_id: i64, archived: bool) -> Result<bool> {
    info!(recipe_id, archived, "Setting recipe archive flag");

    let result = sqlx::query("UPDATE recipes SET archived = ?1 WHERE id = ?2")
        .bind(archived)
        .bind(recipe_id)
        .execute(pool)
        .await
        .context("Failed to update archive flag")?;

    Ok(result.rows_affected() > 0)
}

/// Delete a recipe, its child rows and the menu entries pointing at it
pub async fn delete_recipe(pool: &SqlitePool, recipe_id: i64) -> Result<bool> {
    info!(recipe_id, "Deleting recipe");

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    for table in ["ingredients", "steps", "tags", "menu_entries"] {
        sqlx::query(&format!("DELETE FROM {} WHERE recipe_id = ?1", table))
            .bind(recipe_id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to delete from {}", table))?;
    }

    let result = sqlx::query("DELETE FROM recipes WHERE id = ?1")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete recipe")?;

    tx.commit().await.context("Failed to commit recipe deletion")?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        info!(recipe_id, "Recipe deleted");
    } else {
        info!(recipe_id, "No recipe found");
    }
    Ok(deleted)
}

/// Case-insensitive substring search over titles, ingredient names and tags
///
/// An empty query returns the same recipes as [`list_recipes`].
pub async fn search_recipes(
    pool: &SqlitePool,
    query: &str,
    profile_id: Option<i64>,
    include_archived: bool,
) -> Result<Vec<Recipe>> {
    let needle = query.trim().to_lowercase();
    let recipes = list_recipes(pool, profile_id, include_archived).await?;
    if needle.is_empty() {
        return Ok(recipes);
    }

    let matches: Vec<Recipe> = recipes
        .into_iter()
        .filter(|recipe| {
            recipe.title.to_lowercase().contains(&needle)
                || recipe
                    .ingredients
                    .iter()
                    .any(|ingredient| ingredient.name.to_lowercase().contains(&needle))
                || recipe.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
        })
        .collect();

    debug!(query = %needle, count = matches.len(), "Searched recipes");
    Ok(matches)
}

async fn replace_ingredients(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    ingredients: &[Ingredient],
) -> Result<()> {
    sqlx::query("DELETE FROM ingredients WHERE recipe_id = ?1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear ingredients")?;

    for ingredient in ingredients {
        sqlx::query("INSERT INTO ingredients (recipe_id, name, amount) VALUES (?1, ?2, ?3)")
            .bind(recipe_id)
            .bind(&ingredient.name)
            .bind(ingredient.amount.as_deref())
            .execute(&mut *conn)
            .await
            .context("Failed to insert ingredient")?;
    }
    Ok(())
}

async fn replace_steps(conn: &mut SqliteConnection, recipe_id: i64, steps: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM steps WHERE recipe_id = ?1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear steps")?;

    for step in steps {
        sqlx::query("INSERT INTO steps (recipe_id, content) VALUES (?1, ?2)")
            .bind(recipe_id)
            .bind(step)
            .execute(&mut *conn)
            .await
            .context("Failed to insert step")?;
    }
    Ok(())
}

async fn replace_tags(conn: &mut SqliteConnection, recipe_id: i64, tags: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM tags WHERE recipe_id = ?1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear tags")?;

    for tag in tags {
        sqlx::query("INSERT INTO tags (recipe_id, name) VALUES (?1, ?2)")
            .bind(recipe_id)
            .bind(tag)
            .execute(&mut *conn)
            .await
            .context("Failed to insert tag")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Weekly menus
// ---------------------------------------------------------------------------

/// Read the menu of a profile for a week
///
/// Missing week or year values resolve to the current ISO week. The
/// responsible profile is only reported when it was set for the same week.
pub async fn get_menu(
    pool: &SqlitePool,
    profile_id: i64,
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<WeeklyMenu> {
    let (week_number, year) = resolve_week(week_number, year);

    let entries = sqlx::query_as::<_, MenuEntry>(
        "SELECT day, recipe_id FROM menu_entries
         WHERE profile_id = ?1
           AND (week_number IS NULL OR week_number = ?2)
           AND (year IS NULL OR year = ?3)
         ORDER BY id",
    )
    .bind(profile_id)
    .bind(i64::from(week_number))
    .bind(year)
    .fetch_all(pool)
    .await
    .context("Failed to read menu entries")?;

    let meta = sqlx::query_as::<_, (Option<i64>, Option<i64>, Option<i64>)>(
        "SELECT responsible_profile_id, week_number, year FROM menu_meta WHERE profile_id = ?1",
    )
    .bind(profile_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read menu meta")?;

    let responsible_profile_id = meta.and_then(|(responsible, meta_week, meta_year)| {
        let same_week = meta_week.map_or(true, |w| w == i64::from(week_number))
            && meta_year.map_or(true, |y| y == i64::from(year));
        if same_week {
            responsible
        } else {
            None
        }
    });

    debug!(profile_id, week_number, year, entries = entries.len(), "Read menu");
    Ok(WeeklyMenu {
        profile_id,
        responsible_profile_id,
        week_number,
        year,
        entries,
    })
}

/// Replace the menu of a week with the given recipes, one per weekday
///
/// Recipes beyond the seventh are ignored. The responsible profile of the
/// previous menu is kept.
pub async fn replace_menu(
    pool: &SqlitePool,
    profile_id: i64,
    recipe_ids: &[i64],
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<WeeklyMenu> {
    let (week, resolved_year) = resolve_week(week_number, year);
    info!(profile_id, week, year = resolved_year, recipes = recipe_ids.len(), "Replacing menu");

    if recipe_ids.len() > WEEK_DAYS.len() {
        warn!(
            ignored = recipe_ids.len() - WEEK_DAYS.len(),
            "More recipes than weekdays, ignoring the rest"
        );
    }

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        "DELETE FROM menu_entries WHERE profile_id = ?1 AND week_number = ?2 AND year = ?3",
    )
    .bind(profile_id)
    .bind(i64::from(week))
    .bind(resolved_year)
    .execute(&mut *tx)
    .await
    .context("Failed to clear menu entries")?;

    for (day, recipe_id) in WEEK_DAYS.iter().zip(recipe_ids) {
        insert_menu_entry(&mut tx, profile_id, day, *recipe_id, week, resolved_year).await?;
    }
    upsert_menu_week(&mut tx, profile_id, week, resolved_year).await?;

    tx.commit().await.context("Failed to commit menu")?;
    get_menu(pool, profile_id, Some(week), Some(resolved_year)).await
}

/// Place recipes on the free days of a week, in weekday order
///
/// Recipes that do not fit on a free day are ignored.
pub async fn append_recipes(
    pool: &SqlitePool,
    profile_id: i64,
    recipe_ids: &[i64],
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<WeeklyMenu> {
    let menu = get_menu(pool, profile_id, week_number, year).await?;
    if recipe_ids.is_empty() {
        return Ok(menu);
    }
    let (week, resolved_year) = (menu.week_number, menu.year);

    let free_days: Vec<&str> = WEEK_DAYS
        .iter()
        .copied()
        .filter(|day| !menu.entries.iter().any(|entry| entry.day == *day))
        .collect();

    info!(profile_id, week, free_days = free_days.len(), "Appending recipes to menu");

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for (day, recipe_id) in free_days.iter().zip(recipe_ids) {
        insert_menu_entry(&mut tx, profile_id, day, *recipe_id, week, resolved_year).await?;
    }
    upsert_menu_week(&mut tx, profile_id, week, resolved_year).await?;
    tx.commit().await.context("Failed to commit menu")?;

    get_menu(pool, profile_id, Some(week), Some(resolved_year)).await
}

/// Remove the entry of one day from the menu
pub async fn remove_menu_entry(
    pool: &SqlitePool,
    profile_id: i64,
    day: &str,
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<WeeklyMenu> {
    let (week, resolved_year) = resolve_week(week_number, year);
    info!(profile_id, day, week, "Removing menu entry");

    let result = sqlx::query(
        "DELETE FROM menu_entries
         WHERE profile_id = ?1 AND day = ?2
           AND (week_number IS NULL OR week_number = ?3)
           AND (year IS NULL OR year = ?4)",
    )
    .bind(profile_id)
    .bind(day)
    .bind(i64::from(week))
    .bind(resolved_year)
    .execute(pool)
    .await
    .context("Failed to delete menu entry")?;

    if result.rows_affected() == 0 {
        debug!(profile_id, day, "No menu entry for day");
    }
    get_menu(pool, profile_id, Some(week), Some(resolved_year)).await
}

/// Set the profile responsible for a week's menu
pub async fn set_responsible(
    pool: &SqlitePool,
    profile_id: i64,
    responsible_profile_id: Option<i64>,
    week_number: Option<u32>,
    year: Option<i32>,
) -> Result<WeeklyMenu> {
    let (week, resolved_year) = resolve_week(week_number, year);
    info!(profile_id, ?responsible_profile_id, week, "Setting responsible profile");

    sqlx::query(
        "INSERT INTO menu_meta (profile_id, responsible_profile_id, week_number, year)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(profile_id) DO UPDATE SET
            responsible_profile_id = excluded.responsible_profile_id,
            week_number = excluded.week_number,
            year = excluded.year",
    )
    .bind(profile_id)
    .bind(responsible_profile_id)
    .bind(i64::from(week))
    .bind(resolved_year)
    .execute(pool)
    .await
    .context("Failed to store responsible profile")?;

    get_menu(pool, profile_id, Some(week), Some(resolved_year)).await
}

async fn insert_menu_entry(
    conn: &mut SqliteConnection,
    profile_id: i64,
    day: &str,
    recipe_id: i64,
    week: u32,
    year: i32,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO menu_entries (profile_id, day, recipe_id, week_number, year)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(profile_id)
    .bind(day)
    .bind(recipe_id)
    .bind(i64::from(week))
    .bind(year)
    .execute(&mut *conn)
    .await
    .context("Failed to insert menu entry")?;
    Ok(())
}

/// Record the week a menu was last written for, keeping the responsible profile
async fn upsert_menu_week(conn: &mut SqliteConnection, profile_id: i64, week: u32, year: i32) -> Result<()> {
    sqlx::query(
        "INSERT INTO menu_meta (profile_id, week_number, year) VALUES (?1, ?2, ?3)
         ON CONFLICT(profile_id) DO UPDATE SET
            week_number = excluded.week_number,
            year = excluded.year",
    )
    .bind(profile_id)
    .bind(i64::from(week))
    .bind(year)
    .execute(&mut *conn)
    .await
    .context("Failed to update menu meta")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Shopping lists
// ---------------------------------------------------------------------------

/// Read the shopping list of a profile in stored order
pub async fn get_shopping_list(pool: &SqlitePool, profile_id: i64) -> Result<ShoppingList> {
    let items = sqlx::query_as::<_, (String, Option<String>, bool)>(
        "SELECT name, amount, checked FROM shopping_items WHERE profile_id = ?1 ORDER BY id",
    )
    .bind(profile_id)
    .fetch_all(pool)
    .await
    .context("Failed to read shopping list")?
    .into_iter()
    .map(|(name, amount, checked)| ShoppingItem { name, amount, checked })
    .collect();

    Ok(ShoppingList { profile_id, items })
}

/// Replace the whole shopping list of a profile
///
/// Runs in one transaction: on failure the previous list stays intact.
pub async fn replace_shopping_list(
    pool: &SqlitePool,
    profile_id: i64,
    items: &[ShoppingItem],
) -> Result<ShoppingList> {
    info!(profile_id, items = items.len(), "Replacing shopping list");

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM shopping_items WHERE profile_id = ?1")
        .bind(profile_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear shopping list")?;

    for item in items {
        sqlx::query(
            "INSERT INTO shopping_items (profile_id, name, amount, checked) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(profile_id)
        .bind(&item.name)
        .bind(item.amount.as_deref())
        .bind(item.checked)
        .execute(&mut *tx)
        .await
        .context("Failed to insert shopping item")?;
    }

    tx.commit().await.context("Failed to commit shopping list")?;
    get_shopping_list(pool, profile_id).await
}

/// Append a manual item to the shopping list
pub async fn add_shopping_item(
    pool: &SqlitePool,
    profile_id: i64,
    name: &str,
    amount: Option<&str>,
) -> Result<ShoppingList> {
    info!(profile_id, name, "Adding shopping item");

    sqlx::query("INSERT INTO shopping_items (profile_id, name, amount, checked) VALUES (?1, ?2, ?3, 0)")
        .bind(profile_id)
        .bind(name.trim())
        .bind(non_blank(amount))
        .execute(pool)
        .await
        .context("Failed to insert shopping item")?;

    get_shopping_list(pool, profile_id).await
}

/// Flip the checked flag of the item at `index` in list order
///
/// Only that row changes, even when other rows share its name and amount. An
/// index past the end leaves the list untouched.
pub async fn toggle_shopping_item(pool: &SqlitePool, profile_id: i64, index: usize) -> Result<ShoppingList> {
    match shopping_item_row_id(pool, profile_id, index).await? {
        Some(row_id) => {
            sqlx::query("UPDATE shopping_items SET checked = NOT checked WHERE id = ?1")
                .bind(row_id)
                .execute(pool)
                .await
                .context("Failed to toggle shopping item")?;
            debug!(profile_id, index, "Toggled shopping item");
        }
        None => warn!(profile_id, index, "No shopping item at index"),
    }
    get_shopping_list(pool, profile_id).await
}

/// Delete the item at `index` in list order
pub async fn delete_shopping_item(pool: &SqlitePool, profile_id: i64, index: usize) -> Result<bool> {
    let Some(row_id) = shopping_item_row_id(pool, profile_id, index).await? else {
        return Ok(false);
    };
    sqlx::query("DELETE FROM shopping_items WHERE id = ?1")
        .bind(row_id)
        .execute(pool)
        .await
        .context("Failed to delete shopping item")?;
    info!(profile_id, index, "Deleted shopping item");
    Ok(true)
}

async fn shopping_item_row_id(pool: &SqlitePool, profile_id: i64, index: usize) -> Result<Option<i64>> {
    let offset = i64::try_from(index).context("Shopping item index out of range")?;
    sqlx::query_scalar::<_, i64>(
        "SELECT id FROM shopping_items WHERE profile_id = ?1 ORDER BY id LIMIT 1 OFFSET ?2",
    )
    .bind(profile_id)
    .bind(offset)
    .fetch_optional(pool)
    .await
    .context("Failed to look up shopping item")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
