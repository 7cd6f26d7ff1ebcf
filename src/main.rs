//! Matsedel command-line interface
//!
//! Plan the week's meals and keep the shopping list in step with the menu.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use matsedel::config::{AppConfig, LogFormat};
use matsedel::recipe_model::{Recipe, WeeklyMenu, WEEK_DAYS};
use matsedel::units::{all_units, units_by_category, UnitCategory};
use matsedel::{db, menu_service, recipe_import, shopping_service};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Household meal planner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    scope: Scope,

    #[command(subcommand)]
    command: Command,
}

/// Profile and week the command acts on
#[derive(Args, Debug)]
struct Scope {
    /// Profile id; unknown ids fall back to the default profile
    #[arg(short, long, global = true, env = "MATSEDEL_PROFILE")]
    profile: Option<i64>,

    /// ISO week number, defaults to the current week
    #[arg(short, long, global = true)]
    week: Option<u32>,

    /// ISO week year, defaults to the current year
    #[arg(short, long, global = true)]
    year: Option<i32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the unit catalog
    Units {
        /// Only units of this category (weight, volume, spoon, count, other)
        #[arg(long)]
        category: Option<String>,
    },
    /// Manage recipes
    #[command(subcommand)]
    Recipes(RecipeCommand),
    /// Import recipes from a JSON file
    Import {
        file: PathBuf,
    },
    /// Export recipes as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only recipes created by the current profile
        #[arg(long)]
        mine: bool,
    },
    /// Manage the weekly menu
    #[command(subcommand)]
    Menu(MenuCommand),
    /// Manage the shopping list
    #[command(subcommand)]
    Shopping(ShoppingCommand),
    /// Manage profiles
    #[command(subcommand)]
    Profiles(ProfileCommand),
}

#[derive(Subcommand, Debug)]
enum RecipeCommand {
    /// List recipes
    List {
        /// Include archived recipes
        #[arg(long)]
        all: bool,
        /// Only recipes created by the current profile
        #[arg(long)]
        mine: bool,
    },
    /// Search titles, ingredients and tags
    Search { query: String },
    /// Show one recipe
    Show { id: i64 },
    /// Archive a recipe, or restore it with --restore
    Archive {
        id: i64,
        #[arg(long)]
        restore: bool,
    },
    /// Delete a recipe and its menu entries
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum MenuCommand {
    /// Show the week's menu
    Show,
    /// Replace the week's menu, one recipe per day from Monday
    Set {
        #[arg(required = true)]
        recipe_ids: Vec<i64>,
    },
    /// Put recipes on the free days of the week
    Add {
        #[arg(required = true)]
        recipe_ids: Vec<i64>,
    },
    /// Remove a day from the menu and rebuild the shopping list
    Remove { day: String },
    /// Set the responsible profile, or clear it when omitted
    Responsible { profile_id: Option<i64> },
}

#[derive(Subcommand, Debug)]
enum ShoppingCommand {
    /// Build the shopping list from the week's menu
    Generate,
    /// Show the shopping list
    Show,
    /// Check or uncheck an item by its number in the list
    Toggle { number: usize },
    /// Add an item by hand
    Add { name: String, amount: Option<String> },
    /// Remove an item by its number in the list
    Remove { number: usize },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// List profiles
    List,
    /// Create a profile
    Add {
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Subscriber first, so configuration warnings are not lost
    init_tracing(LogFormat::from_env());
    let config = AppConfig::from_env();

    let cli = Cli::parse();

    info!(database_url = %config.database_url, "Starting meal planner");

    let pool = db::connect(&config).await?;
    db::init_database_schema(&pool).await?;

    let profile_id = db::resolve_profile_id(&pool, cli.scope.profile, config.default_profile_id).await?;
    let (week, year) = (cli.scope.week, cli.scope.year);

    match cli.command {
        Command::Units { category } => print_units(category.as_deref())?,
        Command::Recipes(command) => run_recipe_command(&pool, profile_id, command).await?,
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let summary = recipe_import::import_recipes_json(&pool, &json, profile_id).await?;
            println!("{}", summary);
        }
        Command::Export { output, mine } => {
            let json = recipe_import::export_recipes_json(&pool, mine.then_some(profile_id)).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Recept exporterade till {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::Menu(command) => run_menu_command(&pool, profile_id, week, year, command).await?,
        Command::Shopping(command) => run_shopping_command(&pool, profile_id, week, year, command).await?,
        Command::Profiles(command) => run_profile_command(&pool, command).await?,
    }

    Ok(())
}

/// Initialize the tracing subscriber on stderr, honouring `RUST_LOG`
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,matsedel=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Plain => builder.init(),
    }
}

fn print_units(category: Option<&str>) -> Result<()> {
    let units = match category {
        Some(name) => match UnitCategory::parse(name) {
            Some(category) => units_by_category(category),
            None => bail!("Unknown unit category: {}", name),
        },
        None => all_units().iter().collect(),
    };

    for unit in units {
        let summable = if unit.summable { "" } else { " (summeras inte)" };
        println!(
            "{:<12} {:<8} {} / {}{}",
            unit.code,
            unit.category.as_str(),
            unit.display_name,
            unit.plural_display_name,
            summable
        );
    }
    Ok(())
}

async fn run_recipe_command(pool: &SqlitePool, profile_id: i64, command: RecipeCommand) -> Result<()> {
    match command {
        RecipeCommand::List { all, mine } => {
            let recipes = db::list_recipes(pool, mine.then_some(profile_id), all).await?;
            print_recipe_list(&recipes);
        }
        RecipeCommand::Search { query } => {
            let recipes = db::search_recipes(pool, &query, None, false).await?;
            print_recipe_list(&recipes);
        }
        RecipeCommand::Show { id } => match db::get_recipe(pool, id).await? {
            Some(recipe) => print_recipe(&recipe),
            None => bail!("Recipe not found: {}", id),
        },
        RecipeCommand::Archive { id, restore } => {
            if !db::set_recipe_archived(pool, id, !restore).await? {
                bail!("Recipe not found: {}", id);
            }
            println!("{}", if restore { "Receptet är återställt." } else { "Receptet är arkiverat." });
        }
        RecipeCommand::Delete { id } => {
            if !db::delete_recipe(pool, id).await? {
                bail!("Recipe not found: {}", id);
            }
            println!("Receptet är borttaget.");
        }
    }
    Ok(())
}

async fn run_menu_command(
    pool: &SqlitePool,
    profile_id: i64,
    week: Option<u32>,
    year: Option<i32>,
    command: MenuCommand,
) -> Result<()> {
    let menu = match command {
        MenuCommand::Show => db::get_menu(pool, profile_id, week, year).await?,
        MenuCommand::Set { recipe_ids } => {
            menu_service::create_weekly_menu(pool, profile_id, &recipe_ids, week, year).await?
        }
        MenuCommand::Add { recipe_ids } => {
            menu_service::add_to_menu(pool, profile_id, &recipe_ids, week, year).await?
        }
        MenuCommand::Remove { day } => {
            let (menu, list) = menu_service::remove_day(pool, profile_id, &day, week, year).await?;
            println!("Inköpslistan har nu {} rader.", list.items.len());
            menu
        }
        MenuCommand::Responsible { profile_id: responsible } => {
            menu_service::assign_responsible(pool, profile_id, responsible, week, year).await?
        }
    };
    print_menu(pool, &menu).await
}

async fn run_shopping_command(
    pool: &SqlitePool,
    profile_id: i64,
    week: Option<u32>,
    year: Option<i32>,
    command: ShoppingCommand,
) -> Result<()> {
    let list = match command {
        ShoppingCommand::Generate => {
            shopping_service::build_shopping_list_for_menu(pool, profile_id, week, year).await?
        }
        ShoppingCommand::Show => db::get_shopping_list(pool, profile_id).await?,
        ShoppingCommand::Toggle { number } => {
            db::toggle_shopping_item(pool, profile_id, list_index(number)?).await?
        }
        ShoppingCommand::Add { name, amount } => {
            db::add_shopping_item(pool, profile_id, &name, amount.as_deref()).await?
        }
        ShoppingCommand::Remove { number } => {
            if !db::delete_shopping_item(pool, profile_id, list_index(number)?).await? {
                bail!("No shopping item number {}", number);
            }
            db::get_shopping_list(pool, profile_id).await?
        }
    };
    print!("{}", shopping_service::format_shopping_list_for_display(&list));
    Ok(())
}

async fn run_profile_command(pool: &SqlitePool, command: ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::List => {
            for profile in db::list_profiles(pool).await? {
                match profile.email {
                    Some(email) => println!("#{} {} <{}>", profile.id, profile.name, email),
                    None => println!("#{} {}", profile.id, profile.name),
                }
            }
        }
        ProfileCommand::Add { name, email } => {
            let profile = db::create_profile(pool, &name, email.as_deref(), None).await?;
            println!("Skapade profil #{} {}", profile.id, profile.name);
        }
    }
    Ok(())
}

/// Convert a 1-based list number into an index
fn list_index(number: usize) -> Result<usize> {
    match number.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("List numbers start at 1"),
    }
}

fn print_recipe_list(recipes: &[Recipe]) {
    if recipes.is_empty() {
        println!("Inga recept hittades.");
    }
    for recipe in recipes {
        println!("{}", recipe);
    }
}

fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe);
    if let Some(description) = &recipe.description {
        println!("{}", description);
    }
    println!("\nIngredienser:");
    for ingredient in &recipe.ingredients {
        println!("  - {}", ingredient);
    }
    if !recipe.steps.is_empty() {
        println!("\nGör så här:");
        for (number, step) in recipe.steps.iter().enumerate() {
            println!("  {}. {}", number + 1, step);
        }
    }
    if !recipe.tags.is_empty() {
        println!("\nTaggar: {}", recipe.tags.join(", "));
    }
}

async fn print_menu(pool: &SqlitePool, menu: &WeeklyMenu) -> Result<()> {
    println!("Vecka {} {}", menu.week_number, menu.year);
    if let Some(responsible) = menu.responsible_profile_id {
        let name = db::get_profile(pool, responsible)
            .await?
            .map(|profile| profile.name)
            .unwrap_or_else(|| format!("#{}", responsible));
        println!("Ansvarig: {}", name);
    }

    for day in WEEK_DAYS {
        let recipe_id = menu
            .entries
            .iter()
            .find(|entry| entry.day == day)
            .and_then(|entry| entry.recipe_id);
        let title = match recipe_id {
            Some(id) => db::get_recipe(pool, id)
                .await?
                .map(|recipe| recipe.title)
                .unwrap_or_else(|| format!("okänt recept #{}", id)),
            None => "-".to_string(),
        };
        println!("{:<8} {}", day, title);
    }
    Ok(())
}
