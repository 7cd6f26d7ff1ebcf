//! # Planner Error Types
//!
//! Domain errors raised by the menu, shopping and import operations. Storage
//! failures travel as `anyhow::Error` with context; these variants are wrapped in
//! it as well and can be recovered with `downcast_ref::<PlannerError>()`.
//!
//! Amount parsing has no error type: unreadable amounts become pass-through lines.

use thiserror::Error;

/// Errors of the planning workflow
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    /// A menu was requested without any recipe ids
    #[error("No recipes selected")]
    NoRecipesSelected,
    /// A shopping list was requested for a menu without recipes
    #[error("No weekly menu to build a shopping list from")]
    EmptyMenu,
    /// The recipe id does not exist
    #[error("Recipe not found: {0}")]
    RecipeNotFound(i64),
    /// The profile id does not exist
    #[error("Profile not found: {0}")]
    ProfileNotFound(i64),
    /// The import payload could not be used
    #[error("Invalid import: {0}")]
    InvalidImport(String),
    /// The day is not one of the menu weekdays
    #[error("Invalid day: {0}")]
    InvalidDay(String),
}
