//! # Matsedel
//!
//! Household meal planning: recipes, weekly menus per profile and a shopping
//! list aggregated from the week's recipes.
//!
//! The aggregation core ([`units`], [`amount_parser`], [`shopping_aggregator`])
//! is pure and synchronous. Storage ([`db`]) and the workflows built on it
//! ([`menu_service`], [`shopping_service`], [`recipe_import`]) are async over a
//! SQLite pool.

pub mod amount_parser;
pub mod config;
pub mod db;
pub mod errors;
pub mod menu_service;
pub mod recipe_import;
pub mod recipe_model;
pub mod shopping_aggregator;
pub mod shopping_service;
pub mod units;
