//! # Application Configuration Module
//!
//! This module defines the runtime configuration of the planner: where the
//! database lives, how many connections to open, which profile is the default
//! and how logs are written. Values come from the environment (optionally via a
//! `.env` file) and fall back to the constants below.

use std::env;
use std::path::PathBuf;
use tracing::warn;

// Constants for the default configuration
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/app.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_PROFILE_ID: i64 = 1;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Plain,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT` from the process environment
    ///
    /// Available before the rest of the configuration, so the subscriber can be
    /// installed before any configuration warning is logged.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read `LOG_FORMAT` from any key lookup; anything but "json" is plain
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("LOG_FORMAT").map(|v| v.trim().to_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        }
    }
}

/// Configuration structure for the planner
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// SQLite URL (e.g. "sqlite://data/app.db" or "sqlite::memory:")
    pub database_url: String,
    /// Maximum number of pooled connections for file databases
    pub max_connections: u32,
    /// Profile used when none is given or the given one is unknown
    pub default_profile_id: i64,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            default_profile_id: DEFAULT_PROFILE_ID,
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Load the configuration from the process environment
    ///
    /// Reads `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`, `DEFAULT_PROFILE_ID` and
    /// `LOG_FORMAT`. Missing or invalid values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (used by `from_env` and tests)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.database_url);

        let max_connections = parse_or_default(
            "DATABASE_MAX_CONNECTIONS",
            lookup("DATABASE_MAX_CONNECTIONS"),
            defaults.max_connections,
        )
        .max(1);

        let default_profile_id = parse_or_default(
            "DEFAULT_PROFILE_ID",
            lookup("DEFAULT_PROFILE_ID"),
            defaults.default_profile_id,
        );

        let log_format = LogFormat::from_lookup(&lookup);

        Self {
            database_url,
            max_connections,
            default_profile_id,
            log_format,
        }
    }

    /// Check if the database lives only in memory
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// File path of the database, if it is file based
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.is_in_memory() {
            return None;
        }
        let path = self
            .database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }
}

fn parse_or_default<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }),
        None => default,
    }
}
