//! Environment-driven configuration.
//!
//! `DATABASE_URL` is the privileged service connection string and the
//! only required setting; everything else has the reference defaults.
//! The `.env` file, when present, is loaded by the binary before this
//! module reads the environment.

use std::env;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};
use crate::fixtures::FixturePolicy;

/// Path the application's migration workflow writes the RLS policies to.
pub const DEFAULT_MIGRATION_PATH: &str = "db/prisma/migrations/001_rls_init/migration.sql";

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub database_url: String,
    pub migration_path: PathBuf,
    /// Treat fixture failures as fatal (CI mode).
    pub strict_fixtures: bool,
    /// Skip migration and seed application entirely.
    pub skip_fixtures: bool,
}

impl HarnessConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            database_url: require("DATABASE_URL")?,
            migration_path: env::var("RLS_VERIFY_MIGRATION")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MIGRATION_PATH)),
            strict_fixtures: flag("RLS_VERIFY_STRICT_FIXTURES")?,
            skip_fixtures: flag("RLS_VERIFY_SKIP_FIXTURES")?,
        })
    }

    pub fn fixture_policy(&self) -> FixturePolicy {
        if self.strict_fixtures {
            FixturePolicy::Strict
        } else {
            FixturePolicy::ContinueOnError
        }
    }
}

fn require(name: &'static str) -> ConfigResult<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingVar { name })
}

fn flag(name: &'static str) -> ConfigResult<bool> {
    parse_flag(name, env::var(name).ok().as_deref())
}

fn parse_flag(name: &'static str, value: Option<&str>) -> ConfigResult<bool> {
    match value {
        None => Ok(false),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "" | "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidVar {
                name,
                value: raw.to_string(),
            }),
        },
    }
}
