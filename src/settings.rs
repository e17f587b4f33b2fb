use std::{env, path::Path};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::MAX_SESSION_LIFETIME_HOURS;
use crate::RECIPE_COUNT_PER_PAGE;
use crate::SUBSCRIPTION_RECIPES_LIMIT;

#[derive(Debug, Deserialize, Clone)]
pub struct SdkConfig {
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub lifetime_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    /// How many recipes are embedded per author in subscription listings
    #[serde(default = "default_recipes_limit")]
    pub recipes_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            recipes_limit: default_recipes_limit(),
        }
    }
}

fn default_page_size() -> i64 {
    RECIPE_COUNT_PER_PAGE
}

fn default_recipes_limit() -> i64 {
    SUBSCRIPTION_RECIPES_LIMIT
}

impl SdkConfig {
    /// Loads configuration, highest priority first:
    /// 1. `DATABASE_URL` / `SESSION_SECRET`
    /// 2. `FOODGRAM__*` environment variables (`FOODGRAM__DATABASE__URL`, ...)
    /// 3. the TOML file at `path` or `FOODGRAM_CONFIG`, if it exists
    /// 4. defaults
    pub fn load(path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("database.url", "postgres://localhost/foodgram")?
            .set_default("database.max_connections", 5)?
            .set_default("session.lifetime_hours", 24)?;

        let path = path
            .or_else(|| env::var("FOODGRAM_CONFIG").ok())
            .unwrap_or_else(|| "config/foodgram.toml".to_owned());

        if Path::new(&path).exists() {
            builder = builder.add_source(File::with_name(&path));
        }

        builder = builder.add_source(
            Environment::with_prefix("FOODGRAM")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }
        if let Ok(secret) = env::var("SESSION_SECRET") {
            builder = builder.set_override("session.secret", secret)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.session.secret.len() < 32 {
            return Err("Session secret must be at least 32 characters long".to_owned());
        }
        if self.session.lifetime_hours <= 0 {
            return Err("Session lifetime must be positive".to_owned());
        }
        if self.session.lifetime_hours > MAX_SESSION_LIFETIME_HOURS {
            return Err(format!(
                "Session lifetime can't exceed {MAX_SESSION_LIFETIME_HOURS} hours"
            ));
        }
        if self.database.max_connections < 1 {
            return Err("Database max_connections must be at least 1".to_owned());
        }
        if self.pagination.page_size < 1 {
            return Err("Page size must be at least 1".to_owned());
        }
        if self.pagination.recipes_limit < 0 {
            return Err("Recipes limit can't be negative".to_owned());
        }
        Ok(())
    }
}
