//! Subcommand implementations
//!
//! Every command that talks to the database builds its own
//! [`DatabaseManager`] from the resolved configuration and closes it before
//! returning.

use anyhow::{Context, Result};
use cxlab_db::config::DATABASE_URL_ENV;
use cxlab_db::{DatabaseConfig, DatabaseManager};

pub mod check;
pub mod health;
pub mod query;
pub mod schema;

/// `--database-url` wins; otherwise the environment (including .env files).
pub fn database_config(url: Option<&str>) -> cxlab_db::Result<DatabaseConfig> {
    DatabaseConfig::from_lookup(|key| match (key, url) {
        (DATABASE_URL_ENV, Some(url)) => Some(url.to_string()),
        _ => std::env::var(key).ok(),
    })
}

pub fn connect(url: Option<&str>) -> Result<DatabaseManager> {
    let config = database_config(url).context("failed to load database configuration")?;
    DatabaseManager::new(&config).context("failed to initialize database connection")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_wins() {
        let config = database_config(Some("postgres://cli-host/cx")).unwrap();
        assert_eq!(config.url, "postgres://cli-host/cx");
    }
}
