//! Error types for cxlab-db
//!
//! Configuration problems are reported before any connection is attempted.
//! Driver errors are kept intact as the error source so callers can inspect
//! SQLSTATE codes (constraint violations, auth failures, ...).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    /// `DATABASE_URL` is unset or empty
    #[error("DATABASE_URL not found in environment variables")]
    MissingDatabaseUrl,

    /// Connection string could not be parsed
    #[error("Invalid database URL: {source}")]
    InvalidDatabaseUrl {
        #[source]
        source: sqlx::Error,
    },

    /// Any other configuration value is malformed
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// The DDL batch failed; nothing from the batch was committed
    #[error("Schema creation failed: {source}")]
    SchemaCreation {
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {source}")]
    Sqlx {
        #[from]
        source: sqlx::Error,
    },
}

impl DbError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// True for errors raised while reading configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::MissingDatabaseUrl | Self::InvalidDatabaseUrl { .. } | Self::Config { .. }
        )
    }

    /// Underlying driver error, if any
    pub fn as_sqlx(&self) -> Option<&sqlx::Error> {
        match self {
            Self::SchemaCreation { source } | Self::Sqlx { source } => Some(source),
            Self::InvalidDatabaseUrl { source } => Some(source),
            Self::MissingDatabaseUrl | Self::Config { .. } => None,
        }
    }

    /// SQLSTATE reported by the server, e.g. `23514` for a check violation
    pub fn sqlstate(&self) -> Option<String> {
        match self.as_sqlx()? {
            sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
            _ => None,
        }
    }
}
