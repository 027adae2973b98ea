//! Liveness diagnosis
//!
//! A failed probe is never an error for the caller. The boolean
//! `health_check` stays opaque; `diagnose` additionally tells apart the
//! common failure modes.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    /// Credentials rejected (SQLSTATE 28000 / 28P01)
    AuthenticationFailed,
    /// Server reachable but the database does not exist (SQLSTATE 3D000)
    DatabaseMissing,
    /// Network, TLS or pool-acquire timeout
    Unreachable,
    Failed(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub(crate) fn from_error(err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => db
                .code()
                .and_then(|code| Self::from_sqlstate(&code))
                .unwrap_or_else(|| Self::Failed(err.to_string())),
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
                Self::Unreachable
            }
            other => Self::Failed(other.to_string()),
        }
    }

    fn from_sqlstate(code: &str) -> Option<Self> {
        match code {
            "28000" | "28P01" => Some(Self::AuthenticationFailed),
            "3D000" => Some(Self::DatabaseMissing),
            _ => None,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::AuthenticationFailed => write!(f, "authentication failed"),
            HealthStatus::DatabaseMissing => write!(f, "database does not exist"),
            HealthStatus::Unreachable => write!(f, "database unreachable"),
            HealthStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
