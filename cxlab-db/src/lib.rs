//! cxlab-db: PostgreSQL access for CX Insights Lab
//!
//! - [`DatabaseManager`]: pooled connections, sessions, health check, ad-hoc queries
//! - [`schema`]: idempotent DDL for the `uploads`, `tickets`, `themes` and
//!   `analysis_cache` tables
//!
//! ```ignore
//! let db = DatabaseManager::new(&DatabaseConfig::from_env()?)?;
//! if db.health_check().await {
//!     schema::create_schema(&db).await?;
//! }
//! db.close().await;
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod params;
pub mod pool;
pub mod rows;
pub mod schema;

pub use config::{load_dotenv, DatabaseConfig};
pub use error::{DbError, Result};
pub use health::HealthStatus;
pub use params::SqlParam;
pub use pool::{get_db_manager, DatabaseManager, Session};
