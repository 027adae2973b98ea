//! Schema creation and management
//!
//! One fixed schema snapshot, applied with idempotent DDL. There is no
//! migration history: evolving the schema means re-running `create_schema`.

use tracing::{error, info};

use crate::error::{DbError, Result};
use crate::pool::DatabaseManager;

/// Every table the schema defines, in catalog (alphabetical) order.
pub const TABLE_NAMES: [&str; 4] = ["analysis_cache", "themes", "tickets", "uploads"];

/// Table DDL in dependency order: `uploads` first, the rest reference it.
const TABLES: &[(&str, &str)] = &[
    (
        "uploads",
        r#"
        CREATE TABLE IF NOT EXISTS uploads (
            upload_id SERIAL PRIMARY KEY,
            filename VARCHAR(255) NOT NULL,
            file_size_bytes BIGINT,
            uploaded_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            uploaded_by VARCHAR(100) DEFAULT 'default_user',
            row_count INTEGER,
            processed BOOLEAN DEFAULT FALSE,
            user_notes TEXT,
            config_params JSONB
        )
        "#,
    ),
    (
        "tickets",
        r#"
        CREATE TABLE IF NOT EXISTS tickets (
            ticket_id VARCHAR(100) PRIMARY KEY,
            upload_id INTEGER REFERENCES uploads(upload_id) ON DELETE CASCADE,

            created_at TIMESTAMP NOT NULL,
            text_content TEXT NOT NULL,
            product VARCHAR(100),
            channel VARCHAR(50),
            original_priority VARCHAR(20),
            customer_tier VARCHAR(50),
            customer_id VARCHAR(100),

            assigned_theme_id INTEGER,
            assigned_theme_name VARCHAR(200),
            theme_confidence FLOAT,
            severity_score INTEGER CHECK (severity_score BETWEEN 1 AND 5),
            severity_label VARCHAR(20),
            priority_rank INTEGER,

            text_length INTEGER,
            created_date DATE,
            created_month VARCHAR(7),

            processed_at TIMESTAMP,
            last_updated TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "themes",
        r#"
        CREATE TABLE IF NOT EXISTS themes (
            theme_id SERIAL PRIMARY KEY,
            upload_id INTEGER REFERENCES uploads(upload_id) ON DELETE CASCADE,
            theme_number INTEGER NOT NULL,
            theme_name VARCHAR(200) NOT NULL,
            theme_description TEXT,
            keywords TEXT[],

            ticket_count INTEGER DEFAULT 0,
            percentage_of_total FLOAT,
            avg_severity FLOAT,
            growth_rate FLOAT,

            discovery_method VARCHAR(50),
            model_params JSONB,
            discovery_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,

            UNIQUE(upload_id, theme_number)
        )
        "#,
    ),
    (
        "analysis_cache",
        r#"
        CREATE TABLE IF NOT EXISTS analysis_cache (
            cache_key VARCHAR(200) PRIMARY KEY,
            upload_id INTEGER REFERENCES uploads(upload_id) ON DELETE CASCADE,
            result_type VARCHAR(50),
            result_data JSONB NOT NULL,
            parameters JSONB,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            expires_at TIMESTAMP,
            access_count INTEGER DEFAULT 0,
            last_accessed TIMESTAMP
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_uploads_timestamp ON uploads(uploaded_at)",
    "CREATE INDEX IF NOT EXISTS idx_tickets_upload ON tickets(upload_id)",
    "CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_tickets_theme ON tickets(assigned_theme_name)",
    "CREATE INDEX IF NOT EXISTS idx_tickets_severity ON tickets(severity_label)",
    "CREATE INDEX IF NOT EXISTS idx_themes_upload ON themes(upload_id)",
    "CREATE INDEX IF NOT EXISTS idx_themes_name ON themes(theme_name)",
    "CREATE INDEX IF NOT EXISTS idx_cache_upload ON analysis_cache(upload_id)",
    "CREATE INDEX IF NOT EXISTS idx_cache_type ON analysis_cache(result_type)",
];

/// Dependents first, though CASCADE would cope with any order.
const DROP_TABLES: &[&str] = &[
    "DROP TABLE IF EXISTS analysis_cache CASCADE",
    "DROP TABLE IF EXISTS themes CASCADE",
    "DROP TABLE IF EXISTS tickets CASCADE",
    "DROP TABLE IF EXISTS uploads CASCADE",
];

/// Names of the secondary indexes the schema creates.
pub fn index_names() -> Vec<&'static str> {
    INDEXES
        .iter()
        .filter_map(|ddl| ddl.split_whitespace().nth(5))
        .collect()
}

/// Full DDL script, one statement per block.
pub fn schema_sql() -> String {
    let mut script = String::new();
    for (name, ddl) in TABLES {
        script.push_str(&format!("-- {name}\n"));
        script.push_str(&dedent(ddl));
        script.push_str(";\n\n");
    }
    for ddl in INDEXES {
        script.push_str(ddl);
        script.push_str(";\n");
    }
    script
}

/// Create all tables and indexes.
///
/// Runs the whole batch in one transaction on a single connection. Every
/// statement is `IF NOT EXISTS`, so calling this on an existing schema is a
/// no-op.
pub async fn create_schema(db: &DatabaseManager) -> Result<()> {
    apply_schema(db).await.map_err(|source| {
        error!(error = %source, "Schema creation failed");
        DbError::SchemaCreation { source }
    })?;

    info!("Database schema created successfully");
    Ok(())
}

async fn apply_schema(db: &DatabaseManager) -> std::result::Result<(), sqlx::Error> {
    let mut tx = db.pool().begin().await?;

    for (name, ddl) in TABLES {
        tracing::debug!(table = name, "creating table");
        sqlx::query(ddl).execute(&mut *tx).await?;
    }
    for ddl in INDEXES {
        sqlx::query(ddl).execute(&mut *tx).await?;
    }

    tx.commit().await
}

/// Drop all tables with CASCADE. Irreversible; meant for test/reset setups.
pub async fn drop_all_tables(db: &DatabaseManager) -> Result<()> {
    let result: std::result::Result<(), sqlx::Error> = async {
        let mut tx = db.pool().begin().await?;
        for ddl in DROP_TABLES {
            sqlx::query(ddl).execute(&mut *tx).await?;
        }
        tx.commit().await
    }
    .await;

    if let Err(e) = result {
        error!(error = %e, "Failed to drop tables");
        return Err(e.into());
    }

    info!("All tables dropped");
    Ok(())
}

/// Table names in the `public` schema, ordered by name.
pub async fn get_table_info(db: &DatabaseManager) -> Result<Vec<String>> {
    // information_schema columns are `sql_identifier`, which sqlx cannot decode as String
    let tables: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT table_name::text
        FROM information_schema.tables
        WHERE table_schema = 'public'
        ORDER BY table_name
        "#,
    )
    .fetch_all(db.pool())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to get table info");
        e
    })?;

    info!(?tables, "Existing tables");
    Ok(tables)
}

/// Expected tables that are absent from the catalog.
pub async fn missing_tables(db: &DatabaseManager) -> Result<Vec<&'static str>> {
    let existing = get_table_info(db).await?;
    let missing: Vec<&'static str> = TABLE_NAMES
        .iter()
        .copied()
        .filter(|table| !existing.iter().any(|t| t == table))
        .collect();

    if missing.is_empty() {
        info!("Schema check passed: all {} tables present", TABLE_NAMES.len());
    } else {
        error!(?missing, "Schema check failed: missing tables");
    }
    Ok(missing)
}

fn dedent(block: &str) -> String {
    let lines: Vec<&str> = block
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .collect();
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
