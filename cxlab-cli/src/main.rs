//! cxlab CLI - database tooling for CX Insights Lab
//!
//! - `check`: end-to-end smoke test (connect, health, schema, tables, count)
//! - `health`: report whether the database is reachable
//! - `schema`: create, drop, list, verify or print the schema
//! - `query`: run an ad-hoc statement and print rows as JSON lines

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "cxlab",
    author,
    version,
    about = "Database smoke test and schema tooling for CX Insights Lab",
    long_about = "Connect to the CX Insights Lab PostgreSQL database, check its health, and \
                  manage the uploads/tickets/themes/analysis_cache schema."
)]
struct Cli {
    /// PostgreSQL connection string (falls back to .env files)
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces to an OTLP endpoint
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the connection and schema smoke test
    Check,
    /// Report whether the database is reachable
    Health(commands::health::HealthArgs),
    /// Create, drop or inspect the schema
    Schema(commands::schema::SchemaArgs),
    /// Run an ad-hoc SQL statement and print the rows as JSON lines
    Query(commands::query::QueryArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();
    cxlab_db::load_dotenv();

    let url = cli.database_url.as_deref();
    let result = match cli.command {
        Commands::Check => commands::check::run_check(url).await,
        Commands::Health(args) => commands::health::run_health(args, url).await,
        Commands::Schema(args) => commands::schema::run_schema(args, url).await,
        Commands::Query(args) => commands::query::run_query(args, url).await,
    };

    tracing_setup::shutdown_otel();
    result
}
