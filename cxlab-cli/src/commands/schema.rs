//! Schema management commands
//!
//! Commands: create, drop, tables, verify, sql

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use cxlab_db::schema;

use super::connect;

#[derive(Parser, Debug)]
pub struct SchemaArgs {
    #[command(subcommand)]
    pub command: SchemaCommands,
}

#[derive(Subcommand, Debug)]
pub enum SchemaCommands {
    /// Create all tables and indexes (safe to re-run)
    Create,
    /// Drop every table with CASCADE, deleting all data
    Drop(DropArgs),
    /// List tables in the public schema
    Tables,
    /// Check that every expected table exists
    Verify,
    /// Print the DDL script without connecting
    Sql,
}

#[derive(Parser, Debug)]
pub struct DropArgs {
    /// Confirm dropping all tables and their data
    #[arg(long)]
    pub yes: bool,
}

pub async fn run_schema(args: SchemaArgs, url: Option<&str>) -> Result<()> {
    match args.command {
        SchemaCommands::Sql => {
            print!("{}", schema::schema_sql());
            Ok(())
        }
        SchemaCommands::Drop(DropArgs { yes: false }) => {
            bail!("refusing to drop all tables without --yes")
        }
        command => {
            let db = connect(url)?;
            let result = run_with_db(command, &db).await;
            db.close().await;
            result
        }
    }
}

async fn run_with_db(command: SchemaCommands, db: &cxlab_db::DatabaseManager) -> Result<()> {
    match command {
        SchemaCommands::Create => {
            schema::create_schema(db).await?;
            println!("✅ Schema created");
        }
        SchemaCommands::Drop(_) => {
            schema::drop_all_tables(db)
                .await
                .context("failed to drop tables")?;
            println!("All tables dropped");
        }
        SchemaCommands::Tables => {
            for table in schema::get_table_info(db).await? {
                println!("{table}");
            }
        }
        SchemaCommands::Verify => {
            let missing = schema::missing_tables(db).await?;
            if !missing.is_empty() {
                return Err(anyhow!("missing tables: {}", missing.join(", ")));
            }
            println!("✅ All {} tables present", schema::TABLE_NAMES.len());
        }
        SchemaCommands::Sql => print!("{}", schema::schema_sql()),
    }
    Ok(())
}
