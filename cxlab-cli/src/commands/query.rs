//! Ad-hoc SQL execution

use anyhow::{Context, Result};
use clap::Parser;
use cxlab_db::params::parse_param;
use cxlab_db::rows::row_to_json;
use cxlab_db::SqlParam;
use serde_json::Value;
use tracing::info;

use super::connect;

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// SQL statement, using $1, $2, ... placeholders
    pub sql: String,

    /// Positional parameter (repeatable); null, booleans, numbers and JSON are inferred.
    /// Prefix with `text:` to bind as text. NULL is text-typed, so cast it
    /// for other columns (`$1::int`).
    #[arg(long = "param", short = 'p', value_name = "VALUE", value_parser = parse_param)]
    pub params: Vec<SqlParam>,
}

pub async fn run_query(args: QueryArgs, url: Option<&str>) -> Result<()> {
    let db = connect(url)?;
    let rows = db
        .execute_query(&args.sql, &args.params)
        .await
        .context("query execution failed");
    db.close().await;
    let rows = rows?;

    for row in &rows {
        println!("{}", Value::Object(row_to_json(row)));
    }
    info!("{} row(s)", rows.len());
    Ok(())
}
