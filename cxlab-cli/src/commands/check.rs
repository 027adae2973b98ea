//! End-to-end smoke test
//!
//! Walks through connect → health → create schema → list tables → count,
//! printing a status line per step. Any failed step aborts the run with a
//! message; the exit status stays zero.

use anyhow::Result;
use cxlab_db::{schema, DatabaseManager};
use sqlx::Row;

use super::database_config;

const RULE: &str = "============================================================";

pub async fn run_check(url: Option<&str>) -> Result<()> {
    banner("TESTING DATABASE CONNECTION");

    println!("\n1. Initializing database connection...");
    let db = match database_config(url).and_then(|config| DatabaseManager::new(&config)) {
        Ok(db) => db,
        Err(e) => {
            println!("❌ Initialization failed: {e}");
            return Ok(());
        }
    };

    let passed = run_steps(&db).await;
    db.close().await;

    if passed {
        println!();
        banner("✅ ALL TESTS PASSED!");
    }
    Ok(())
}

async fn run_steps(db: &DatabaseManager) -> bool {
    println!("\n2. Testing connection...");
    if !db.health_check().await {
        println!("❌ Connection failed!");
        return false;
    }
    println!("✅ Connection successful!");

    println!("\n3. Creating database schema...");
    if let Err(e) = schema::create_schema(db).await {
        println!("❌ Schema creation failed: {e}");
        return false;
    }
    println!("✅ Schema created!");

    println!("\n4. Checking created tables...");
    match schema::get_table_info(db).await {
        Ok(tables) => println!("Created tables: {tables:?}"),
        Err(e) => {
            println!("❌ Listing tables failed: {e}");
            return false;
        }
    }

    println!("\n5. Testing a simple query...");
    let uploads = db
        .execute_query("SELECT COUNT(*) FROM uploads", &[])
        .await
        .and_then(|rows| match rows.first() {
            Some(row) => Ok(row.try_get::<i64, _>(0)?),
            None => Ok(0),
        });
    match uploads {
        Ok(count) => println!("Number of uploads: {count}"),
        Err(e) => {
            println!("❌ Query failed: {e}");
            return false;
        }
    }

    true
}

fn banner(title: &str) {
    println!("{RULE}");
    println!("{title}");
    println!("{RULE}");
}
