//! Database health report

use anyhow::{bail, Result};
use clap::Parser;

use super::connect;

#[derive(Parser, Debug)]
pub struct HealthArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_health(args: HealthArgs, url: Option<&str>) -> Result<()> {
    let db = connect(url)?;
    let status = db.diagnose().await;
    db.close().await;

    if args.json {
        println!("{}", serde_json::to_string(&status)?);
    } else {
        println!("database: {status}");
    }

    if !status.is_healthy() {
        bail!("database health check failed: {status}");
    }
    Ok(())
}
