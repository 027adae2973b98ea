//! `.env` discovery for managers built from the environment.
//!
//! Changes the process working directory, so it lives in its own test binary.

use cxlab_db::DatabaseManager;
use tempfile::TempDir;

#[tokio::test]
async fn from_env_reads_dotenv_files() {
    let cwd = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    std::fs::create_dir(home.path().join(".cxlab")).unwrap();
    std::fs::write(
        home.path().join(".cxlab").join(".env"),
        "DATABASE_URL=postgres://cx@dotenv-host:6543/cx_insights\n",
    )
    .unwrap();

    std::env::remove_var("DATABASE_URL");
    std::env::remove_var("CXLAB_DB_ACQUIRE_TIMEOUT_SECS");
    std::env::set_var("HOME", home.path());
    std::env::set_current_dir(cwd.path()).unwrap();

    let db = DatabaseManager::from_env().expect("DATABASE_URL from ~/.cxlab/.env");
    let options = db.pool().connect_options();
    assert_eq!(options.get_host(), "dotenv-host");
    assert_eq!(options.get_port(), 6543);

    db.close().await;
}
