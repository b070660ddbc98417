use crate::db::{connect, connect_with_config};
use sea_orm::{DatabaseBackend, Statement, ConnectionTrait};
use std::time::{Duration, Instant};
use anyhow::Result;

/// Test basic database connection
#[tokio::test]
async fn test_basic_connection() -> Result<()> {
    // Skip test if no database available
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        println!("Skipping database tests (SKIP_DB_TESTS is set)");
        return Ok(());
    }

    let start = Instant::now();
    let db = match connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {e}");
            return Ok(());
        }
    };
    let connection_time = start.elapsed();

    let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1 as test".to_string());
    let row = db.query_one(stmt).await?.expect("one row");
    let test_value: i32 = row.try_get("", "test")?;
    assert_eq!(test_value, 1);

    assert!(connection_time < Duration::from_secs(5), "Connection took too long: {:?}", connection_time);
    Ok(())
}

/// Pool settings from the application config are honoured
#[tokio::test]
async fn test_custom_config_connection() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }

    let mut config = configs::DatabaseConfig::default();
    config.url = crate::db::DATABASE_URL.clone();
    config.max_connections = 5;
    config.min_connections = 1;
    config.connect_timeout_secs = 10;

    let db = match connect_with_config(&config).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {e}");
            return Ok(());
        }
    };
    let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT current_database() as name".to_string());
    let row = db.query_one(stmt).await?.expect("one row");
    let name: String = row.try_get("", "name")?;
    assert!(!name.is_empty());
    Ok(())
}
