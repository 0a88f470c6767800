use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

pub async fn init_pool(database_path: &str) -> Result<DbPool, Box<dyn std::error::Error + Send + Sync>> {
    let db_path = Path::new(database_path);
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let database_url = format!("sqlite:{database_path}?mode=rwc");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    Ok(pool)
}

#[cfg(test)]
pub async fn init_memory_pool() -> Result<DbPool, Box<dyn std::error::Error + Send + Sync>> {
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
