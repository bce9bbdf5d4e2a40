use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

const STORE_FILE: &str = "catalogue.sqlite3";

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS catalogue_entries (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    id         TEXT NOT NULL UNIQUE,
    collection TEXT NOT NULL,
    techstack  TEXT NOT NULL,
    link       TEXT NOT NULL,
    embedding  BLOB NOT NULL,
    created_at TEXT NOT NULL
)
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS catalogue_entries_collection_idx ON catalogue_entries (collection)";

/// Opens (creating if needed) the sqlite file backing the vector store under `dir`.
pub async fn create_pool(dir: &Path) -> Result<SqlitePool> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create vector store directory {}", dir.display()))?;
    let path = dir.join(STORE_FILE);
    info!("Opening vector store at {}", path.display());

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    info!("Vector store ready");
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for statement in [CREATE_TABLE, CREATE_INDEX] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("failed to initialize catalogue schema")?;
    }
    Ok(())
}

/// Single-connection in-memory pool; each sqlite memory connection is its own database.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();
    pool
}
