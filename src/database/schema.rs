//! Database schema

use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use tracing::{debug, info};

/// Open (creating if needed) the history database at `db_url`
pub async fn initialize_database(db_url: &str) -> Result<Pool<Sqlite>> {
    if !Sqlite::database_exists(db_url).await? {
        debug!("Creating database at: {}", db_url);
        Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect(db_url)
        .await?;

    info!("Running database migrations");
    create_tables(&pool).await?;

    Ok(pool)
}

async fn create_tables(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS history (
            id INTEGER PRIMARY KEY,
            source_url TEXT NOT NULL,
            resource_kind TEXT NOT NULL,
            resource_id TEXT NOT NULL,
            title TEXT NOT NULL,
            media_kind TEXT NOT NULL,
            quality TEXT NOT NULL,
            format_label TEXT NOT NULL,
            filename TEXT NOT NULL,
            progress_percent REAL NOT NULL DEFAULT 100,
            completed_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_completed ON history(completed_at)")
        .execute(pool)
        .await?;

    debug!("Database tables created successfully");
    Ok(())
}
