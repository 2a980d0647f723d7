//! History table operations

use crate::history::HistoryEntry;
use crate::queue::AcquisitionId;
use crate::resolver::{ResourceKind, ResourceReference};
use anyhow::{anyhow, Result};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use tracing::debug;

use super::schema::initialize_database;

/// Durable store behind the history ledger
#[derive(Clone)]
pub struct DatabaseManager {
    pool: Pool<Sqlite>,
}

impl DatabaseManager {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Open the database file at `path`, creating it and its tables if needed
    pub async fn open(path: &Path) -> Result<Self> {
        let url = format!("sqlite://{}", path.display());
        let pool = initialize_database(&url).await?;
        Ok(Self::new(pool))
    }

    pub async fn save_history_entry(&self, entry: &HistoryEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO history
            (id, source_url, resource_kind, resource_id, title, media_kind, quality,
             format_label, filename, progress_percent, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.as_u64() as i64)
        .bind(&entry.source_url)
        .bind(entry.resource.kind().as_str())
        .bind(entry.resource.id())
        .bind(&entry.title)
        .bind(entry.media_kind.as_str())
        .bind(&entry.quality)
        .bind(&entry.format_label)
        .bind(&entry.filename)
        .bind(entry.progress_percent as f64)
        .bind(entry.completed_at)
        .execute(&self.pool)
        .await?;

        debug!("Saved history entry: {}", entry.id);
        Ok(())
    }

    /// All entries, most recently completed first
    pub async fn get_history(&self) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query("SELECT * FROM history ORDER BY completed_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(row_into_history_entry(row)?);
        }

        Ok(entries)
    }

    pub async fn clear_history(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM history").execute(&self.pool).await?;
        debug!("Cleared {} history rows", result.rows_affected());
        Ok(result.rows_affected())
    }

    pub async fn count_history(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM history")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }
}

fn row_into_history_entry(row: sqlx::sqlite::SqliteRow) -> Result<HistoryEntry> {
    let resource_kind: ResourceKind = row
        .get::<&str, _>("resource_kind")
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let media_kind = row
        .get::<&str, _>("media_kind")
        .parse()
        .map_err(|e: String| anyhow!(e))?;

    Ok(HistoryEntry {
        id: AcquisitionId::from_raw(row.get::<i64, _>("id") as u64),
        resource: ResourceReference::from_parts(resource_kind, row.get("resource_id"))?,
        source_url: row.get("source_url"),
        title: row.get("title"),
        media_kind,
        quality: row.get("quality"),
        format_label: row.get("format_label"),
        filename: row.get("filename"),
        progress_percent: row.get::<f64, _>("progress_percent") as f32,
        completed_at: row.get("completed_at"),
    })
}
