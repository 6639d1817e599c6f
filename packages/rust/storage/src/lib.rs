//! libSQL persistence adapter for normalized job listings.
//!
//! The [`Storage`] struct wraps a libSQL database holding the listings
//! table (one row per `detail_url`) and scrape run history. Records arrive
//! already normalized: the `"Unknown"` enrichment sentinel is null before a
//! record reaches this layer.

mod migrations;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use uuid::Uuid;

use rolescout_shared::{JobRecord, Result, RoleScoutError, RunId};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RoleScoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| RoleScoutError::Sink(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| RoleScoutError::Sink(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    RoleScoutError::Sink(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Listing operations
    // -----------------------------------------------------------------------

    /// Upsert a listing (insert or update on conflict by `detail_url`).
    pub async fn upsert_listing(&self, record: &JobRecord, run_id: &RunId) -> Result<()> {
        let location = record.location_parsed_intelligent.as_ref();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO listings (id, detail_url, company_name, title, location_raw,
                                       location_parsed, date_posted_raw, date_posted,
                                       description, job_id, detail_page_title,
                                       city, country, region, confidence, run_id, scraped_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
                 ON CONFLICT(detail_url) DO UPDATE SET
                   company_name = excluded.company_name,
                   title = excluded.title,
                   location_raw = excluded.location_raw,
                   location_parsed = excluded.location_parsed,
                   date_posted_raw = excluded.date_posted_raw,
                   date_posted = excluded.date_posted,
                   description = excluded.description,
                   job_id = excluded.job_id,
                   detail_page_title = excluded.detail_page_title,
                   city = excluded.city,
                   country = excluded.country,
                   region = excluded.region,
                   confidence = excluded.confidence,
                   run_id = excluded.run_id,
                   scraped_at = excluded.scraped_at",
                params![
                    Uuid::now_v7().to_string(),
                    record.detail_url.as_str(),
                    record.company_name.as_str(),
                    record.title.as_str(),
                    record.location_raw.as_str(),
                    record.location_parsed.as_str(),
                    record.date_posted_raw.as_str(),
                    record.date_posted_parsed.map(|d| d.to_string()),
                    record.description.as_str(),
                    record.job_id.as_str(),
                    record.detail_page_title.as_str(),
                    location.and_then(|l| l.city.as_deref()),
                    location.and_then(|l| l.country.as_deref()),
                    location.and_then(|l| l.region.as_deref()),
                    location.map(|l| l.confidence),
                    run_id.to_string(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| RoleScoutError::Sink(e.to_string()))?;
        Ok(())
    }

    /// Count listings stored for a company.
    pub async fn count_listings(&self, company_name: &str) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM listings WHERE company_name = ?1",
                params![company_name],
            )
            .await
            .map_err(|e| RoleScoutError::Sink(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map(|n| n.max(0) as u64)
                .map_err(|e| RoleScoutError::Sink(e.to_string())),
            Ok(None) => Ok(0),
            Err(e) => Err(RoleScoutError::Sink(e.to_string())),
        }
    }

    /// Fetch one listing's sink-contract columns by its unique `detail_url`.
    /// Returns `(title, location_parsed, city, country, region)`.
    pub async fn get_listing(
        &self,
        detail_url: &str,
    ) -> Result<Option<(String, String, Option<String>, Option<String>, Option<String>)>> {
        let mut rows = self
            .conn
            .query(
                "SELECT title, location_parsed, city, country, region
                 FROM listings WHERE detail_url = ?1",
                params![detail_url],
            )
            .await
            .map_err(|e| RoleScoutError::Sink(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some((
                row.get::<String>(0)
                    .map_err(|e| RoleScoutError::Sink(e.to_string()))?,
                row.get::<String>(1)
                    .map_err(|e| RoleScoutError::Sink(e.to_string()))?,
                nullable_text(&row, 2)?,
                nullable_text(&row, 3)?,
                nullable_text(&row, 4)?,
            ))),
            Ok(None) => Ok(None),
            Err(e) => Err(RoleScoutError::Sink(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Run history
    // -----------------------------------------------------------------------


    /// Record the start of a scrape run.
    pub async fn insert_run(
        &self,
        run_id: &RunId,
        company_name: &str,
        platform: &str,
        target_url: &str,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO scrape_runs (id, company_name, platform, target_url, started_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    run_id.to_string(),
                    company_name,
                    platform,
                    target_url,
                    now.as_str()
                ],
            )
            .await
            .map_err(|e| RoleScoutError::Sink(e.to_string()))?;
        Ok(())
    }

    /// Mark a scrape run finished with its stats payload.
    pub async fn finish_run(&self, run_id: &RunId, stats_json: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE scrape_runs SET finished_at = ?1, stats_json = ?2 WHERE id = ?3",
                params![now.as_str(), stats_json, run_id.to_string()],
            )
            .await
            .map_err(|e| RoleScoutError::Sink(e.to_string()))?;
        Ok(())
    }
}

/// Read a nullable TEXT column by position.
fn nullable_text(row: &libsql::Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx) {
        Ok(libsql::Value::Text(text)) => Ok(Some(text)),
        Ok(libsql::Value::Null) => Ok(None),
        Ok(other) => Err(RoleScoutError::Sink(format!(
            "unexpected value in text column {idx}: {other:?}"
        ))),
        Err(e) => Err(RoleScoutError::Sink(e.to_string())),
    }
}
