//! SQL migration definitions for the RoleScout listings database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as a batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: listings keyed by detail_url, scrape_runs",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Normalized job listings, one row per detail URL
CREATE TABLE IF NOT EXISTS listings (
    id                TEXT PRIMARY KEY,
    detail_url        TEXT NOT NULL UNIQUE,
    company_name      TEXT NOT NULL,
    title             TEXT NOT NULL,
    location_raw      TEXT,
    location_parsed   TEXT,
    date_posted_raw   TEXT,
    date_posted       TEXT,
    description       TEXT,
    job_id            TEXT,
    detail_page_title TEXT,
    city              TEXT,
    country           TEXT,
    region            TEXT,
    confidence        REAL,
    run_id            TEXT,
    scraped_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_company ON listings(company_name);
CREATE INDEX IF NOT EXISTS idx_listings_date_posted ON listings(date_posted);

-- Scrape run history
CREATE TABLE IF NOT EXISTS scrape_runs (
    id           TEXT PRIMARY KEY,
    company_name TEXT NOT NULL,
    platform     TEXT NOT NULL,
    target_url   TEXT NOT NULL,
    started_at   TEXT NOT NULL,
    finished_at  TEXT,
    stats_json   TEXT
);

CREATE INDEX IF NOT EXISTS idx_scrape_runs_company ON scrape_runs(company_name);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
