//! Output sinks: CSV append and libSQL upsert.
//!
//! Exactly one sink is selected per run. Sink failures surface to the
//! caller; the pipeline's in-memory records are not re-computed.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use rolescout_shared::{JobRecord, Result, RoleScoutError, RunId};
use rolescout_storage::Storage;

/// Accepts the run's surviving records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist the batch. Called once per run, after all pipeline work.
    async fn persist(&self, records: &[JobRecord], run_id: &RunId) -> Result<()>;

    /// Human-readable sink description for logs.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// CSV sink
// ---------------------------------------------------------------------------

/// Appends records to a UTF-8 CSV file.
///
/// The header row is written iff the target file is absent or empty; the
/// column set is derived from the first record of the batch (enrichment
/// columns appear only when that record carries a structured location).
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn needs_header(&self) -> Result<bool> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(RoleScoutError::io(&self.path, e)),
        }
    }
}

/// Flatten a record into `(column, value)` pairs.
fn flatten(record: &JobRecord, with_location_columns: bool) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("company_name", record.company_name.clone()),
        ("title", record.title.clone()),
        ("detail_url", record.detail_url.clone()),
        ("location_raw", record.location_raw.clone()),
        ("location_parsed", record.location_parsed.clone()),
        ("date_posted_raw", record.date_posted_raw.clone()),
        (
            "date_posted_parsed",
            record
                .date_posted_parsed
                .map(|d| d.to_string())
                .unwrap_or_default(),
        ),
        ("description", record.description.clone()),
        ("job_id", record.job_id.clone()),
        ("detail_page_title", record.detail_page_title.clone()),
    ];

    if with_location_columns {
        let location = record.location_parsed_intelligent.as_ref();
        let scalar = |value: Option<&String>| value.cloned().unwrap_or_default();
        fields.push(("city", scalar(location.and_then(|l| l.city.as_ref()))));
        fields.push(("country", scalar(location.and_then(|l| l.country.as_ref()))));
        fields.push(("region", scalar(location.and_then(|l| l.region.as_ref()))));
        fields.push((
            "confidence",
            location
                .map(|l| l.confidence.to_string())
                .unwrap_or_default(),
        ));
    }

    fields
}

#[async_trait]
impl RecordSink for CsvSink {
    async fn persist(&self, records: &[JobRecord], _run_id: &RunId) -> Result<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        let with_location_columns = first.location_parsed_intelligent.is_some();
        let needs_header = self.needs_header()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RoleScoutError::io(parent, e))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RoleScoutError::io(&self.path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            let header: Vec<&str> = flatten(first, with_location_columns)
                .iter()
                .map(|(name, _)| *name)
                .collect();
            writer
                .write_record(&header)
                .map_err(|e| RoleScoutError::Sink(e.to_string()))?;
        }

        for record in records {
            let row: Vec<String> = flatten(record, with_location_columns)
                .into_iter()
                .map(|(_, value)| value)
                .collect();
            writer
                .write_record(&row)
                .map_err(|e| RoleScoutError::Sink(e.to_string()))?;
        }

        writer
            .flush()
            .map_err(|e| RoleScoutError::Sink(e.to_string()))?;
        info!(path = %self.path.display(), count = records.len(), "records appended to CSV");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

// ---------------------------------------------------------------------------
// Storage sink
// ---------------------------------------------------------------------------

/// Upserts records into the listings database, keyed by `detail_url`.
pub struct StorageSink {
    storage: Storage,
}

impl StorageSink {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

#[async_trait]
impl RecordSink for StorageSink {
    async fn persist(&self, records: &[JobRecord], run_id: &RunId) -> Result<()> {
        for record in records {
            self.storage.upsert_listing(record, run_id).await?;
        }
        info!(count = records.len(), "records upserted into listings");
        Ok(())
    }

    fn describe(&self) -> String {
        "database:listings".into()
    }
}
