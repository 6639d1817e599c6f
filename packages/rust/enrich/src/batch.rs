//! Run-scoped location cache.
//!
//! One `prepare` call resolves every distinct raw location of the run in a
//! single remote batch; lookups afterwards are read-only, so concurrent
//! detail tasks need no synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use rolescout_shared::{JobSummary, StructuredLocation};

use crate::client::LocationModelClient;

/// A cached resolution for one raw string.
enum CacheEntry {
    Resolved(StructuredLocation),
    /// The batch failed or omitted this key; lookups fall through to the
    /// per-record path.
    Failed,
}

/// Collects unique raw locations, resolves them in one batch, and serves
/// run-scoped lookups.
pub struct BatchLocationProcessor {
    client: Arc<dyn LocationModelClient>,
    cache: HashMap<String, CacheEntry>,
    prepared: bool,
    batch_calls: usize,
}

impl BatchLocationProcessor {
    pub fn new(client: Arc<dyn LocationModelClient>) -> Self {
        Self {
            client,
            cache: HashMap::new(),
            prepared: false,
            batch_calls: 0,
        }
    }

    /// Distinct non-empty `location_raw` strings in first-seen order.
    pub fn extract_unique(summaries: &[JobSummary]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut unique = Vec::new();
        for summary in summaries {
            if summary.location_raw.is_empty() {
                continue;
            }
            if seen.insert(summary.location_raw.as_str()) {
                unique.push(summary.location_raw.clone());
            }
        }
        unique
    }

    /// Resolve the unique list with at most one batched remote call per run.
    ///
    /// A failed batch marks every key as failed so per-record lookups fall
    /// through to the fallback chain instead of retrying the batch.
    pub async fn prepare(&mut self, unique: &[String]) {
        if self.prepared || unique.is_empty() {
            return;
        }
        self.prepared = true;
        self.batch_calls += 1;

        match self.client.resolve_batch(unique).await {
            Ok(mut resolved) => {
                for raw in unique {
                    let entry = match resolved.remove(raw) {
                        Some(location) => CacheEntry::Resolved(location.normalized()),
                        None => {
                            warn!(raw, "batch reply omitted a location");
                            CacheEntry::Failed
                        }
                    };
                    self.cache.insert(raw.clone(), entry);
                }
                debug!(count = unique.len(), "location cache prepared");
            }
            Err(e) => {
                warn!(error = %e, count = unique.len(), "batch location call failed");
                for raw in unique {
                    self.cache.insert(raw.clone(), CacheEntry::Failed);
                }
            }
        }
    }

    /// Look up a prepared resolution. `None` means cache miss or a failed
    /// batch entry; the caller falls through to the per-record path.
    pub fn lookup(&self, raw: &str) -> Option<&StructuredLocation> {
        match self.cache.get(raw) {
            Some(CacheEntry::Resolved(location)) => Some(location),
            _ => None,
        }
    }

    /// How many batched remote calls this run made.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls
    }
}
