//! The enrichment engine: feature gating, run-scoped cache preparation,
//! and per-record decoration with a layered fallback chain.

use std::sync::Arc;

use tracing::{debug, warn};

use rolescout_shared::{JobRecord, JobSummary, OpenRouterConfig};

use crate::batch::BatchLocationProcessor;
use crate::client::{LocationModelClient, OpenRouterClient};

/// Observable engine state, derived from configuration at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentState {
    /// Feature off or credential missing: no remote calls, `decorate` is a
    /// no-op.
    Disabled,
    /// Batch call allowed; fallback chain armed.
    Active,
}

impl std::fmt::Display for EnrichmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::Active => f.write_str("active"),
        }
    }
}

struct ActiveEnrichment {
    client: Arc<dyn LocationModelClient>,
    processor: BatchLocationProcessor,
}

/// Decorates job records with structured locations from the run cache.
///
/// The engine owns its cache for exactly one run and never propagates a
/// failure to the orchestrator; every error degrades to the next fallback
/// level (cache hit → per-record call → legacy parsed string only).
pub struct EnrichmentEngine {
    inner: Option<ActiveEnrichment>,
}

impl EnrichmentEngine {
    /// An engine that never calls out and never decorates.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// An active engine over the given model client.
    pub fn active(client: Arc<dyn LocationModelClient>) -> Self {
        Self {
            inner: Some(ActiveEnrichment {
                processor: BatchLocationProcessor::new(client.clone()),
                client,
            }),
        }
    }

    /// Derive the engine state from configuration.
    ///
    /// Enabled-but-unconfigured (no API credential) downgrades to disabled
    /// with a single warning; the run continues without enrichment.
    pub fn from_config(config: &OpenRouterConfig) -> Self {
        if !config.enabled {
            debug!("location enrichment disabled by config");
            return Self::disabled();
        }
        let Some(api_key) = config.resolve_api_key() else {
            warn!(
                env = %config.api_key_env,
                "enrichment enabled but no API credential found, continuing without it"
            );
            return Self::disabled();
        };
        match OpenRouterClient::new(api_key, config.default_model.clone()) {
            Ok(client) => Self::active(Arc::new(client)),
            Err(e) => {
                warn!(error = %e, "could not build enrichment client, continuing without it");
                Self::disabled()
            }
        }
    }

    pub fn state(&self) -> EnrichmentState {
        if self.inner.is_some() {
            EnrichmentState::Active
        } else {
            EnrichmentState::Disabled
        }
    }

    /// How many batched remote calls this run made.
    pub fn batch_calls(&self) -> usize {
        self.inner
            .as_ref()
            .map(|active| active.processor.batch_calls())
            .unwrap_or(0)
    }

    /// Collect the run's unique raw locations and resolve them in at most
    /// one batched remote call. Must run before detail decoration starts.
    pub async fn prepare_cache(&mut self, summaries: &[JobSummary]) {
        let Some(active) = self.inner.as_mut() else {
            return;
        };
        let unique = BatchLocationProcessor::extract_unique(summaries);
        active.processor.prepare(&unique).await;
    }

    /// Attach `location_parsed_intelligent` to a record.
    ///
    /// Idempotent: an already-decorated record passes through unchanged.
    /// Fallback chain: cache hit → per-record remote call → leave absent
    /// (the record keeps its legacy `location_parsed`).
    pub async fn decorate(&self, mut record: JobRecord) -> JobRecord {
        if record.location_parsed_intelligent.is_some() {
            return record;
        }
        let Some(active) = self.inner.as_ref() else {
            return record;
        };
        if record.location_raw.is_empty() {
            return record;
        }

        if let Some(location) = active.processor.lookup(&record.location_raw) {
            record.location_parsed_intelligent = Some(location.clone());
            return record;
        }

        match active.client.resolve_one(&record.location_raw).await {
            Ok(Some(location)) => {
                record.location_parsed_intelligent = Some(location.normalized());
            }
            Ok(None) => {
                debug!(raw = %record.location_raw, "per-record lookup came up empty");
            }
            Err(e) => {
                warn!(
                    raw = %record.location_raw,
                    error = %e,
                    "per-record location call failed, keeping legacy parse"
                );
            }
        }
        record
    }
}
