//! Error types for RoleScout.
//!
//! Library crates use [`RoleScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all RoleScout operations.
#[derive(Debug, thiserror::Error)]
pub enum RoleScoutError {
    /// Configuration loading or validation error. Fatal for a run.
    #[error("config error: {message}")]
    Config { message: String },

    /// The requested platform identifier is not registered.
    #[error("unsupported platform: {platform}")]
    UnsupportedPlatform { platform: String },

    /// A platform binding could not be loaded into the registry.
    #[error("platform load error for {platform}: {message}")]
    PlatformLoad { platform: String, message: String },

    /// A platform binding does not satisfy the Crawler/Parser contract.
    #[error("platform contract error for {platform}: {message}")]
    PlatformContract { platform: String, message: String },

    /// Browser launch or protocol-level failure.
    #[error("browser error: {0}")]
    Browser(String),

    /// A page or selector did not reach the required state within its budget.
    #[error("navigation timeout after {budget_ms}ms waiting for {what}")]
    NavigationTimeout { what: String, budget_ms: u64 },

    /// The underlying browsing target was lost. Never retried.
    #[error("browsing target closed: {0}")]
    TargetClosed(String),

    /// A required selector returned nothing where data was expected.
    #[error("extraction miss: {message}")]
    Extraction { message: String },

    /// A raw date/location/id string could not be interpreted.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The remote enrichment call failed or returned malformed data.
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// The CSV writer or persistence adapter rejected a batch.
    #[error("sink error: {0}")]
    Sink(String),

    /// The run was cancelled at the orchestrator boundary; no output was
    /// persisted.
    #[error("run cancelled")]
    Cancelled,

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RoleScoutError>;

impl RoleScoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create an extraction-miss error from any displayable message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
        }
    }

    /// Create a navigation timeout for `what` with the budget that elapsed.
    pub fn timeout(what: impl Into<String>, budget: std::time::Duration) -> Self {
        Self::NavigationTimeout {
            what: what.into(),
            budget_ms: budget.as_millis() as u64,
        }
    }

    /// Create a platform contract error.
    pub fn contract(platform: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::PlatformContract {
            platform: platform.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a navigation/selector timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::NavigationTimeout { .. })
    }

    /// Whether this error means the browsing target is gone.
    pub fn is_target_closed(&self) -> bool {
        matches!(self, Self::TargetClosed(_))
    }
}
