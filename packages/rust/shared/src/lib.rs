//! Shared types, error model, and configuration for RoleScout.
//!
//! This crate is the foundation depended on by all other RoleScout crates.
//! It provides:
//! - [`RoleScoutError`] — the unified error type
//! - Domain types ([`JobSummary`], [`JobDetail`], [`JobRecord`],
//!   [`StructuredLocation`], [`RunId`])
//! - Configuration ([`AppConfig`], [`RunRequest`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, OpenRouterConfig, RunRequest, TimeoutsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, RoleScoutError};
pub use types::{
    JobDetail, JobRecord, JobSummary, NOT_AVAILABLE, RunId, StructuredLocation, UNKNOWN_SENTINEL,
};
