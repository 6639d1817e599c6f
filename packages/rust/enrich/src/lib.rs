//! Batch location enrichment.
//!
//! Collapses the N per-listing location lookups of a run into a single
//! remote LLM call: unique raw strings are collected up front, resolved in
//! one batch, cached for the run, and looked up as records are decorated.
//! Failures degrade along a fallback chain and never reach the orchestrator.

pub mod batch;
pub mod client;
pub mod engine;

pub use batch::BatchLocationProcessor;
pub use client::{LocationModelClient, OpenRouterClient};
pub use engine::{EnrichmentEngine, EnrichmentState};
