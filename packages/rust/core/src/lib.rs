//! Orchestration core: the scrape pipeline, bounded parallel detail
//! fan-out, record filtering, and the output sinks.

pub mod cancel;
pub mod fanout;
pub mod filter;
pub mod pipeline;
pub mod sink;

pub use cancel::CancelSignal;
pub use pipeline::{ProgressReporter, RunReport, SilentProgress, run_scrape};
pub use sink::{CsvSink, RecordSink, StorageSink};
