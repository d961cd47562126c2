//! Tweetline Core - concurrent search collection pipeline
//!
//! Several workers page through a search source in parallel; their streams
//! are merged, deduplicated by canonical id, and written to a CSV sink that
//! stops every worker once enough unique records are written.

pub mod dedup;
pub mod error;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod shutdown;
pub mod sink;
pub mod source;
pub mod worker;

/// Capacity of every inter-stage channel (tokio's minimum)
pub const CHANNEL_CAPACITY: usize = 1;

// Re-exports for convenience
pub use dedup::{DedupStats, Deduplicator};
pub use error::SinkError;
pub use logging::{IndicatifLogger, init_logging, level_for};
pub use merge::merge;
pub use pipeline::{RunPlan, RunSummary, WorkerPlan, run};
pub use progress::{ProgressContext, fmt_num};
pub use record::{Payload, RawItem, RawKind, Record};
pub use shutdown::StopSignal;
pub use sink::{HEADER, OutputFile, RecordSink, SinkSummary};
pub use source::{SearchQuery, SearchSource};
pub use worker::{Worker, WorkerExit, WorkerReport};
