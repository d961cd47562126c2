//! Search worker: pages backwards through one query window and emits records
//!
//! Each worker owns its pagination cursor. It stops on an empty batch, on the
//! first failed query, or when the shared [`StopSignal`] is set. The signal is
//! checked before every query and after every emitted record, so a worker
//! overshoots a stop request by at most the remainder of one batch.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::CHANNEL_CAPACITY;
use crate::record::Record;
use crate::shutdown::StopSignal;
use crate::source::{SearchQuery, SearchSource};

/// Why a worker stopped
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    /// Empty batch, or the source stopped paging backwards
    Exhausted,
    /// Stop signal observed
    Stopped,
    /// Downstream receiver went away
    Disconnected,
    /// Query failed (no retry)
    Failed(String),
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => f.write_str("exhausted"),
            Self::Stopped => f.write_str("stopped"),
            Self::Disconnected => f.write_str("disconnected"),
            Self::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Per-worker outcome, returned through the task handle
#[derive(Clone, Debug)]
pub struct WorkerReport {
    pub name: Arc<str>,
    pub until: NaiveDate,
    pub queries: usize,
    pub emitted: usize,
    pub exit: WorkerExit,
}

pub struct Worker<S> {
    name: Arc<str>,
    term: String,
    until: NaiveDate,
    batch_size: u32,
    source: Arc<S>,
    stop: StopSignal,
}

impl<S> fmt::Debug for Worker<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("until", &self.until)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl<S: SearchSource> Worker<S> {
    pub fn new(
        name: impl Into<Arc<str>>,
        term: impl Into<String>,
        until: NaiveDate,
        batch_size: u32,
        source: Arc<S>,
        stop: StopSignal,
    ) -> Self {
        Self {
            name: name.into(),
            term: term.into(),
            until,
            batch_size,
            source,
            stop,
        }
    }

    /// Start the worker on its own task.
    ///
    /// The returned receiver closes when the worker exits, whatever the reason.
    pub fn spawn(self) -> (mpsc::Receiver<Record>, JoinHandle<WorkerReport>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(self.run(tx));
        (rx, handle)
    }

    /// Query loop. Consumes `tx`, so the channel closes on return.
    pub async fn run(self, tx: mpsc::Sender<Record>) -> WorkerReport {
        let name = &self.name;
        let mut queries = 0usize;
        let mut emitted = 0usize;
        let mut cursor: Option<u64> = None;

        log::debug!("{name}: starting, window until {}", self.until);

        let exit = 'outer: loop {
            if self.stop.is_requested() {
                log::debug!("{name}: stop requested before query {}", queries + 1);
                break WorkerExit::Stopped;
            }

            queries += 1;
            if let Some(max_id) = cursor {
                log::debug!("{name}: query {queries} with max_id {max_id}");
            }
            let query = SearchQuery {
                term: self.term.clone(),
                until: self.until,
                batch_size: self.batch_size,
                max_id: cursor,
            };

            let batch = match self.source.search(&query).await {
                Ok(batch) => batch,
                Err(e) => {
                    log::error!("{name}: query {queries} failed: {e}");
                    break WorkerExit::Failed(e.to_string());
                }
            };
            if batch.is_empty() {
                log::info!("{name}: no results in query {queries}, window exhausted");
                break WorkerExit::Exhausted;
            }

            let batch_len = batch.len();
            let mut lowest = u64::MAX;
            for item in batch {
                lowest = lowest.min(item.id);
                if tx.send(item.into_record(name.clone())).await.is_err() {
                    log::debug!("{name}: downstream closed");
                    break 'outer WorkerExit::Disconnected;
                }
                emitted += 1;
                if self.stop.is_requested() {
                    log::debug!("{name}: stop requested after {emitted} records");
                    break 'outer WorkerExit::Stopped;
                }
            }
            log::trace!("{name}: query {queries} returned {batch_len} items");

            match next_cursor(cursor, lowest) {
                Some(next) => cursor = Some(next),
                None => {
                    log::warn!("{name}: source did not page past id {lowest}, stopping");
                    break WorkerExit::Exhausted;
                }
            }
        };

        log::debug!("{name}: finished after {queries} queries, {emitted} records ({exit})");
        WorkerReport {
            name: self.name.clone(),
            until: self.until,
            queries,
            emitted,
            exit,
        }
    }
}

/// Inclusive upper bound for the next query: one below the lowest id seen.
///
/// `None` when paging cannot move backwards (id 0, or the batch did not go
/// below the previous bound).
fn next_cursor(previous: Option<u64>, lowest: u64) -> Option<u64> {
    let next = lowest.checked_sub(1)?;
    match previous {
        Some(prev) if next >= prev => None,
        _ => Some(next),
    }
}
