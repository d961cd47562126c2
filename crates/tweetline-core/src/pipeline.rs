//! Run orchestration: workers → merge → dedup → sink
//!
//! Shutdown order once the sink hits its target:
//! 1. sink raises the stop signal
//! 2. workers notice within one batch and drop their senders
//! 3. merge relays finish; the join task closes the merged stream
//! 4. dedup sees its input close and closes its output
//! 5. sink sees its input close, flushes, and sends completion
//!
//! [`run`] waits on the sink's completion handle only; worker and dedup
//! reports are collected afterwards, when those tasks have already ended.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use futures_util::future::join_all;
use indicatif::ProgressBar;
use tokio::io::AsyncWrite;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::dedup::{DedupStats, Deduplicator};
use crate::error::SinkError;
use crate::merge::merge;
use crate::shutdown::StopSignal;
use crate::sink::{RecordSink, SinkSummary};
use crate::source::SearchSource;
use crate::worker::{Worker, WorkerReport};

/// One worker's assignment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerPlan {
    pub name: String,
    /// Upper date bound for this worker's window
    pub until: NaiveDate,
}

/// Everything a run needs besides the source and the output
#[derive(Clone, Debug)]
pub struct RunPlan {
    pub term: String,
    /// Unique records to write before stopping
    pub target: usize,
    pub batch_size: u32,
    pub workers: Vec<WorkerPlan>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub target: usize,
    pub sink: SinkSummary,
    pub dedup: DedupStats,
    pub workers: Vec<WorkerReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn target_reached(&self) -> bool {
        self.sink.written >= self.target
    }

    /// Total records emitted by all workers (before dedup)
    pub fn emitted(&self) -> usize {
        self.workers.iter().map(|w| w.emitted).sum()
    }

    pub fn queries(&self) -> usize {
        self.workers.iter().map(|w| w.queries).sum()
    }
}

/// Run one collection pass and wait for the sink to finish draining.
///
/// Returns the sink's error if writing failed; the stop signal is raised in
/// that case so workers wind down before this returns.
pub async fn run<S, W>(
    plan: &RunPlan,
    source: Arc<S>,
    writer: W,
    stop: StopSignal,
    progress: ProgressBar,
) -> Result<RunSummary, SinkError>
where
    S: SearchSource,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let start = Instant::now();
    log::info!(
        "Collecting {} records for {:?} with {} workers (batch {})",
        plan.target,
        plan.term,
        plan.workers.len(),
        plan.batch_size
    );

    let mut feeds = Vec::with_capacity(plan.workers.len());
    let mut workers = Vec::with_capacity(plan.workers.len());
    for (idx, w) in plan.workers.iter().enumerate() {
        let worker = Worker::new(
            w.name.as_str(),
            plan.term.as_str(),
            w.until,
            plan.batch_size,
            source.clone(),
            stop.clone(),
        );
        let (feed, handle) = worker.spawn();
        log::debug!("Started worker {} ({idx}) with window until {}", w.name, w.until);
        feeds.push(feed);
        workers.push(handle);
    }

    let merged = merge(feeds);
    let (unique, dedup) = Deduplicator::new().spawn(merged);
    let (done_tx, done_rx) = oneshot::channel();
    let sink = RecordSink::new(writer, plan.target, stop.clone(), progress).spawn(unique, done_tx);

    log::debug!("pipeline: waiting for completion");
    let outcome = done_rx.await.unwrap_or(Err(SinkError::Aborted));
    if outcome.is_err() {
        stop.request();
    }

    let reports = collect_reports(workers).await;
    let dedup = match dedup.await {
        Ok(stats) => stats,
        Err(e) => {
            log::error!("pipeline: dedup task failed: {e}");
            DedupStats::default()
        }
    };
    if let Err(e) = sink.await {
        log::error!("pipeline: sink task failed: {e}");
    }

    let sink = outcome?;
    Ok(RunSummary {
        target: plan.target,
        sink,
        dedup,
        workers: reports,
        elapsed: start.elapsed(),
    })
}

async fn collect_reports(handles: Vec<JoinHandle<WorkerReport>>) -> Vec<WorkerReport> {
    join_all(handles)
        .await
        .into_iter()
        .filter_map(|result| match result {
            Ok(report) => Some(report),
            Err(e) => {
                log::error!("pipeline: worker task failed: {e}");
                None
            }
        })
        .collect()
}
