//! Shared fixtures: in-memory search sources and a file-backed run helper

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use indicatif::ProgressBar;
use tempfile::TempDir;
use tokio::io::AsyncWrite;
use tweetline_core::{
    RawItem, RawKind, RunPlan, RunSummary, SearchQuery, SearchSource, SinkError, StopSignal,
    WorkerPlan,
};

pub const HANG_LIMIT: Duration = Duration::from_secs(10);

pub fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, n).unwrap()
}

pub fn raw(id: u64) -> RawItem {
    RawItem {
        id,
        id_str: id.to_string(),
        text: format!("post {id}"),
        author_name: "Grace Hopper".into(),
        author_handle: "grace".into(),
        created_at: "Fri, 01 Mar 2024 12:00:00 +0000".into(),
        kind: RawKind::Original,
    }
}

pub fn reshare(id: u64, original: u64) -> RawItem {
    RawItem {
        kind: RawKind::Reshare {
            original_id: original.to_string(),
        },
        ..raw(id)
    }
}

/// Plan with one worker per window, named Alpha, Bravo, ...
pub fn plan(term: &str, target: usize, batch_size: u32, windows: &[NaiveDate]) -> RunPlan {
    const NAMES: [&str; 5] = ["Alpha", "Bravo", "Charlie", "Delta", "Echo"];
    RunPlan {
        term: term.into(),
        target,
        batch_size,
        workers: windows
            .iter()
            .enumerate()
            .map(|(i, until)| WorkerPlan {
                name: NAMES[i].into(),
                until: *until,
            })
            .collect(),
    }
}

type Page = Result<Vec<RawItem>, io::Error>;

/// Canned pages per window; a window with no pages left answers empty.
#[derive(Default)]
pub struct Scripted {
    pages: Mutex<HashMap<NaiveDate, VecDeque<Page>>>,
    pub queries: AtomicUsize,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(self, until: NaiveDate, pages: Vec<Page>) -> Self {
        self.pages.lock().unwrap().insert(until, pages.into());
        self
    }
}

impl SearchSource for Scripted {
    type Error = io::Error;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawItem>, io::Error> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let mut pages = self.pages.lock().unwrap();
        pages
            .get_mut(&query.until)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(Vec::new()))
    }
}

/// Never runs dry: every query returns a full batch below the cursor.
///
/// Each window gets its own id range so windows never overlap.
#[derive(Default)]
pub struct Endless {
    pub queries: AtomicUsize,
}

impl SearchSource for Endless {
    type Error = io::Error;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawItem>, io::Error> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        tokio::task::yield_now().await;
        let top = query
            .max_id
            .unwrap_or(u64::from(query.until.day()) * 1_000_000_000);
        Ok((0..u64::from(query.batch_size)).map(|i| raw(top - i)).collect())
    }
}

/// Writer that fails every write
pub struct Broken;

impl AsyncWrite for Broken {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::StorageFull, "disk full")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::StorageFull, "disk full")))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Run the pipeline into a temp file; returns the summary and the file's lines.
///
/// Panics if the run does not complete within [`HANG_LIMIT`].
pub async fn run_to_file<S: SearchSource>(
    plan: &RunPlan,
    source: Arc<S>,
    stop: StopSignal,
) -> (Result<RunSummary, SinkError>, Vec<String>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.csv");
    let file = tokio::fs::File::create(&path).await.unwrap();

    let result = tokio::time::timeout(
        HANG_LIMIT,
        tweetline_core::run(plan, source, file, stop, ProgressBar::hidden()),
    )
    .await
    .expect("pipeline did not complete");

    let content = std::fs::read_to_string(&path).unwrap();
    (result, content.lines().map(String::from).collect())
}
