//! First-seen deduplication by canonical record id

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::CHANNEL_CAPACITY;
use crate::record::Record;

/// Counts reported when the dedup stage finishes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub unique: usize,
    pub duplicates: usize,
}

/// Owns the id → first-producer table for one run.
///
/// Runs on a single task, so the table needs no locking.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: FxHashMap<String, Arc<str>>,
    stats: DedupStats,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `record` if its id is new. Returns `true` when it should be forwarded.
    pub fn admit(&mut self, record: &Record) -> bool {
        if let Some(first) = self.first_source(&record.id) {
            log::trace!(
                "dedup: duplicate id {} (secondary {}) from {}, first reported by {first}",
                record.id,
                record.secondary_id,
                record.source_name
            );
            self.stats.duplicates += 1;
            return false;
        }
        self.seen
            .insert(record.id.clone(), record.source_name.clone());
        self.stats.unique += 1;
        log::trace!(
            "dedup: new id {} (secondary {}) from {}",
            record.id,
            record.secondary_id,
            record.source_name
        );
        true
    }

    /// Producer that first reported `id`, if seen
    pub fn first_source(&self, id: &str) -> Option<&str> {
        self.seen.get(id).map(|s| &**s)
    }

    pub fn stats(&self) -> DedupStats {
        self.stats
    }

    /// Run the stage on its own task.
    ///
    /// The output closes when `input` closes (or when the output's receiver is
    /// dropped, in which case `input` is dropped too).
    pub fn spawn(
        mut self,
        mut input: mpsc::Receiver<Record>,
    ) -> (mpsc::Receiver<Record>, JoinHandle<DedupStats>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(async move {
            log::debug!("dedup: listening");
            while let Some(record) = input.recv().await {
                if self.admit(&record) && tx.send(record).await.is_err() {
                    log::debug!("dedup: consumer gone");
                    break;
                }
            }
            log::debug!(
                "dedup: input closed ({} unique, {} duplicates)",
                self.stats.unique,
                self.stats.duplicates
            );
            self.stats
        });
        (rx, handle)
    }
}
