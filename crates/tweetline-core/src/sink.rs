//! CSV sink: writes up to a target count, then stops the workers and drains

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::SinkError;
use crate::progress::fmt_num;
use crate::record::Record;
use crate::shutdown::StopSignal;

/// First line of every output file
pub const HEADER: &str = "ID, URL, RETWEET ID, TEXT, USER NAME, SCREEN NAME, CREATED, FINDER";

const PERMALINK_BASE: &str = "https://twitter.com/statuses/";

/// Info log every N written records
const LOG_INTERVAL: usize = 100;

/// Write buffer size (64KB)
const WRITE_BUF_SIZE: usize = 64 * 1024;

/// Make text safe inside a double-quoted CSV field.
///
/// Line breaks become a single space each; `"` is doubled.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r', '"']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                out.push(' ');
            }
            '\n' => out.push(' '),
            '"' => out.push_str("\"\""),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// One output line (without trailing newline)
pub fn format_row(record: &Record) -> String {
    let p = &record.payload;
    format!(
        "{id},{PERMALINK_BASE}{id},{secondary},\"{text}\",\"{name}\",{handle},\"{created}\", {finder}",
        id = record.id,
        secondary = record.secondary_id,
        text = sanitize(&p.text),
        name = sanitize(&p.author_name),
        handle = p.author_handle,
        created = sanitize(&p.created_at),
        finder = record.source_name,
    )
}

/// Counts reported on completion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub written: usize,
    /// Unique records that arrived after the target was reached
    pub discarded: usize,
}

/// Completion handle: receives exactly one message once the sink is done
pub type Completion = oneshot::Sender<Result<SinkSummary, SinkError>>;

/// Terminal pipeline stage.
///
/// Keeps reading until its input closes even after the target is reached, so
/// upstream stages never block on a full channel.
pub struct RecordSink<W> {
    writer: BufWriter<W>,
    target: usize,
    stop: StopSignal,
    progress: ProgressBar,
    summary: SinkSummary,
}

impl<W> std::fmt::Debug for RecordSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSink")
            .field("target", &self.target)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl<W: AsyncWrite + Unpin + Send + 'static> RecordSink<W> {
    pub fn new(writer: W, target: usize, stop: StopSignal, progress: ProgressBar) -> Self {
        Self {
            writer: BufWriter::with_capacity(WRITE_BUF_SIZE, writer),
            target,
            stop,
            progress,
            summary: SinkSummary::default(),
        }
    }

    pub fn spawn(self, input: mpsc::Receiver<Record>, done: Completion) -> JoinHandle<()> {
        tokio::spawn(self.run(input, done))
    }

    /// Consume `input` to the end and report on `done`.
    ///
    /// On a write failure the stop signal is raised and the error is reported;
    /// dropping `input` then unwinds the upstream stages.
    pub async fn run(mut self, mut input: mpsc::Receiver<Record>, done: Completion) {
        let result = self.consume(&mut input).await;
        match &result {
            Ok(summary) => log::debug!(
                "sink: completed, {} written, {} discarded",
                summary.written,
                summary.discarded
            ),
            Err(e) => {
                log::error!("sink: {e}");
                self.stop.request();
            }
        }
        self.progress.finish_and_clear();
        drop(input);
        if done.send(result).is_err() {
            log::warn!("sink: nobody waiting for completion");
        }
    }

    async fn consume(
        &mut self,
        input: &mut mpsc::Receiver<Record>,
    ) -> Result<SinkSummary, SinkError> {
        self.write_line(HEADER).await?;
        log::debug!("sink: waiting for {} records", self.target);
        if self.target == 0 {
            self.reached_target();
        }

        while let Some(record) = input.recv().await {
            if self.summary.written >= self.target {
                self.summary.discarded += 1;
                log::trace!(
                    "sink: target {} reached, dropping id {} from {}",
                    self.target,
                    record.id,
                    record.source_name
                );
                continue;
            }

            self.write_line(&format_row(&record)).await?;
            self.summary.written += 1;
            self.progress.inc(1);

            if self.summary.written % LOG_INTERVAL == 0 {
                log::info!("sink: written {} records...", fmt_num(self.summary.written));
            }
            if self.summary.written == self.target {
                log::debug!(
                    "sink: target hit with id {} from {} ({})",
                    record.id,
                    record.source_name,
                    record.payload.created_at
                );
                self.reached_target();
            }
        }

        self.writer.flush().await.map_err(SinkError::Flush)?;
        Ok(self.summary)
    }

    async fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(SinkError::Write)?;
        self.writer.write_all(b"\n").await.map_err(SinkError::Write)
    }

    fn reached_target(&self) {
        if self.stop.request() {
            log::info!("sink: target of {} reached, stopping workers", self.target);
        }
    }
}

/// Output file written to `<name>.tmp` and renamed into place on commit
#[derive(Debug)]
pub struct OutputFile {
    tmp_path: PathBuf,
    final_path: PathBuf,
}

impl OutputFile {
    /// Create the temporary file, removing a stale one first
    pub async fn create(path: &Path) -> io::Result<(Self, tokio::fs::File)> {
        let final_path = path.to_path_buf();
        let mut tmp_name = final_path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"))?
            .to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = final_path.with_file_name(tmp_name);

        if tokio::fs::try_exists(&tmp_path).await? {
            log::warn!("Removing stale tmp file: {}", tmp_path.display());
            tokio::fs::remove_file(&tmp_path).await?;
        }
        let file = tokio::fs::File::create(&tmp_path).await?;
        Ok((
            Self {
                tmp_path,
                final_path,
            },
            file,
        ))
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Atomically rename tmp → final
    pub async fn commit(self) -> io::Result<()> {
        tokio::fs::rename(&self.tmp_path, &self.final_path).await
    }

    /// Remove the tmp file after a failed run
    pub async fn discard(self) -> io::Result<()> {
        match tokio::fs::remove_file(&self.tmp_path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
