//! Sink error type. Any sink error is fatal to the run.

use std::io;

#[derive(Debug)]
pub enum SinkError {
    /// Writing a header or record line failed
    Write(io::Error),
    /// Flushing buffered output failed
    Flush(io::Error),
    /// The sink task ended without reporting completion
    Aborted,
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write(e) => write!(f, "sink write failed: {e}"),
            Self::Flush(e) => write!(f, "sink flush failed: {e}"),
            Self::Aborted => f.write_str("sink ended without signaling completion"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write(e) | Self::Flush(e) => Some(e),
            Self::Aborted => None,
        }
    }
}
