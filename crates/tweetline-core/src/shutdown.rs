//! Broadcast stop signal shared by the sink, the workers and signal handlers

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Write-once, read-many stop flag.
///
/// The sink requests a stop when the target count is reached; SIGINT/SIGTERM
/// handlers set the same flag. Workers poll it without blocking before each
/// query and after each emitted record.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a stop was requested
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Request a stop. Returns `true` only for the call that flipped the flag.
    pub fn request(&self) -> bool {
        !self.flag.swap(true, Ordering::Relaxed)
    }

    /// Underlying flag, for `signal_hook::flag::register`
    pub fn as_flag(&self) -> Arc<AtomicBool> {
        self.flag.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clear() {
        assert!(!StopSignal::new().is_requested());
    }

    #[test]
    fn request_is_idempotent() {
        let stop = StopSignal::new();
        assert!(stop.request());
        assert!(!stop.request());
        assert!(stop.is_requested());
    }

    #[test]
    fn clones_observe_request() {
        let stop = StopSignal::new();
        let observers: Vec<StopSignal> = (0..4).map(|_| stop.clone()).collect();
        stop.request();
        assert!(observers.iter().all(StopSignal::is_requested));
    }

    #[test]
    fn external_flag_store_is_observed() {
        let stop = StopSignal::new();
        stop.as_flag().store(true, Ordering::Relaxed);
        assert!(stop.is_requested());
        // signal handler got there first
        assert!(!stop.request());
    }
}
