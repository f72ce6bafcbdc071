//! Progress reporting and cooperative cancellation.
//!
//! An install runs as one long background task; the caller consumes
//! discrete progress events and may set the cancellation flag at any
//! time. The pipeline polls the flag before each fetch, at every streamed
//! chunk, and before each component's placement step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cooperative cancellation flag.
///
/// # Example
///
/// ```
/// use packforge::progress::CancelToken;
///
/// let token = CancelToken::new();
/// let worker_token = token.clone();
///
/// assert!(!worker_token.is_cancelled());
/// token.cancel();
/// assert!(worker_token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A single progress event emitted by the pipeline.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Overall percentage, 0-100. `None` while still indeterminate.
    pub percent: Option<u8>,
    /// Percentage of the currently-downloading artifact, 0-100.
    pub sub_percent: Option<u8>,
    /// Free-text description of the current step.
    pub step: String,
}

/// Callback invoked for every progress event.
pub type ProgressCallback = Box<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Emits progress events with a monotonically non-decreasing percentage.
///
/// The overall percentage never goes backwards even if individual stages
/// report out of order; sub-percentages reset freely per artifact.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    high_water: AtomicBool,
    last_percent: std::sync::atomic::AtomicU8,
}

impl ProgressReporter {
    /// Create a reporter wrapping an optional callback.
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            high_water: AtomicBool::new(false),
            last_percent: std::sync::atomic::AtomicU8::new(0),
        }
    }

    /// Reporter that discards all events.
    pub fn silent() -> Self {
        Self::new(None)
    }

    /// Report a step with an overall percentage.
    pub fn report(&self, percent: u8, step: &str) {
        self.emit(Some(percent.min(100)), None, step);
    }

    /// Report download progress within the current artifact.
    pub fn report_sub(&self, percent: u8, sub_percent: u8, step: &str) {
        self.emit(Some(percent.min(100)), Some(sub_percent.min(100)), step);
    }

    /// Report an indeterminate step (no percentage yet).
    pub fn report_indeterminate(&self, step: &str) {
        if self.high_water.load(Ordering::SeqCst) {
            // Once a percentage has been shown, stay determinate.
            let last = self.last_percent.load(Ordering::SeqCst);
            self.emit(Some(last), None, step);
        } else {
            self.emit(None, None, step);
        }
    }

    fn emit(&self, percent: Option<u8>, sub_percent: Option<u8>, step: &str) {
        let percent = percent.map(|p| {
            self.high_water.store(true, Ordering::SeqCst);
            // Clamp to the high-water mark so the bar never moves backwards.
            let last = self.last_percent.load(Ordering::SeqCst);
            let clamped = p.max(last);
            self.last_percent.store(clamped, Ordering::SeqCst);
            clamped
        });

        if let Some(ref cb) = self.callback {
            cb(&ProgressEvent {
                percent,
                sub_percent,
                step: step.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_cancel_token_starts_clear() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_token_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_progress_monotonic() {
        let seen: Arc<Mutex<Vec<Option<u8>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ProgressReporter::new(Some(Box::new(move |e: &ProgressEvent| {
            sink.lock().unwrap().push(e.percent);
        })));

        reporter.report(10, "a");
        reporter.report(50, "b");
        reporter.report(30, "c"); // late stage report, must not regress
        reporter.report(80, "d");

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![Some(10), Some(50), Some(50), Some(80)]);
    }

    #[test]
    fn test_progress_indeterminate_before_first_percent() {
        let seen: Arc<Mutex<Vec<Option<u8>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ProgressReporter::new(Some(Box::new(move |e: &ProgressEvent| {
            sink.lock().unwrap().push(e.percent);
        })));

        reporter.report_indeterminate("warming up");
        reporter.report(20, "working");
        reporter.report_indeterminate("still working");

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![None, Some(20), Some(20)]);
    }

    #[test]
    fn test_progress_clamps_above_100() {
        let seen: Arc<Mutex<Vec<Option<u8>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ProgressReporter::new(Some(Box::new(move |e: &ProgressEvent| {
            sink.lock().unwrap().push(e.percent);
        })));

        reporter.report(150, "overshoot");
        assert_eq!(*seen.lock().unwrap(), vec![Some(100)]);
    }
}
