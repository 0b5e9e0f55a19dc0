//! Failure reporting.
//!
//! Components receive an `Arc<dyn ErrorSink>` at construction and report
//! every I/O and mapping failure to it, in addition to returning the error.
//! There is no process-wide instance.

use std::error::Error;
use std::sync::{Arc, Mutex};

use tracing::error;

/// Receives failures observed by the search core.
///
/// Implementations only record; they must not panic or halt the host.
pub trait ErrorSink: Send + Sync {
    /// Report a failure. `context` names the operation that failed.
    fn notify(&self, context: &str, error: &dyn Error);
}

/// Default sink: emits each failure as a `tracing` error event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl TracingErrorSink {
    pub fn shared() -> Arc<dyn ErrorSink> {
        Arc::new(Self)
    }
}

impl ErrorSink for TracingErrorSink {
    fn notify(&self, context: &str, error: &dyn Error) {
        error!(context, error = %error, "Search core failure");
    }
}

/// A failure captured by [`CollectingErrorSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedFailure {
    pub context: String,
    pub message: String,
}

/// Sink that keeps every reported failure for later inspection.
///
/// Also forwards to `tracing` so nothing is lost when the host never looks.
#[derive(Debug, Default)]
pub struct CollectingErrorSink {
    failures: Mutex<Vec<ReportedFailure>>,
}

impl CollectingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all failures reported so far.
    pub fn failures(&self) -> Vec<ReportedFailure> {
        match self.failures.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.failures.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorSink for CollectingErrorSink {
    fn notify(&self, context: &str, error: &dyn Error) {
        TracingErrorSink.notify(context, error);
        let failure = ReportedFailure {
            context: context.to_string(),
            message: error.to_string(),
        };
        match self.failures.lock() {
            Ok(mut guard) => guard.push(failure),
            Err(poisoned) => poisoned.into_inner().push(failure),
        }
    }
}
