use parking_lot::Mutex;
use serde::Serialize;

use crate::error::SchedulerError;

/// The single seam every swallowed scheduler failure goes through.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &SchedulerError, context: &str);
}

/// Logs swallowed failures as warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &SchedulerError, context: &str) {
        tracing::warn!(code = error.code(), context, %error, "notification side effect skipped");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub code: &'static str,
    pub context: String,
    pub message: String,
}

/// Keeps every report so callers can inspect what was swallowed.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<ReportEntry>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries.lock().clone()
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.entries.lock().iter().map(|entry| entry.code).collect()
    }

    pub fn take(&self) -> Vec<ReportEntry> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl ErrorReporter for MemoryReporter {
    fn report(&self, error: &SchedulerError, context: &str) {
        TracingReporter.report(error, context);
        self.entries.lock().push(ReportEntry {
            code: error.code(),
            context: context.to_string(),
            message: error.to_string(),
        });
    }
}
