use std::path::Path;
use std::sync::Mutex;
use tracing::Level;

/// Sink for diagnostics and execution progress.
///
/// Every engine component takes one of these instead of logging globally. The
/// CLI wires a tracing/indicatif implementation, tests use `RecordingReporter`.
/// All methods have default no-op implementations.
pub trait Reporter: Send + Sync {
    fn record(&self, _level: Level, _message: &str) {}
    fn on_execute_start(&self, _total_operations: usize) {}
    fn on_operation_complete(&self, _source: &Path, _destination: &Path, _success: bool) {}
    fn on_execute_complete(&self, _succeeded: usize, _failed: usize) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl Reporter for SilentReporter {}

/// Forwards records to `tracing` events at the matching level.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn record(&self, level: Level, message: &str) {
        emit(level, message);
    }
}

fn emit(level: Level, message: &str) {
    match level {
        Level::ERROR => tracing::error!("{}", message),
        Level::WARN => tracing::warn!("{}", message),
        Level::INFO => tracing::info!("{}", message),
        Level::DEBUG => tracing::debug!("{}", message),
        Level::TRACE => tracing::trace!("{}", message),
    }
}

/// Keeps every record in memory.
#[derive(Default)]
pub struct RecordingReporter {
    records: Mutex<Vec<(Level, String)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.records().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn record(&self, level: Level, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((level, message.to_string()));
        }
    }
}
