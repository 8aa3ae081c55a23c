use indicatif::{ProgressBar, ProgressStyle};
use retitle_core::{Reporter, TracingReporter};
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;

/// CLI reporter: records go to tracing, execution shows an indicatif bar.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Reporter for CliReporter {
    fn record(&self, level: Level, message: &str) {
        let active = self.bar.lock().ok().and_then(|guard| guard.clone());
        match active {
            Some(pb) => pb.suspend(|| TracingReporter.record(level, message)),
            None => TracingReporter.record(level, message),
        }
    }

    fn on_execute_start(&self, total_operations: usize) {
        let pb = ProgressBar::new(total_operations as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Renaming [{bar:30.cyan/dim}] {pos}/{len} folders",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_operation_complete(&self, _source: &Path, _destination: &Path, _success: bool) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.inc(1);
            }
        }
    }

    fn on_execute_complete(&self, succeeded: usize, failed: usize) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Execution complete: {} succeeded, {} failed",
            succeeded, failed
        );
    }
}
