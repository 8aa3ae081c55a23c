use crate::error::OperationError;
use crate::plan::PlannedOperation;
use crate::reporter::Reporter;
use chrono::{Local, TimeZone};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    pub dry_run: bool,
    /// Stamp every renamed folder with its timestamp. Timestamp-only operations
    /// are always stamped.
    pub update_mtime: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl ExecutionSummary {
    pub fn from_results(results: &[OperationResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}

/// Apply every operation in order. A failed operation is recorded and the next
/// one still runs; nothing already renamed is undone.
pub fn execute_plan(
    plan: &[PlannedOperation],
    options: &ExecuteOptions,
    reporter: &dyn Reporter,
) -> Vec<OperationResult> {
    reporter.on_execute_start(plan.len());
    let mut results = Vec::with_capacity(plan.len());

    for op in plan {
        let outcome = execute_operation(op, options, reporter);
        let success = outcome.is_ok();
        log_operation(op, outcome.as_ref().err(), reporter);
        reporter.on_operation_complete(&op.source, &op.destination, success);

        results.push(OperationResult {
            source: op.source.clone(),
            destination: op.destination.clone(),
            success,
            error: outcome.err().map(|e| e.to_string()),
        });
    }

    let summary = ExecutionSummary::from_results(&results);
    reporter.on_execute_complete(summary.succeeded, summary.failed);
    results
}

fn execute_operation(
    op: &PlannedOperation,
    options: &ExecuteOptions,
    reporter: &dyn Reporter,
) -> Result<(), OperationError> {
    let source = &op.source;
    let destination = &op.destination;

    if !source.exists() {
        return Err(OperationError::FolderNotFound(source.clone()));
    }
    if !source.is_dir() {
        return Err(OperationError::NotADirectory(source.clone()));
    }

    let mtime_only = op.is_mtime_only();
    let parent = source.parent().unwrap_or_else(|| Path::new("."));

    if !mtime_only {
        if destination.exists() {
            return Err(OperationError::TargetExists(destination.clone()));
        }
        if !is_writable(parent) {
            return Err(OperationError::PermissionDenied(parent.to_path_buf()));
        }
    }

    if options.dry_run {
        return Ok(());
    }

    if !mtime_only {
        fs::rename(source, destination).map_err(|e| rename_error(e, parent))?;
        verify_renamed(destination)?;
    }

    if options.update_mtime || mtime_only {
        if let Some(timestamp) = op.timestamp {
            stamp_folder(destination, timestamp, reporter);
        }
    }

    Ok(())
}

// Timestamp failures never fail the operation: the rename already happened.
fn stamp_folder(path: &Path, timestamp: i64, reporter: &dyn Reporter) {
    let time = FileTime::from_unix_time(timestamp, 0);
    let name = crate::plan::file_name_of(path);
    match filetime::set_file_times(path, time, time) {
        Ok(()) => {
            let day = Local
                .timestamp_opt(timestamp, 0)
                .single()
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| timestamp.to_string());
            reporter.record(
                Level::DEBUG,
                &format!("Updated mtime for {} to {}", name, day),
            );
        }
        Err(e) => reporter.record(
            Level::WARN,
            &format!("Failed to update mtime for {}: {}", name, e),
        ),
    }
}

fn verify_renamed(destination: &Path) -> Result<(), OperationError> {
    if destination.exists() {
        Ok(())
    } else {
        Err(OperationError::VerificationFailed(destination.to_path_buf()))
    }
}

fn rename_error(err: io::Error, parent: &Path) -> OperationError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => OperationError::PermissionDenied(parent.to_path_buf()),
        _ => OperationError::Io(err),
    }
}

// Only the read-only flag is consulted; ownership and ACLs surface later as
// a PermissionDenied from the rename itself.
fn is_writable(dir: &Path) -> bool {
    fs::metadata(dir)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

fn log_operation(op: &PlannedOperation, error: Option<&OperationError>, reporter: &dyn Reporter) {
    match error {
        None if op.is_mtime_only() => reporter.record(
            Level::INFO,
            &format!("SUCCESS (mtime only): {}", op.source_name()),
        ),
        None => reporter.record(
            Level::INFO,
            &format!("SUCCESS: {} => {}", op.source_name(), op.destination_name()),
        ),
        Some(e) => {
            reporter.record(
                Level::ERROR,
                &format!("FAILED: {} => {}", op.source_name(), op.destination_name()),
            );
            reporter.record(Level::ERROR, &format!("  Error: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{RecordingReporter, SilentReporter};
    use tempfile::tempdir;

    fn op(source: PathBuf, destination: PathBuf, timestamp: Option<i64>) -> PlannedOperation {
        PlannedOperation {
            source,
            destination,
            timestamp,
        }
    }

    fn mtime_of(path: &Path) -> i64 {
        FileTime::from_last_modification_time(&fs::metadata(path).unwrap()).unix_seconds()
    }

    #[test]
    fn test_renames_folder() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("RJ1");
        fs::create_dir(&source).unwrap();
        let destination = dir.path().join("Title");

        let results = execute_plan(
            &[op(source.clone(), destination.clone(), None)],
            &ExecuteOptions::default(),
            &SilentReporter,
        );
        assert!(results[0].success);
        assert!(!source.exists());
        assert!(destination.is_dir());
    }

    #[test]
    fn test_error_kinds() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain_file");
        fs::write(&file, "x").unwrap();
        let taken = dir.path().join("Taken");
        fs::create_dir(&taken).unwrap();
        let source = dir.path().join("RJ2");
        fs::create_dir(&source).unwrap();

        let plan = vec![
            op(dir.path().join("gone"), dir.path().join("A"), None),
            op(file.clone(), dir.path().join("B"), None),
            op(source.clone(), taken.clone(), None),
        ];
        let results = execute_plan(&plan, &ExecuteOptions::default(), &SilentReporter);
        assert!(results.iter().all(|r| !r.success));
        assert!(results[0].error.as_deref().unwrap().starts_with("Source not found"));
        assert!(results[1].error.as_deref().unwrap().starts_with("Not a directory"));
        assert!(results[2].error.as_deref().unwrap().starts_with("Target already exists"));
        assert!(source.is_dir());
    }

    #[test]
    fn test_timestamp_applied_when_enabled() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("RJ3");
        fs::create_dir(&source).unwrap();
        let destination = dir.path().join("Dated");
        let options = ExecuteOptions {
            dry_run: false,
            update_mtime: true,
        };

        let results = execute_plan(
            &[op(source, destination.clone(), Some(1_500_000_000))],
            &options,
            &SilentReporter,
        );
        assert!(results[0].success);
        assert_eq!(mtime_of(&destination), 1_500_000_000);
    }

    #[test]
    fn test_timestamp_ignored_when_disabled() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("RJ4");
        fs::create_dir(&source).unwrap();
        let destination = dir.path().join("Undated");

        execute_plan(
            &[op(source, destination.clone(), Some(1_000_000_000))],
            &ExecuteOptions::default(),
            &SilentReporter,
        );
        assert_ne!(mtime_of(&destination), 1_000_000_000);
    }

    #[test]
    fn test_mtime_only_operation_always_stamps() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("Already");
        fs::create_dir(&folder).unwrap();

        let reporter = RecordingReporter::new();
        let results = execute_plan(
            &[op(folder.clone(), folder.clone(), Some(1_234_567_890))],
            &ExecuteOptions::default(),
            &reporter,
        );
        assert!(results[0].success);
        assert_eq!(mtime_of(&folder), 1_234_567_890);
        assert!(reporter.contains(Level::INFO, "SUCCESS (mtime only): Already"));
    }

    #[test]
    fn test_dry_run_validates_but_does_not_touch() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("RJ5");
        fs::create_dir(&source).unwrap();
        let before = mtime_of(&source);
        let options = ExecuteOptions {
            dry_run: true,
            update_mtime: true,
        };

        let plan = vec![
            op(source.clone(), dir.path().join("Five"), Some(1_000_000_000)),
            op(dir.path().join("gone"), dir.path().join("Six"), None),
        ];
        let results = execute_plan(&plan, &options, &SilentReporter);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(source.is_dir());
        assert!(!dir.path().join("Five").exists());
        assert_eq!(mtime_of(&source), before);
    }

    #[test]
    fn test_timestamp_failure_is_only_a_warning() {
        let dir = tempdir().unwrap();
        let reporter = RecordingReporter::new();
        stamp_folder(&dir.path().join("vanished"), 1_500_000_000, &reporter);
        assert_eq!(reporter.count_at(Level::WARN), 1);
        assert!(reporter.contains(Level::WARN, "Failed to update mtime for vanished"));
    }

    #[test]
    fn test_read_only_parent_is_refused() {
        let dir = tempdir().unwrap();
        let parent = dir.path().join("locked");
        let source = parent.join("RJ6");
        fs::create_dir_all(&source).unwrap();
        let mut perms = fs::metadata(&parent).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&parent, perms.clone()).unwrap();

        let results = execute_plan(
            &[op(source.clone(), parent.join("Six"), None)],
            &ExecuteOptions::default(),
            &SilentReporter,
        );

        perms.set_readonly(false);
        fs::set_permissions(&parent, perms).unwrap();

        assert!(!results[0].success);
        assert!(results[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("No write permission"));
        assert!(source.is_dir());
    }

    #[test]
    fn test_rename_permission_error_names_parent() {
        let parent = Path::new("/library");
        let err = rename_error(io::Error::from(io::ErrorKind::PermissionDenied), parent);
        assert!(matches!(err, OperationError::PermissionDenied(ref p) if p == parent));
        assert_eq!(err.to_string(), "No write permission: /library");

        let err = rename_error(io::Error::from(io::ErrorKind::NotFound), parent);
        assert!(matches!(err, OperationError::Io(_)));
    }

    #[test]
    fn test_missing_destination_fails_verification() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("Renamed");
        let err = verify_renamed(&missing).unwrap_err();
        assert!(matches!(err, OperationError::VerificationFailed(ref p) if *p == missing));
        fs::create_dir(&missing).unwrap();
        assert!(verify_renamed(&missing).is_ok());
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            OperationResult {
                source: PathBuf::from("a"),
                destination: PathBuf::from("b"),
                success: true,
                error: None,
            },
            OperationResult {
                source: PathBuf::from("c"),
                destination: PathBuf::from("d"),
                success: false,
                error: Some("boom".to_string()),
            },
        ];
        let summary = ExecutionSummary::from_results(&results);
        assert_eq!(
            summary,
            ExecutionSummary {
                total: 2,
                succeeded: 1,
                failed: 1
            }
        );
    }
}
