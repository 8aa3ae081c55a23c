use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Run-level failures. Any of these aborts the whole run before (or instead of)
/// executing a plan.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("CSV file not found: {}", .0.display())]
    CatalogNotFound(PathBuf),

    #[error("No valid entries found in CSV")]
    EmptyCatalog,

    #[error("Duplicate target names detected: {} name(s)", .0.len())]
    DuplicateTargets(BTreeMap<String, Vec<PathBuf>>),
}

/// The title had nothing left after sanitization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Title became empty after sanitization: {title}")]
pub struct SanitizationError {
    pub title: String,
}

/// Why a single planned operation failed. Never aborts the run.
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Source not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Target already exists: {}", .0.display())]
    TargetExists(PathBuf),

    #[error("No write permission: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Verification failed: target not found after rename: {}", .0.display())]
    VerificationFailed(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
