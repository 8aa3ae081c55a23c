use crate::reporter::Reporter;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::Level;
use walkdir::WalkDir;

const PART_SUFFIX: &str = r"\.part0*[1-9][0-9]*";

lazy_static::lazy_static! {
    static ref SUFFIX: Regex =
        Regex::new(&format!("(?i){}$", PART_SUFFIX)).expect("part suffix pattern is valid");
    static ref PREFIX: Regex =
        Regex::new(r"(?i)^[a-z]{2}[0-9]+").expect("prefix pattern is valid");
    static ref RENAMED: Regex =
        Regex::new(&format!(r"(?is)^([a-z]{{2}}[0-9]+)(?:_.*)?(?:{})?$", PART_SUFFIX))
            .expect("renamed folder pattern is valid");
}

/// A directory that matched a lookup, with its `.partN` marker if it had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFolder {
    pub path: PathBuf,
    pub part_suffix: Option<String>,
}

impl MatchedFolder {
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Snapshot of the direct child directories of a base directory, sorted by path.
#[derive(Debug, Clone)]
pub struct FolderScan {
    base_dir: PathBuf,
    folders: Vec<PathBuf>,
}

impl FolderScan {
    /// Read the immediate children of `base_dir`. A missing base directory is
    /// recorded as an error and yields an empty scan, so every later lookup
    /// comes back empty instead of aborting the run.
    pub fn scan(base_dir: &Path, reporter: &dyn Reporter) -> Self {
        let mut folders = Vec::new();

        if !base_dir.is_dir() {
            reporter.record(
                Level::ERROR,
                &format!("Base directory does not exist: {}", base_dir.display()),
            );
            return Self {
                base_dir: base_dir.to_path_buf(),
                folders,
            };
        }

        for entry in WalkDir::new(base_dir).min_depth(1).max_depth(1) {
            match entry {
                Ok(entry) => {
                    if entry.path().is_dir() {
                        folders.push(entry.into_path());
                    }
                }
                Err(err) => reporter.record(
                    Level::WARN,
                    &format!("Error reading entry in {}: {}", base_dir.display(), err),
                ),
            }
        }
        folders.sort();

        reporter.record(
            Level::DEBUG,
            &format!("Cached {} folders in {}", folders.len(), base_dir.display()),
        );

        Self {
            base_dir: base_dir.to_path_buf(),
            folders,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// Folders named `identifier` or `identifier.partN`, ignoring case.
    pub fn find_by_identifier(&self, identifier: &str) -> Vec<MatchedFolder> {
        self.find_by_stem(identifier)
    }

    /// Folders named `sanitized_title` or `sanitized_title.partN`, ignoring case.
    /// Used to locate folders a previous run already renamed.
    pub fn find_by_title(&self, sanitized_title: &str) -> Vec<MatchedFolder> {
        self.find_by_stem(sanitized_title)
    }

    fn find_by_stem(&self, stem: &str) -> Vec<MatchedFolder> {
        let stem = stem.to_lowercase();
        self.folders
            .iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                let suffix = part_suffix(name);
                let matched = name.to_lowercase() == stem
                    || suffix.is_some_and(|sfx| {
                        name[..name.len() - sfx.len()].to_lowercase() == stem
                    });
                matched.then(|| MatchedFolder {
                    path: path.clone(),
                    part_suffix: suffix.map(str::to_string),
                })
            })
            .collect()
    }
}

/// The trailing `.partN` of a folder name, with its original casing.
pub fn part_suffix(name: &str) -> Option<&str> {
    SUFFIX.find(name).map(|m| m.as_str())
}

/// True when a folder name begins with something shaped like an identifier.
pub fn starts_with_identifier(name: &str) -> bool {
    PREFIX.is_match(name)
}

/// Pull the identifier out of `ID`, `ID_title`, `ID.partN` or `ID_title.partN`,
/// upper-cased. Anything else yields `None`.
pub fn extract_identifier(name: &str) -> Option<String> {
    RENAMED
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}
