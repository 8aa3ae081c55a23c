use crate::catalog::{self, Catalog};
use crate::dupes;
use crate::error::Error;
use crate::executor::{self, ExecuteOptions, OperationResult};
use crate::plan::{self, PlanOptions, RenamePlan};
use crate::reporter::Reporter;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::Level;

#[derive(Debug, Clone, Copy)]
pub enum PlanMode {
    /// Rename `ID[.partN]` folders to their catalog titles.
    Rename(PlanOptions),
    /// Re-title `ID_title[.partN]` folders and always stamp purchase dates.
    Refresh { max_length: usize },
}

impl PlanMode {
    fn updates_mtime(&self) -> bool {
        match self {
            PlanMode::Rename(options) => options.update_mtime,
            PlanMode::Refresh { .. } => true,
        }
    }
}

pub struct RenameEngine {
    base_dir: PathBuf,
    catalog: Catalog,
    mode: PlanMode,
}

#[derive(Debug)]
pub struct PlanResult {
    pub plan: RenamePlan,
    /// Destination names claimed by more than one source.
    pub duplicates: BTreeMap<String, Vec<PathBuf>>,
    pub plan_duration: Duration,
}

impl PlanResult {
    pub fn ensure_no_duplicates(&self) -> Result<(), Error> {
        if self.duplicates.is_empty() {
            Ok(())
        } else {
            Err(Error::DuplicateTargets(self.duplicates.clone()))
        }
    }
}

impl RenameEngine {
    pub fn new(base_dir: &Path, catalog: Catalog, mode: PlanMode) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            catalog,
            mode,
        }
    }

    /// Check the target directory, then load the catalog. Each failure here
    /// is fatal for the run.
    pub fn load(
        base_dir: &Path,
        catalog_path: &Path,
        mode: PlanMode,
        reporter: &dyn Reporter,
    ) -> Result<Self, Error> {
        if !base_dir.exists() {
            return Err(Error::DirectoryNotFound(base_dir.to_path_buf()));
        }
        if !base_dir.is_dir() {
            return Err(Error::NotADirectory(base_dir.to_path_buf()));
        }

        reporter.record(
            Level::INFO,
            &format!("Loading CSV: {}", catalog_path.display()),
        );
        let catalog = catalog::load_catalog(catalog_path, reporter)?;
        reporter.record(
            Level::INFO,
            &format!("Loaded {} entries from CSV", catalog.len()),
        );
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        Ok(Self::new(base_dir, catalog, mode))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn mode(&self) -> PlanMode {
        self.mode
    }

    /// Build the plan and check it for colliding destination names.
    pub fn plan(&self, reporter: &dyn Reporter) -> PlanResult {
        reporter.record(
            Level::INFO,
            &format!("Scanning directory: {}", self.base_dir.display()),
        );
        let start = Instant::now();
        let plan = match &self.mode {
            PlanMode::Rename(options) => {
                plan::generate_rename_plan(&self.base_dir, &self.catalog, options, reporter)
            }
            PlanMode::Refresh { max_length } => {
                plan::generate_refresh_plan(&self.base_dir, &self.catalog, *max_length, reporter)
            }
        };
        let plan_duration = start.elapsed();
        reporter.record(
            Level::INFO,
            &format!("Generated plan with {} operations", plan.len()),
        );

        let duplicates = dupes::find_duplicate_targets(&plan.operations);

        PlanResult {
            plan,
            duplicates,
            plan_duration,
        }
    }

    /// Run the plan. A plan with duplicate destinations is refused unless this
    /// is a dry run, which never touches the filesystem.
    pub fn execute(
        &self,
        result: &PlanResult,
        dry_run: bool,
        reporter: &dyn Reporter,
    ) -> Result<Vec<OperationResult>, Error> {
        if !dry_run {
            result.ensure_no_duplicates()?;
        }
        let options = ExecuteOptions {
            dry_run,
            update_mtime: self.mode.updates_mtime(),
        };
        Ok(executor::execute_plan(
            &result.plan.operations,
            &options,
            reporter,
        ))
    }
}
