use crate::catalog::Catalog;
use crate::config::DEFAULT_MAX_FILENAME_LENGTH;
use crate::matcher::{self, FolderScan};
use crate::reporter::Reporter;
use crate::sanitize::sanitize;
use chrono::{Local, NaiveDateTime, TimeZone};
use std::path::{Path, PathBuf};
use tracing::Level;

pub const PURCHASE_DATE_FORMAT: &str = "%Y/%m/%d %H:%M";

/// One rename (or, when `source == destination`, one timestamp refresh).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOperation {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Unix seconds to stamp as the folder's access and modification time.
    pub timestamp: Option<i64>,
}

impl PlannedOperation {
    pub fn is_mtime_only(&self) -> bool {
        self.source == self.destination
    }

    pub fn source_name(&self) -> String {
        file_name_of(&self.source)
    }

    pub fn destination_name(&self) -> String {
        file_name_of(&self.destination)
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    pub max_length: usize,
    /// Drop `.partN` when an identifier matched exactly one folder.
    pub remove_suffix: bool,
    /// Also look for already-renamed folders by title so their dates can be fixed.
    pub update_mtime: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_FILENAME_LENGTH,
            remove_suffix: false,
            update_mtime: false,
        }
    }
}

/// The ordered operations plus everything that was left out of them.
#[derive(Debug, Clone, Default)]
pub struct RenamePlan {
    pub operations: Vec<PlannedOperation>,
    pub not_found: Vec<String>,
    pub sanitization_errors: Vec<String>,
    pub invalid_names: Vec<String>,
}

impl RenamePlan {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Parse `YYYY/MM/DD HH:MM` and return local midnight of that day as Unix
/// seconds. Anything unparseable is recorded as a warning and yields `None`.
pub fn parse_purchase_date(date_str: &str, reporter: &dyn Reporter) -> Option<i64> {
    if date_str.is_empty() {
        return None;
    }

    let parsed = match NaiveDateTime::parse_from_str(date_str, PURCHASE_DATE_FORMAT) {
        Ok(parsed) => parsed,
        Err(e) => {
            reporter.record(
                Level::WARN,
                &format!("Failed to parse purchase date '{}': {}", date_str, e),
            );
            return None;
        }
    };

    let midnight = parsed.date().and_hms_opt(0, 0, 0)?;
    match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => Some(local.timestamp()),
        None => {
            reporter.record(
                Level::WARN,
                &format!("Purchase date '{}' has no local midnight", date_str),
            );
            None
        }
    }
}

/// Map every catalog entry onto the folders named after its identifier.
///
/// Entries are visited in catalog order and matches in path order, so the same
/// inputs always give the same plan. Suffixes are kept whenever more than one
/// folder matched; with a single match they are dropped only if
/// `remove_suffix` is set.
pub fn generate_rename_plan(
    base_dir: &Path,
    catalog: &Catalog,
    options: &PlanOptions,
    reporter: &dyn Reporter,
) -> RenamePlan {
    let scan = FolderScan::scan(base_dir, reporter);
    let mut plan = RenamePlan::default();

    for entry in catalog.iter() {
        let sanitized_title = match sanitize(&entry.title, options.max_length) {
            Ok(title) => title,
            Err(e) => {
                reporter.record(
                    Level::ERROR,
                    &format!("Failed to sanitize title for {}: {}", entry.identifier, e),
                );
                plan.sanitization_errors.push(entry.identifier.clone());
                continue;
            }
        };

        let timestamp = entry
            .purchase_date
            .as_deref()
            .and_then(|date| parse_purchase_date(date, reporter));

        let mut matching_folders = scan.find_by_identifier(&entry.identifier);
        if matching_folders.is_empty() && options.update_mtime {
            matching_folders = scan.find_by_title(&sanitized_title);
        }

        if matching_folders.is_empty() {
            reporter.record(
                Level::DEBUG,
                &format!("No folder found for {}", entry.identifier),
            );
            plan.not_found.push(entry.identifier.clone());
            continue;
        }

        let keep_suffix = matching_folders.len() > 1 || !options.remove_suffix;

        for folder in matching_folders {
            let new_name = match (&folder.part_suffix, keep_suffix) {
                (Some(suffix), true) => format!("{}{}", sanitized_title, suffix),
                _ => sanitized_title.clone(),
            };
            let destination = folder.path.with_file_name(new_name);
            plan.operations.push(PlannedOperation {
                source: folder.path,
                destination,
                timestamp,
            });
        }
    }

    if !plan.not_found.is_empty() {
        reporter.record(
            Level::INFO,
            &format!(
                "Folders not found for {} identifiers (this is normal if you don't have all items downloaded)",
                plan.not_found.len()
            ),
        );
    }
    if !plan.sanitization_errors.is_empty() {
        reporter.record(
            Level::WARN,
            &format!(
                "Sanitization errors for {} identifiers",
                plan.sanitization_errors.len()
            ),
        );
    }

    plan
}

/// Plan for folders a previous pass already renamed to `ID_title[.partN]`:
/// each is renamed to `ID_<current sanitized title>[.partN]`. A folder already
/// carrying the current title gets a timestamp-only operation.
pub fn generate_refresh_plan(
    base_dir: &Path,
    catalog: &Catalog,
    max_length: usize,
    reporter: &dyn Reporter,
) -> RenamePlan {
    let scan = FolderScan::scan(base_dir, reporter);
    let mut plan = RenamePlan::default();

    let candidates: Vec<(&PathBuf, &str)> = scan
        .folders()
        .iter()
        .filter_map(|path| Some((path, path.file_name()?.to_str()?)))
        .filter(|(_, name)| matcher::starts_with_identifier(name))
        .collect();
    reporter.record(
        Level::INFO,
        &format!("Found {} folders with identifiers", candidates.len()),
    );

    for (path, folder_name) in candidates {
        let identifier = match matcher::extract_identifier(folder_name) {
            Some(identifier) => identifier,
            None => {
                reporter.record(
                    Level::WARN,
                    &format!("Could not extract identifier from: {}", folder_name),
                );
                plan.invalid_names.push(folder_name.to_string());
                continue;
            }
        };

        let entry = match catalog.get(&identifier) {
            Some(entry) => entry,
            None => {
                reporter.record(
                    Level::DEBUG,
                    &format!("Identifier not in CSV: {}", identifier),
                );
                plan.not_found.push(identifier);
                continue;
            }
        };

        let sanitized_title = match sanitize(&entry.title, max_length) {
            Ok(title) => title,
            Err(e) => {
                reporter.record(
                    Level::ERROR,
                    &format!("Failed to sanitize title for {}: {}", identifier, e),
                );
                plan.sanitization_errors.push(identifier);
                continue;
            }
        };

        let timestamp = entry
            .purchase_date
            .as_deref()
            .and_then(|date| parse_purchase_date(date, reporter));

        let suffix = matcher::part_suffix(folder_name).unwrap_or_default();
        let new_name = format!("{}_{}{}", identifier, sanitized_title, suffix);

        plan.operations.push(PlannedOperation {
            source: path.clone(),
            destination: path.with_file_name(new_name),
            timestamp,
        });
    }

    if !plan.not_found.is_empty() {
        reporter.record(
            Level::INFO,
            &format!(
                "Identifiers not in CSV: {} (normal if CSV is not complete)",
                plan.not_found.len()
            ),
        );
    }
    if !plan.invalid_names.is_empty() {
        reporter.record(
            Level::WARN,
            &format!("Invalid folder format: {} folders", plan.invalid_names.len()),
        );
    }
    if !plan.sanitization_errors.is_empty() {
        reporter.record(
            Level::WARN,
            &format!(
                "Sanitization errors: {} identifiers",
                plan.sanitization_errors.len()
            ),
        );
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::reporter::{RecordingReporter, SilentReporter};
    use std::fs;
    use tempfile::tempdir;

    fn entry(identifier: &str, title: &str, date: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            identifier: identifier.to_string(),
            title: title.to_string(),
            purchase_date: date.map(str::to_string),
        }
    }

    fn make_dirs(base: &Path, names: &[&str]) {
        for name in names {
            fs::create_dir(base.join(name)).unwrap();
        }
    }

    fn destination_names(plan: &RenamePlan) -> Vec<String> {
        plan.operations.iter().map(|op| op.destination_name()).collect()
    }

    #[test]
    fn test_parse_purchase_date_is_local_midnight() {
        let expected = Local
            .with_ymd_and_hms(2019, 1, 21, 0, 0, 0)
            .earliest()
            .unwrap()
            .timestamp();
        assert_eq!(
            parse_purchase_date("2019/01/21 21:56", &SilentReporter),
            Some(expected)
        );
    }

    #[test]
    fn test_parse_purchase_date_failure_warns() {
        let reporter = RecordingReporter::new();
        assert_eq!(parse_purchase_date("21-01-2019", &reporter), None);
        assert!(reporter.contains(Level::WARN, "Failed to parse purchase date '21-01-2019'"));
        assert_eq!(parse_purchase_date("", &reporter), None);
        assert_eq!(reporter.count_at(Level::WARN), 1);
    }

    #[test]
    fn test_single_folder_renamed_to_sanitized_title() {
        let dir = tempdir().unwrap();
        make_dirs(dir.path(), &["RJ000001"]);
        let catalog: Catalog = vec![entry("RJ000001", "Test: Title?", None)]
            .into_iter()
            .collect();

        let plan = generate_rename_plan(dir.path(), &catalog, &PlanOptions::default(), &SilentReporter);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.operations[0].source, dir.path().join("RJ000001"));
        assert_eq!(plan.operations[0].destination, dir.path().join("Test：Title？"));
        assert_eq!(plan.operations[0].timestamp, None);
    }

    #[test]
    fn test_multi_part_keeps_suffix_even_with_remove_suffix() {
        let dir = tempdir().unwrap();
        make_dirs(dir.path(), &["RJ000002.part2", "RJ000002.part1"]);
        let catalog: Catalog = vec![entry("RJ000002", "Foo", None)].into_iter().collect();

        for remove_suffix in [false, true] {
            let options = PlanOptions {
                remove_suffix,
                ..PlanOptions::default()
            };
            let plan = generate_rename_plan(dir.path(), &catalog, &options, &SilentReporter);
            assert_eq!(destination_names(&plan), vec!["Foo.part1", "Foo.part2"]);
        }
    }

    #[test]
    fn test_single_part_suffix_removal() {
        let dir = tempdir().unwrap();
        make_dirs(dir.path(), &["RJ000003.part1"]);
        let catalog: Catalog = vec![entry("RJ000003", "Bar", None)].into_iter().collect();

        let kept = generate_rename_plan(dir.path(), &catalog, &PlanOptions::default(), &SilentReporter);
        assert_eq!(destination_names(&kept), vec!["Bar.part1"]);

        let options = PlanOptions {
            remove_suffix: true,
            ..PlanOptions::default()
        };
        let dropped = generate_rename_plan(dir.path(), &catalog, &options, &SilentReporter);
        assert_eq!(destination_names(&dropped), vec!["Bar"]);
    }

    #[test]
    fn test_not_found_and_sanitization_errors_are_counted() {
        let dir = tempdir().unwrap();
        make_dirs(dir.path(), &["RJ000004"]);
        let catalog: Catalog = vec![
            entry("RJ000004", " . ", None),
            entry("RJ000005", "Missing", None),
        ]
        .into_iter()
        .collect();

        let reporter = RecordingReporter::new();
        let plan = generate_rename_plan(dir.path(), &catalog, &PlanOptions::default(), &reporter);
        assert!(plan.is_empty());
        assert_eq!(plan.sanitization_errors, vec!["RJ000004"]);
        assert_eq!(plan.not_found, vec!["RJ000005"]);
        assert!(reporter.contains(Level::ERROR, "Failed to sanitize title for RJ000004"));
    }

    #[test]
    fn test_bad_date_keeps_entry_without_timestamp() {
        let dir = tempdir().unwrap();
        make_dirs(dir.path(), &["RJ000006"]);
        let catalog: Catalog = vec![entry("RJ000006", "Six", Some("yesterday"))]
            .into_iter()
            .collect();

        let plan = generate_rename_plan(dir.path(), &catalog, &PlanOptions::default(), &SilentReporter);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.operations[0].timestamp, None);
    }

    #[test]
    fn test_title_fallback_only_in_mtime_mode() {
        let dir = tempdir().unwrap();
        make_dirs(dir.path(), &["Seven"]);
        let catalog: Catalog = vec![entry("RJ000007", "Seven", Some("2020/02/02 10:00"))]
            .into_iter()
            .collect();

        let plain = generate_rename_plan(dir.path(), &catalog, &PlanOptions::default(), &SilentReporter);
        assert!(plain.is_empty());
        assert_eq!(plain.not_found, vec!["RJ000007"]);

        let options = PlanOptions {
            update_mtime: true,
            ..PlanOptions::default()
        };
        let refresh = generate_rename_plan(dir.path(), &catalog, &options, &SilentReporter);
        assert_eq!(refresh.len(), 1);
        assert!(refresh.operations[0].is_mtime_only());
        assert!(refresh.operations[0].timestamp.is_some());
    }

    #[test]
    fn test_plan_follows_catalog_order() {
        let dir = tempdir().unwrap();
        make_dirs(dir.path(), &["RJ1", "RJ2", "RJ3"]);
        let catalog: Catalog = vec![
            entry("RJ3", "Three", None),
            entry("RJ1", "One", None),
            entry("RJ2", "Two", None),
        ]
        .into_iter()
        .collect();

        let plan = generate_rename_plan(dir.path(), &catalog, &PlanOptions::default(), &SilentReporter);
        assert_eq!(destination_names(&plan), vec!["Three", "One", "Two"]);
    }

    #[test]
    fn test_refresh_plan_renames_prefixed_folders() {
        let dir = tempdir().unwrap();
        make_dirs(
            dir.path(),
            &[
                "RJ100_Old title",
                "rj200_Other.part2",
                "RJ300",
                "RJ400_Current",
                "RJ500-bad",
                "RJ600_Unknown",
                "Unrelated",
            ],
        );
        let catalog: Catalog = vec![
            entry("RJ100", "New: title", Some("2021/03/04 05:06")),
            entry("RJ200", "Other new", None),
            entry("RJ300", "Bare", None),
            entry("RJ400", "Current", None),
        ]
        .into_iter()
        .collect();

        let reporter = RecordingReporter::new();
        let plan = generate_refresh_plan(dir.path(), &catalog, 200, &reporter);
        assert_eq!(
            destination_names(&plan),
            vec![
                "RJ100_New：title",
                "RJ300_Bare",
                "RJ400_Current",
                "RJ200_Other new.part2",
            ]
        );
        assert!(plan.operations[0].timestamp.is_some());
        assert!(plan.operations[2].is_mtime_only());
        assert_eq!(plan.invalid_names, vec!["RJ500-bad"]);
        assert_eq!(plan.not_found, vec!["RJ600"]);
        assert!(reporter.contains(Level::WARN, "Could not extract identifier from: RJ500-bad"));
    }
}
