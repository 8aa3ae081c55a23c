use crate::error::Error;
use crate::reporter::Reporter;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::Level;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One usable catalog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub identifier: String,
    pub title: String,
    pub purchase_date: Option<String>,
}

/// Identifier → entry mapping that remembers first-insertion order.
///
/// Re-inserting an identifier replaces the entry in place (last row wins, first
/// position kept).
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        let key = canonical_identifier(&entry.identifier);
        let entry = CatalogEntry {
            identifier: key.clone(),
            ..entry
        };
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&CatalogEntry> {
        self.index
            .get(&canonical_identifier(identifier))
            .map(|&pos| &self.entries[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<T: IntoIterator<Item = CatalogEntry>>(iter: T) -> Self {
        let mut catalog = Catalog::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

pub fn canonical_identifier(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Column positions resolved from the header row. `rj_number` wins over
/// `identifier` when both are present; every other column is ignored.
struct Columns {
    identifier: Option<usize>,
    title: Option<usize>,
    purchase_date: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let position = |name: &str| headers.iter().position(|h| h == name);
        Self {
            identifier: position("rj_number").or_else(|| position("identifier")),
            title: position("title"),
            purchase_date: position("purchase_date"),
        }
    }

    fn field<'r>(record: &'r csv::StringRecord, column: Option<usize>) -> &'r str {
        column.and_then(|i| record.get(i)).unwrap_or_default()
    }
}

pub fn load_catalog(path: &Path, reporter: &dyn Reporter) -> Result<Catalog, Error> {
    if !path.is_file() {
        return Err(Error::CatalogNotFound(path.to_path_buf()));
    }
    let file = fs::File::open(path)?;
    read_catalog(file, reporter)
}

/// Parse CSV text with a header row. Rows lacking an identifier or a title are
/// skipped with a warning naming their 1-based row number (header is row 1).
pub fn read_catalog<R: Read>(mut input: R, reporter: &dyn Reporter) -> Result<Catalog, Error> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&text);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns = Columns::from_headers(reader.headers()?);

    let mut catalog = Catalog::new();
    for (offset, record) in reader.records().enumerate() {
        let row_num = offset + 2;
        let record = record?;
        let identifier = Columns::field(&record, columns.identifier);
        let title = Columns::field(&record, columns.title);
        let purchase_date = Columns::field(&record, columns.purchase_date);

        if identifier.is_empty() {
            reporter.record(
                Level::WARN,
                &format!("Row {}: Missing rj_number, skipping", row_num),
            );
            continue;
        }
        if title.is_empty() {
            reporter.record(
                Level::WARN,
                &format!("Row {}: Missing title for {}, skipping", row_num, identifier),
            );
            continue;
        }

        catalog.insert(CatalogEntry {
            identifier: identifier.to_string(),
            title: title.to_string(),
            purchase_date: Some(purchase_date.to_string()).filter(|d| !d.is_empty()),
        });
    }

    Ok(catalog)
}
