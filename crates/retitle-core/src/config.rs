use crate::error::Error;
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_MAX_FILENAME_LENGTH: usize = 200;
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_CATALOG_PATH: &str = "purchases.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub max_filename_length: usize,
    pub log_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub output_format: OutputFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_filename_length: DEFAULT_MAX_FILENAME_LENGTH,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            output_format: OutputFormat::Table,
        }
    }
}

/// Load `Retitle.toml` (optional) with `RETITLE_*` environment overrides on top
/// of the built-in defaults.
pub fn load_configuration() -> Result<AppConfig, Error> {
    load_configuration_from("Retitle")
}

pub fn load_configuration_from(file_stem: &str) -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .set_default("max_filename_length", DEFAULT_MAX_FILENAME_LENGTH as u64)?
        .set_default("log_dir", DEFAULT_LOG_DIR)?
        .set_default("catalog_path", DEFAULT_CATALOG_PATH)?
        .set_default("output_format", "table")?
        .add_source(ConfigFile::with_name(file_stem).required(false))
        .add_source(Environment::with_prefix("RETITLE"))
        .build()?;
    Ok(builder.try_deserialize::<AppConfig>()?)
}
