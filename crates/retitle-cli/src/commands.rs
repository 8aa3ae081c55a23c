use clap::{Args, Parser, Subcommand, ValueEnum};
use retitle_core::OutputFormat;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "retitle")]
#[command(about = "Rename catalog folders to their titles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rename ID[.partN] folders to the titles listed in the CSV
    Rename {
        #[command(flatten)]
        common: CommonArgs,

        /// Set folder modification time to the purchase date (00:00:00) and
        /// also find folders a previous run already renamed
        #[arg(long)]
        update_mtime: bool,

        /// Drop .partN when only one folder exists for an identifier
        #[arg(long)]
        remove_suffix: bool,
    },
    /// Re-title already renamed ID_title folders and stamp purchase dates
    Update {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Directory containing the folders to rename
    pub directory: PathBuf,

    /// CSV file with identifiers, titles and purchase dates
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Preview changes without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,

    /// Directory for log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Output format for the preview
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Maximum folder name length
    #[arg(long)]
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Table,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}
