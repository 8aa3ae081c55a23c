mod commands;
mod logging;
mod progress;
mod render;

use std::io::{self, Write};
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, CommonArgs};
use dotenv::dotenv;
use progress::CliReporter;
use retitle_core::{
    AppConfig, ExecutionSummary, OutputFormat, PlanMode, PlanOptions, RenameEngine,
    SilentReporter,
};
use tracing::{error, info, warn};

struct RunSettings {
    common: CommonArgs,
    mode: PlanMode,
    log_prefix: &'static str,
    banner: &'static str,
    noun: &'static str,
}

fn main() {
    dotenv().ok();

    let args = Cli::parse();

    let config = match retitle_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let settings = match args.command {
        Some(Commands::Rename {
            common,
            update_mtime,
            remove_suffix,
        }) => {
            let max_length = common.max_length.unwrap_or(config.max_filename_length);
            RunSettings {
                common,
                mode: PlanMode::Rename(PlanOptions {
                    max_length,
                    remove_suffix,
                    update_mtime,
                }),
                log_prefix: "rename",
                banner: "Folder Renaming Tool",
                noun: "RENAMING",
            }
        }
        Some(Commands::Update { common }) => {
            let max_length = common.max_length.unwrap_or(config.max_filename_length);
            RunSettings {
                common,
                mode: PlanMode::Refresh { max_length },
                log_prefix: "update",
                banner: "Renamed Folder Update",
                noun: "UPDATE",
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            return;
        }
        None => {
            let _ = Cli::command().print_long_help();
            return;
        }
    };

    let log_dir = settings
        .common
        .log_dir
        .clone()
        .unwrap_or_else(|| config.log_dir.clone());
    let guard = match logging::init_logger(&log_dir, settings.log_prefix) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error creating log directory {}: {}", log_dir.display(), err);
            process::exit(1);
        }
    };

    let code = match run(&config, &settings) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            1
        }
    };
    // process::exit skips destructors; flush the log file first.
    drop(guard);
    process::exit(code);
}

fn run(config: &AppConfig, settings: &RunSettings) -> Result<i32, Box<dyn std::error::Error>> {
    let common = &settings.common;
    let reporter = CliReporter::new();
    let rule = "=".repeat(80);

    info!("{}", rule);
    info!("{}", settings.banner);
    info!("{}", rule);

    let catalog_path = common
        .csv
        .clone()
        .unwrap_or_else(|| config.catalog_path.clone());
    let format = common
        .format
        .map(OutputFormat::from)
        .unwrap_or(config.output_format);

    let engine = RenameEngine::load(&common.directory, &catalog_path, settings.mode, &reporter)?;

    match settings.mode {
        PlanMode::Rename(options) => {
            if options.remove_suffix {
                info!("Suffix removal enabled: .partN will be removed when safe (only one folder per identifier)");
            }
            if options.update_mtime {
                info!("Mtime update mode: Will also search for already-renamed folders to update their dates");
            }
        }
        PlanMode::Refresh { .. } => {
            info!("Update mode: Rename to latest CSV titles + Update mtime to purchase dates");
        }
    }

    let result = engine.plan(&reporter);
    info!(
        "Planned in {}",
        format!("{:.2}s", result.plan_duration.as_secs_f64()).green()
    );

    if result.plan.is_empty() {
        warn!("No operations to perform");
        info!("This could mean:");
        info!("  - No folders matching identifiers from CSV were found");
        info!("  - All folders are already renamed");
        return Ok(0);
    }

    let has_duplicates = !result.duplicates.is_empty();
    if has_duplicates {
        for line in render::duplicate_lines(&result.duplicates) {
            error!("{}", line);
        }
        if !common.dry_run {
            return Ok(1);
        }
    }

    let preview_title = format!("{} PREVIEW", settings.noun);
    match format {
        OutputFormat::Table => {
            print!("{}", render::preview_table(&preview_title, &result.plan.operations))
        }
        OutputFormat::Json => println!("{}", render::preview_json(&result.plan.operations)?),
    }

    if common.dry_run {
        info!("DRY RUN MODE - No changes will be made");
        let checks = engine.execute(&result, true, &SilentReporter)?;
        let summary = ExecutionSummary::from_results(&checks);
        if summary.failed > 0 {
            warn!(
                "{} operation(s) would fail",
                format!("{}", summary.failed).red()
            );
            for check in checks.iter().filter(|c| !c.success) {
                warn!("  {}", check.error.as_deref().unwrap_or("unknown"));
            }
        }
        info!("Write access is checked from read-only flags only; the real run can still be refused");
        return Ok(if has_duplicates { 1 } else { 0 });
    }

    if !common.yes {
        if format == OutputFormat::Json {
            print!("{}", render::preview_table(&preview_title, &result.plan.operations));
        }
        let prompt = format!("Proceed with {}?", settings.noun.to_lowercase());
        if !prompt_confirm(&prompt)? {
            info!("Operation cancelled by user");
            return Ok(0);
        }
    }

    info!("Executing operations...");
    if matches!(settings.mode, PlanMode::Refresh { .. })
        || matches!(settings.mode, PlanMode::Rename(o) if o.update_mtime)
    {
        info!("Modification times will be updated to purchase dates (00:00:00)");
    }
    let results = engine.execute(&result, false, &reporter)?;

    for line in render::summary_lines(&format!("{} SUMMARY", settings.noun), &results) {
        info!("{}", line);
    }

    let summary = ExecutionSummary::from_results(&results);
    if summary.failed > 0 {
        warn!(
            "Completed with {} failures",
            format!("{}", summary.failed).red()
        );
        Ok(1)
    } else {
        info!("{}", "All operations completed successfully".green());
        Ok(0)
    }
}

/// Only "yes" or "y" (any case) proceeds; anything else cancels.
fn prompt_confirm(prompt: &str) -> io::Result<bool> {
    let mut input = String::new();

    print!("\n{} (yes/no): ", prompt);
    io::stdout().flush()?;

    io::stdin().read_line(&mut input)?;

    Ok(is_confirmation(&input))
}

fn is_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "yes" | "y")
}
