use std::env;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Log to stdout and to `<log_dir>/<prefix>_<timestamp>.log`. Keep the returned
/// guard alive until exit so the file writer flushes.
pub fn init_logger(log_dir: &Path, prefix: &str) -> io::Result<impl Drop> {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    fs::create_dir_all(log_dir)?;
    let log_file_name = log_file_name(prefix, chrono::Local::now());
    let file_appender = tracing_appender::rolling::never(log_dir, &log_file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stdout)
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(false)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    info!("Log file: {}", log_dir.join(&log_file_name).display());

    Ok(guard)
}

pub fn log_file_name(prefix: &str, now: chrono::DateTime<chrono::Local>) -> String {
    format!("{}_{}.log", prefix, now.format("%Y%m%d_%H%M%S"))
}
