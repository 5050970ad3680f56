use crate::config::AppConfig;
use crate::error::AssistError;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// HTTP stack crates are noisy at debug level
const QUIET_DIRECTIVES: &[&str] = &["hyper=warn", "reqwest=warn", "h2=warn"];

/// Build the filter used by every layer
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives = vec![parse_log_level(log_level).to_string().to_lowercase()];
        directives.extend(QUIET_DIRECTIVES.iter().map(|d| d.to_string()));
        EnvFilter::new(directives.join(","))
    })
}

/// Initialize logging from the application configuration
pub fn init(config: &AppConfig) -> Result<(), AssistError> {
    setup_logging(&config.log_dir, &config.log_level)
}

/// Initialize logging system
///
/// Console output plus an append-only `llmassist.log` in `log_dir`.
/// Generation spans are logged when they close so each attempt gets one
/// line with its duration.
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<(), AssistError> {
    let (log_file, log_file_path) = open_log_file(log_dir)?;

    // Console stays compact; stdout is shared with generated text
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(build_filter(log_level));

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(build_filter(log_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AssistError::config(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!(
        "Logging initialized: level={}, log_file={}",
        log_level,
        log_file_path.display()
    );

    Ok(())
}

/// Create `log_dir` if needed and open `llmassist.log` for appending
fn open_log_file(log_dir: &Path) -> Result<(File, PathBuf), AssistError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        AssistError::config(format!("Cannot create log directory {}: {}", log_dir.display(), e))
    })?;

    let path = log_dir.join("llmassist.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| AssistError::config(format!("Cannot open log file {}: {}", path.display(), e)))?;
    Ok((file, path))
}

/// Console only logging
///
/// For development and testing environments
pub fn setup_console_logging(log_level: &str) -> Result<(), AssistError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(build_filter(log_level))
        .try_init()
        .map_err(|e| AssistError::config(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!("Console logging initialized: level={}", log_level);

    Ok(())
}

/// Parse string to tracing Level
pub fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", level);
            Level::INFO
        }
    }
}
