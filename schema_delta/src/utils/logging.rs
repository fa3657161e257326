//! Logging utilities for schema_delta
//!
//! This module provides logging setup and configuration.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Parse a configured level name, defaulting to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging based on configuration.
///
/// Without a `[logging]` section, text logs go to stderr at INFO (DEBUG when
/// `verbose` is set).
pub fn init_logging(config: &Option<LoggingConfig>, verbose: bool) -> Result<()> {
    let default_config = LoggingConfig {
        level: "info".to_string(),
        file: None,
        format: "text".to_string(),
        stdout: true,
    };
    let config = config.as_ref().unwrap_or(&default_config);

    let level = if verbose {
        Level::DEBUG
    } else {
        parse_level(&config.level)
    };

    let directive = format!("schema_delta={}", level)
        .parse()
        .map_err(|e| Error::ConfigError(format!("Invalid log directive: {}", e)))?;
    let env_filter = EnvFilter::from_default_env().add_directive(directive);
    let json = config.format.to_lowercase() == "json";

    if let Some(file_path) = &config.file {
        if let Some(parent) = Path::new(file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        let builder = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file));

        let installed = if json {
            tracing::subscriber::set_global_default(builder.json().finish())
        } else {
            tracing::subscriber::set_global_default(builder.finish())
        };
        installed.map_err(|e| Error::ConfigError(e.to_string()))?;
    } else if config.stdout {
        let builder = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr);

        let installed = if json {
            tracing::subscriber::set_global_default(builder.json().finish())
        } else {
            tracing::subscriber::set_global_default(builder.finish())
        };
        installed.map_err(|e| Error::ConfigError(e.to_string()))?;
    }

    Ok(())
}
