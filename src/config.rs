// Configuration management for the router shell
// Supports CLI arguments, config file (TOML), and environment variables

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::error::{AppError, AppResult};

/// Interactive shell over a flat-file routing information base
#[derive(Parser, Debug, Clone)]
#[command(name = "router")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Routing table file (one `destination netmask gateway iface metric` per line)
    pub table_file: PathBuf,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(short, long, env = "RIB_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "RIB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Prompt printed before each command
    #[arg(long, env = "RIB_PROMPT")]
    pub prompt: Option<String>,

    /// Output format for DUMP
    #[arg(long, value_enum, env = "RIB_FORMAT")]
    pub format: Option<DumpFormat>,

    /// Don't commit the table when QUIT is issued
    #[arg(long, env = "RIB_NO_COMMIT_ON_QUIT")]
    pub no_commit_on_quit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    #[default]
    Table,
    Json,
}

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Shell settings
    #[serde(default)]
    pub shell: ShellConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Write the table back on QUIT
    #[serde(default = "default_true")]
    pub commit_on_quit: bool,

    #[serde(default)]
    pub dump_format: DumpFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_prompt() -> String {
    "> ".to_string()
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ShellConfig {
    fn default() -> Self {
        ShellConfig {
            prompt: default_prompt(),
            commit_on_quit: default_true(),
            dump_format: DumpFormat::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

/// Merged configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub table_file: PathBuf,
    pub log_level: Level,
    pub prompt: String,
    pub commit_on_quit: bool,
    pub dump_format: DumpFormat,
}

impl Config {
    /// Load configuration from all sources (CLI args, config file, defaults)
    /// Priority: CLI args > Config file > Defaults
    pub fn load() -> AppResult<Self> {
        let cli_args = CliArgs::parse();
        let config_file = load_config_file(&cli_args)?;
        Self::merge(cli_args, config_file)
    }

    pub fn merge(cli_args: CliArgs, config_file: ConfigFile) -> AppResult<Self> {
        let level = cli_args
            .log_level
            .unwrap_or(config_file.logging.level);
        let log_level = parse_log_level(&level)?;

        Ok(Config {
            table_file: cli_args.table_file,
            log_level,
            prompt: cli_args.prompt.unwrap_or(config_file.shell.prompt),
            commit_on_quit: !cli_args.no_commit_on_quit && config_file.shell.commit_on_quit,
            dump_format: cli_args.format.unwrap_or(config_file.shell.dump_format),
        })
    }
}

fn load_config_file(cli_args: &CliArgs) -> AppResult<ConfigFile> {
    if let Some(config_path) = &cli_args.config {
        return read_config_file(config_path);
    }

    // Try loading from default locations
    let default_paths = [PathBuf::from("router.toml"), PathBuf::from("librib.toml")];
    for path in default_paths {
        if path.exists() {
            return read_config_file(&path);
        }
    }

    Ok(ConfigFile::default())
}

fn read_config_file(path: &Path) -> AppResult<ConfigFile> {
    tracing::info!("Loading configuration from: {}", path.display());
    let config_content = std::fs::read_to_string(path)?;
    toml::from_str::<ConfigFile>(&config_content)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
}

fn parse_log_level(level_str: &str) -> AppResult<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(AppError::Config(format!("Invalid log level: {}", level_str))),
    }
}
