//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::error::CliError;

/// swarpf-plugins - exporters and uploaders for captured Summoners War traffic
#[derive(Parser, Debug)]
#[command(
    name = "swarpf-plugins",
    author,
    version,
    about = "Plugin host for captured Summoners War API events",
    long_about = "Reads captured game API events (one JSON object per line) and routes \n\
                  them to the enabled plugins: profile and siege exporters, the \n\
                  SWARFARM uploader and the SWAG guild war forwarder."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SWARPF_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SWARPF_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route events to the enabled plugins
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display enabled plugins and the commands they handle
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "plugins.toml", env = "SWARPF_CONFIG")]
    pub config: PathBuf,

    /// Newline-delimited JSON events (stdin when omitted)
    #[arg(short, long, env = "SWARPF_EVENTS")]
    pub events: Option<PathBuf>,

    /// Override the export directory from configuration
    #[arg(short, long, env = "SWARPF_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Add a SWARFARM API token, as `<wizard_id>=<token>` (repeatable)
    #[arg(long = "api-token", value_parser = parse_api_token, value_name = "WIZARD_ID=TOKEN")]
    pub api_tokens: Vec<(String, String)>,

    /// Stop after this many events (0 = unlimited)
    #[arg(long, default_value = "0", env = "SWARPF_MAX_EVENTS")]
    pub max_events: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size between the reader and the dispatcher
    #[arg(long, default_value = "100", env = "SWARPF_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SWARPF_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "plugins.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "plugins.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip fetching the SWARFARM accepted-command lists
    #[arg(long)]
    pub offline: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Parse `<wizard_id>=<token>`
pub fn parse_api_token(value: &str) -> Result<(String, String), CliError> {
    let (wizard_id, token) = value
        .split_once('=')
        .ok_or_else(|| CliError::invalid_token_arg(value, "expected <wizard_id>=<token>"))?;
    let wizard_id = wizard_id.trim();
    let token = token.trim();

    if wizard_id.is_empty() {
        return Err(CliError::invalid_token_arg(value, "wizard id is empty"));
    }
    if wizard_id.parse::<i64>().is_err() {
        return Err(CliError::invalid_token_arg(value, "wizard id must be numeric"));
    }
    if token.is_empty() {
        return Err(CliError::invalid_token_arg(value, "token is empty"));
    }
    Ok((wizard_id.to_string(), token.to_string()))
}
