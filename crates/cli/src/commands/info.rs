//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::PluginConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::pipeline::{describe_handlers, HandlerInfo};

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    output_directory: String,
    swarfarm: SwarfarmInfo,
    job_poll: JobPollInfo,
    queue_capacity: usize,
    handlers: Vec<HandlerInfo>,
}

#[derive(Serialize)]
struct SwarfarmInfo {
    api_url: String,
    datalog_enabled: bool,
    livesync_enabled: bool,
    /// Wizard ids only; tokens are never printed
    token_wizard_ids: Vec<String>,
}

#[derive(Serialize)]
struct JobPollInfo {
    max_attempts: u32,
    interval_secs: u64,
}

/// Execute the `info` command
pub async fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let handlers = describe_handlers(&config, !args.offline)
        .await
        .context("Failed to describe handlers")?;
    let info = build_config_info(&config, handlers);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &PluginConfig, handlers: Vec<HandlerInfo>) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        output_directory: config.output_directory().display().to_string(),
        swarfarm: SwarfarmInfo {
            api_url: config.swarfarm.api_url.clone(),
            datalog_enabled: config.swarfarm.datalog_enabled,
            livesync_enabled: config.swarfarm.livesync_enabled,
            token_wizard_ids: config.swarfarm.api_tokens.keys().cloned().collect(),
        },
        job_poll: JobPollInfo {
            max_attempts: config.job_poll.max_attempts,
            interval_secs: config.job_poll.interval_secs,
        },
        queue_capacity: config.dispatcher.queue_capacity,
        handlers,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               swarpf-plugins Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📁 General");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Output directory: {}", info.output_directory);
    println!("   ├─ Queue capacity: {}", info.queue_capacity);
    println!(
        "   └─ Job poll: {} attempts every {}s",
        info.job_poll.max_attempts, info.job_poll.interval_secs
    );

    println!("\n🌐 SWARFARM");
    println!("   ├─ API: {}", info.swarfarm.api_url);
    println!("   ├─ Data logs: {}", info.swarfarm.datalog_enabled);
    println!("   ├─ Live sync: {}", info.swarfarm.livesync_enabled);
    if info.swarfarm.token_wizard_ids.is_empty() {
        println!("   └─ Tokens: none");
    } else {
        println!("   └─ Tokens for: {}", info.swarfarm.token_wizard_ids.join(", "));
    }

    println!("\n🔌 Handlers ({})", info.handlers.len());
    for (i, handler) in info.handlers.iter().enumerate() {
        let is_last = i == info.handlers.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({} commands)", prefix, handler.name, handler.commands.len());
        for (j, command) in handler.commands.iter().enumerate() {
            let command_prefix = if j == handler.commands.len() - 1 { "└─" } else { "├─" };
            println!("   {}  {} {}", child_prefix, command_prefix, command);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_never_contains_tokens() {
        let mut config = PluginConfig::default();
        config.swarfarm.api_tokens.insert("77".to_string(), "hunter2".to_string());

        let info = build_config_info(&config, Vec::new());
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"77\""));
        assert!(!json.contains("hunter2"));
    }
}
