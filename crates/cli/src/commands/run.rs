//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::PluginConfig;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;

    info!(
        output_dir = %config.output_directory().display(),
        swarfarm = config.swarfarm.enabled,
        swag = config.swag.enabled,
        profile_export = config.profile_export.enabled,
        siege_export = config.siege_export.enabled,
        api_tokens = config.swarfarm.api_tokens.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        plugin: config,
        events: args.events.clone(),
        max_events: (args.max_events > 0).then_some(args.max_events),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting pipeline...");
    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        events = stats.events_dispatched,
        invalid_lines = stats.invalid_lines,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed successfully"
    );
    stats.print_summary();

    info!("swarpf-plugins finished");
    Ok(())
}

/// Load the config file and apply CLI overrides
fn load_config(args: &RunArgs) -> Result<PluginConfig> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(ref output_dir) = args.output_dir {
        info!(output_dir = %output_dir.display(), "Overriding output directory from CLI");
        config.output_directory = output_dir.clone();
    }
    for (wizard_id, token) in &args.api_tokens {
        info!(wizard_id = %wizard_id, "Adding SWARFARM API token from CLI");
        config
            .swarfarm
            .api_tokens
            .insert(wizard_id.clone(), token.clone());
    }

    config_loader::ConfigLoader::validate(&config)
        .context("Configuration invalid after CLI overrides")?;
    Ok(config)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &PluginConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Output directory: {}", config.output_directory().display());
    println!("\nPlugins:");
    println!("  - profile_export: {}", on_off(config.profile_export.enabled));
    println!("  - siege_export: {}", on_off(config.siege_export.enabled));
    println!(
        "  - swarfarm: {} ({}, data logs {}, live sync {}, {} tokens)",
        on_off(config.swarfarm.enabled),
        config.swarfarm.api_url,
        on_off(config.swarfarm.datalog_enabled),
        on_off(config.swarfarm.livesync_enabled),
        config.swarfarm.api_tokens.len()
    );
    println!(
        "  - swag: {} ({})",
        on_off(config.swag.enabled),
        config.swag.upload_url
    );
    println!("  - debug_output: {}", on_off(config.debug_output.enabled));
    println!(
        "\nJob poll: {} attempts every {}s",
        config.job_poll.max_attempts, config.job_poll.interval_secs
    );
    println!("Queue capacity: {}", config.dispatcher.queue_capacity);
    println!();
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}
