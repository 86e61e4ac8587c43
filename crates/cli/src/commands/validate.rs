//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::PluginConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    output_directory: String,
    enabled_plugins: Vec<&'static str>,
    api_token_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    output_directory: config.output_directory().display().to_string(),
                    enabled_plugins: enabled_plugins(&config),
                    api_token_count: config.swarfarm.api_tokens.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn enabled_plugins(config: &PluginConfig) -> Vec<&'static str> {
    [
        ("profile_export", config.profile_export.enabled),
        ("siege_export", config.siege_export.enabled),
        ("swarfarm", config.swarfarm.enabled),
        ("swag", config.swag.enabled),
        ("debug_output", config.debug_output.enabled),
    ]
    .into_iter()
    .filter_map(|(name, enabled)| enabled.then_some(name))
    .collect()
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &PluginConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if enabled_plugins(config).is_empty() {
        warnings.push("No plugins enabled - events will only be counted".to_string());
    }

    let swarfarm = &config.swarfarm;
    if swarfarm.enabled && swarfarm.livesync_enabled && swarfarm.api_tokens.is_empty() {
        warnings.push(
            "swarfarm.livesync_enabled is set but no api_tokens are configured - live sync will be skipped"
                .to_string(),
        );
    }
    if swarfarm.enabled && !swarfarm.datalog_enabled && !swarfarm.livesync_enabled {
        warnings.push(
            "swarfarm is enabled with data logs and live sync off - only profile uploads run"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Output directory: {}", summary.output_directory);
            println!("  Plugins: {}", summary.enabled_plugins.join(", "));
            println!("  API tokens: {}", summary.api_token_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
