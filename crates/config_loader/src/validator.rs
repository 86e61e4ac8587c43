//! Configuration validation
//!
//! Rules:
//! - output_directory is not empty
//! - remote URLs use http or https
//! - token map keys are non-blank wizard ids
//! - poll attempts and queue capacity are at least 1

use contracts::{ContractError, PluginConfig};

/// Validate a PluginConfig
///
/// Returns the first error found.
pub fn validate(config: &PluginConfig) -> Result<(), ContractError> {
    validate_output_directory(config)?;
    validate_urls(config)?;
    validate_tokens(config)?;
    validate_job_poll(config)?;
    validate_dispatcher(config)?;
    Ok(())
}

fn validate_output_directory(config: &PluginConfig) -> Result<(), ContractError> {
    if config.output_directory.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "output_directory",
            "output directory cannot be empty",
        ));
    }
    Ok(())
}

fn validate_urls(config: &PluginConfig) -> Result<(), ContractError> {
    if config.swarfarm.enabled {
        check_url("swarfarm.api_url", &config.swarfarm.api_url)?;
    }
    if config.swag.enabled {
        check_url("swag.upload_url", &config.swag.upload_url)?;
    }
    Ok(())
}

fn check_url(field: &str, url: &str) -> Result<(), ContractError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!("expected an http(s) URL, got '{url}'"),
        ))
    }
}

fn validate_tokens(config: &PluginConfig) -> Result<(), ContractError> {
    for wizard_id in config.swarfarm.api_tokens.keys() {
        if wizard_id.trim().is_empty() {
            return Err(ContractError::config_validation(
                "swarfarm.api_tokens",
                "wizard id cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_job_poll(config: &PluginConfig) -> Result<(), ContractError> {
    if config.job_poll.max_attempts == 0 {
        return Err(ContractError::config_validation(
            "job_poll.max_attempts",
            "max_attempts must be >= 1",
        ));
    }
    Ok(())
}

fn validate_dispatcher(config: &PluginConfig) -> Result<(), ContractError> {
    if config.dispatcher.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.queue_capacity",
            "queue_capacity must be >= 1",
        ));
    }
    Ok(())
}
