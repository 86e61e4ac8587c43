//! Plugin handler registry built from `PluginConfig`.

use std::sync::Arc;
use std::time::Duration;

use contracts::{ApiEvent, CommandSet, ContractError, EventHandler, EventOutcome, PluginConfig};
use dispatcher::DebugOutput;
use profile_export::{ProfileExporter, PROFILE_COMMANDS};
use serde::Serialize;
use siege_export::{SiegeExporter, SIEGE_COMMANDS};
use swarfarm::{
    SwagForwarder, SwarfarmUploader, TokenStore, PROFILE_UPLOAD_COMMANDS, SWAG_COMMANDS,
};
use tracing::info;

/// Every handler the host can run
pub enum PluginHandler {
    Swarfarm(SwarfarmUploader),
    Swag(SwagForwarder),
    Profile(ProfileExporter),
    Siege(SiegeExporter),
    Debug(DebugOutput),
}

impl EventHandler for PluginHandler {
    fn name(&self) -> &str {
        match self {
            Self::Swarfarm(h) => h.name(),
            Self::Swag(h) => h.name(),
            Self::Profile(h) => h.name(),
            Self::Siege(h) => h.name(),
            Self::Debug(h) => h.name(),
        }
    }

    async fn subscriptions(&self) -> CommandSet {
        match self {
            Self::Swarfarm(h) => h.subscriptions().await,
            Self::Swag(h) => h.subscriptions().await,
            Self::Profile(h) => h.subscriptions().await,
            Self::Siege(h) => h.subscriptions().await,
            Self::Debug(h) => h.subscriptions().await,
        }
    }

    async fn on_event(&mut self, event: &ApiEvent) -> Result<EventOutcome, ContractError> {
        match self {
            Self::Swarfarm(h) => h.on_event(event).await,
            Self::Swag(h) => h.on_event(event).await,
            Self::Profile(h) => h.on_event(event).await,
            Self::Siege(h) => h.on_event(event).await,
            Self::Debug(h) => h.on_event(event).await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Swarfarm(h) => h.close().await,
            Self::Swag(h) => h.close().await,
            Self::Profile(h) => h.close().await,
            Self::Siege(h) => h.close().await,
            Self::Debug(h) => h.close().await,
        }
    }
}

/// Create the enabled handlers, in dispatch order
pub fn build_handlers(config: &PluginConfig) -> Result<Vec<PluginHandler>, ContractError> {
    let mut handlers = Vec::new();
    let output_dir = config.output_directory();

    if config.profile_export.enabled {
        handlers.push(PluginHandler::Profile(ProfileExporter::new(&output_dir)?));
    }
    if config.siege_export.enabled {
        handlers.push(PluginHandler::Siege(SiegeExporter::new(&output_dir)?));
    }
    if config.swarfarm.enabled {
        let tokens = Arc::new(TokenStore::from_pairs(&config.swarfarm.api_tokens));
        info!(tokens = tokens.len(), "SWARFARM token store loaded");
        handlers.push(PluginHandler::Swarfarm(SwarfarmUploader::from_config(
            &config.swarfarm,
            &config.job_poll,
            tokens,
        )?));
    }
    if config.swag.enabled {
        handlers.push(PluginHandler::Swag(SwagForwarder::from_config(
            &config.swag,
            Duration::from_secs(config.swarfarm.request_timeout_secs),
        )?));
    }
    if config.debug_output.enabled {
        handlers.push(PluginHandler::Debug(DebugOutput::new()));
    }

    Ok(handlers)
}

/// Enabled handler and the commands it handles
#[derive(Debug, Clone, Serialize)]
pub struct HandlerInfo {
    pub name: String,
    pub commands: Vec<String>,
}

/// Describe the enabled handlers without touching the output directory.
///
/// With `fetch_schemas` the SWARFARM entry lists the commands accepted by
/// the remote server; otherwise only the profile upload commands.
pub async fn describe_handlers(
    config: &PluginConfig,
    fetch_schemas: bool,
) -> Result<Vec<HandlerInfo>, ContractError> {
    let mut infos = Vec::new();
    let fixed = |name: &str, commands: &[&str]| HandlerInfo {
        name: name.to_string(),
        commands: commands.iter().copied().collect::<CommandSet>().to_vec(),
    };

    if config.profile_export.enabled {
        infos.push(fixed("profile_export", PROFILE_COMMANDS));
    }
    if config.siege_export.enabled {
        infos.push(fixed("siege_export", SIEGE_COMMANDS));
    }
    if config.swarfarm.enabled {
        if fetch_schemas {
            let uploader = SwarfarmUploader::from_config(
                &config.swarfarm,
                &config.job_poll,
                Arc::new(TokenStore::new()),
            )?;
            infos.push(HandlerInfo {
                name: uploader.name().to_string(),
                commands: uploader.subscriptions().await.to_vec(),
            });
        } else {
            infos.push(fixed("swarfarm", PROFILE_UPLOAD_COMMANDS));
        }
    }
    if config.swag.enabled {
        infos.push(fixed("swag", SWAG_COMMANDS));
    }
    if config.debug_output.enabled {
        infos.push(fixed("debug_output", &[contracts::WILDCARD]));
    }

    Ok(infos)
}
