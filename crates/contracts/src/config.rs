//! PluginConfig - Config Loader output
//!
//! Output location, remote endpoints, credentials and the set of enabled
//! handlers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub version: ConfigVersion,

    /// Directory that receives exported JSON files
    pub output_directory: PathBuf,

    pub swarfarm: SwarfarmConfig,

    pub swag: SwagConfig,

    pub profile_export: ToggleConfig,

    pub siege_export: ToggleConfig,

    pub debug_output: ToggleConfig,

    pub job_poll: JobPollConfig,

    pub dispatcher: DispatcherSettings,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            output_directory: PathBuf::from("./export"),
            swarfarm: SwarfarmConfig::default(),
            swag: SwagConfig::default(),
            profile_export: ToggleConfig::default(),
            siege_export: ToggleConfig::default(),
            debug_output: ToggleConfig::disabled(),
            job_poll: JobPollConfig::default(),
            dispatcher: DispatcherSettings::default(),
        }
    }
}

impl PluginConfig {
    /// Effective output directory (empty means current directory)
    pub fn output_directory(&self) -> PathBuf {
        if self.output_directory.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            self.output_directory.clone()
        }
    }
}

/// SWARFARM uploader settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarfarmConfig {
    pub enabled: bool,

    /// API root, e.g. `https://swarfarm.com/api/v2`
    pub api_url: String,

    /// Upload selected commands to the data log
    pub datalog_enabled: bool,

    /// Mirror selected commands to the live sync endpoint
    pub livesync_enabled: bool,

    pub request_timeout_secs: u64,

    /// wizard id -> API token
    pub api_tokens: BTreeMap<String, String>,
}

impl Default for SwarfarmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_swarfarm_api_url(),
            datalog_enabled: true,
            livesync_enabled: false,
            request_timeout_secs: 30,
            api_tokens: BTreeMap::new(),
        }
    }
}

fn default_swarfarm_api_url() -> String {
    "https://swarfarm.com/api/v2".to_string()
}

/// SWAG guild war forwarder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwagConfig {
    pub enabled: bool,
    pub upload_url: String,
}

impl Default for SwagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            upload_url: "https://gw.swop.one/data/upload/".to_string(),
        }
    }
}

/// Handler on/off switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl ToggleConfig {
    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Profile import job polling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobPollConfig {
    pub max_attempts: u32,
    pub interval_secs: u64,
}

impl Default for JobPollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval_secs: 10,
        }
    }
}

/// Dispatcher queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Per-handler queue capacity
    pub queue_capacity: usize,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
        }
    }
}
