//! ProfileExporter - normalized profile snapshot per wizard

use contracts::{ApiEvent, CommandSet, ContractError, EventHandler, EventOutcome};
use observability::record_export_written;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

use crate::normalizer::normalize;
use crate::views::WizardInfo;

/// Login commands that carry the full profile
pub const PROFILE_COMMANDS: &[&str] = &["HubUserLogin", "GuestLogin"];

pub struct ProfileExporter {
    name: String,
    output_dir: PathBuf,
    commands: CommandSet,
}

impl ProfileExporter {
    /// Create the exporter, creating `output_dir` if needed
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, ContractError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        if !output_dir.is_dir() {
            return Err(ContractError::Other(format!(
                "output path {} exists but is not a directory",
                output_dir.display()
            )));
        }

        Ok(Self {
            name: "profile_export".to_string(),
            output_dir,
            commands: PROFILE_COMMANDS.iter().copied().collect(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_profile(&self, info: &WizardInfo, bytes: &[u8]) -> Result<PathBuf, ContractError> {
        let file_path = self.output_dir.join(info.file_name());
        fs::write(&file_path, bytes).map_err(|e| {
            error!(
                wizard_id = info.wizard_id,
                file_path = %file_path.display(),
                error = %e,
                "Could not write profile JSON to file"
            );
            ContractError::Io(e)
        })?;
        Ok(file_path)
    }
}

impl EventHandler for ProfileExporter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn subscriptions(&self) -> CommandSet {
        self.commands.clone()
    }

    #[instrument(
        name = "profile_export_on_event",
        skip(self, event),
        fields(command = %event.command)
    )]
    async fn on_event(&mut self, event: &ApiEvent) -> Result<EventOutcome, ContractError> {
        if !self.commands.matches(&event.command) {
            return Ok(EventOutcome::Ignored);
        }

        let response = event.decode_response()?;
        let info = WizardInfo::from_response(&response)?;
        info!(
            wizard_id = info.wizard_id,
            wizard_name = %info.wizard_name,
            "Received command used in profile export"
        );

        let normalized = normalize(response).map_err(|e| {
            error!(
                wizard_id = info.wizard_id,
                error = %e,
                "Some data in the API response is missing"
            );
            e
        })?;
        let bytes = serde_json::to_vec(&normalized)
            .map_err(|e| ContractError::serialization(format!("sorted profile: {e}")))?;

        let file_path = self.write_profile(&info, &bytes)?;
        record_export_written("profile");
        info!(
            wizard_id = info.wizard_id,
            file_path = %file_path.display(),
            "Profile successfully exported"
        );
        Ok(EventOutcome::Handled)
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
