//! SiegeAggregator - one export document assembled from several commands
//!
//! Matchup info and battle logs go to `SiegeMatch-<match_id>.json`, the HQ
//! defense list to `SiegeDefenseList.json`. Each contributing event updates
//! its section in memory and then rewrites the whole document. A failed
//! write keeps the in-memory state, so the next event writes it again.

use contracts::{ApiEvent, CommandSet, ContractError, EventHandler, EventOutcome, JsonObject};
use observability::record_export_written;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

use crate::views::{
    battle_log_match_id, BattleLogRequest, DefenseListRequest, MatchupInfo, SiegeRequest,
};

pub const MATCHUP_INFO: &str = "GetGuildSiegeMatchupInfo";
pub const BATTLE_LOG: &str = "GetGuildSiegeBattleLog";
pub const DEFENSE_LIST: &str = "GetGuildSiegeBaseDefenseUnitList";
pub const DEFENSE_LIST_PRESET: &str = "GetGuildSiegeBaseDefenseUnitListPreset";

pub const SIEGE_COMMANDS: &[&str] = &[
    MATCHUP_INFO,
    BATTLE_LOG,
    DEFENSE_LIST,
    DEFENSE_LIST_PRESET,
];

/// File for the HQ defense list
pub const DEFENSE_LIST_FILE: &str = "SiegeDefenseList.json";

/// Aggregated export document.
///
/// Fields are declared in key order so the file matches a sorted-key
/// encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SiegeDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_log: Option<JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defense_list: Option<JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defense_log: Option<JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matchup_info: Option<JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wizard_id: Option<i64>,
}

/// Where a flush goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiegeTarget {
    Match(i64),
    DefenseList,
}

impl SiegeTarget {
    pub fn file_name(self) -> String {
        match self {
            Self::Match(match_id) => format!("SiegeMatch-{match_id}.json"),
            Self::DefenseList => DEFENSE_LIST_FILE.to_string(),
        }
    }

    fn metric_kind(self) -> &'static str {
        match self {
            Self::Match(_) => "siege_match",
            Self::DefenseList => "siege_defense",
        }
    }
}

pub struct SiegeExporter {
    name: String,
    output_dir: PathBuf,
    commands: CommandSet,
    document: SiegeDocument,
}

impl SiegeExporter {
    /// Create the exporter, creating `output_dir` if needed
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, ContractError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            name: "siege_export".to_string(),
            output_dir,
            commands: SIEGE_COMMANDS.iter().copied().collect(),
            document: SiegeDocument::default(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn document(&self) -> &SiegeDocument {
        &self.document
    }

    /// Serialize the whole document and replace `target`'s file
    #[instrument(name = "siege_flush", skip(self))]
    fn flush(&self, target: SiegeTarget) -> Result<PathBuf, ContractError> {
        let bytes = serde_json::to_vec(&self.document).map_err(|e| {
            error!(error = %e, "Something went wrong while re-serializing the siege data");
            ContractError::serialization(format!("siege document: {e}"))
        })?;

        let file_path = self.output_dir.join(target.file_name());
        fs::write(&file_path, bytes).map_err(|e| {
            error!(
                file_path = %file_path.display(),
                error = %e,
                "Could not write siege data to file"
            );
            ContractError::Io(e)
        })?;

        record_export_written(target.metric_kind());
        info!(file_path = %file_path.display(), "Siege data successfully written");
        Ok(file_path)
    }

    fn on_matchup_info(
        &mut self,
        wizard_id: i64,
        response: JsonObject,
    ) -> Result<Option<SiegeTarget>, ContractError> {
        let matchup = MatchupInfo::from_response(&response)?;
        if !matchup.is_success() {
            warn!(ret_code = matchup.ret_code, "Matchup info reports failure, skipping");
            return Ok(None);
        }
        let match_id = matchup.match_id()?;

        self.document.wizard_id = Some(wizard_id);
        self.document.matchup_info = Some(response);
        Ok(Some(SiegeTarget::Match(match_id)))
    }

    fn on_battle_log(
        &mut self,
        request: &JsonObject,
        response: JsonObject,
    ) -> Result<Option<SiegeTarget>, ContractError> {
        let log = BattleLogRequest::from_request(request)?;
        let match_id = battle_log_match_id(&response)?;

        if log.is_attack() {
            info!(match_id, log_type = log.log_type, "Writing attack log to file");
            self.document.attack_log = Some(response);
        } else {
            info!(match_id, log_type = log.log_type, "Writing defense log to file");
            self.document.defense_log = Some(response);
        }
        Ok(Some(SiegeTarget::Match(match_id)))
    }

    fn on_defense_list(
        &mut self,
        request: &JsonObject,
        mut response: JsonObject,
    ) -> Result<Option<SiegeTarget>, ContractError> {
        let defense = DefenseListRequest::from_request(request)?;
        if !defense.is_headquarters() {
            debug!(base_number = defense.base_number, "Not a headquarters base, skipping");
            return Ok(None);
        }

        response.insert("hq_base_number".to_string(), defense.base_number.into());
        self.document.defense_list = Some(response);
        info!(base_number = defense.base_number, "Writing defense list to file");
        Ok(Some(SiegeTarget::DefenseList))
    }
}

impl EventHandler for SiegeExporter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn subscriptions(&self) -> CommandSet {
        self.commands.clone()
    }

    #[instrument(
        name = "siege_export_on_event",
        skip(self, event),
        fields(command = %event.command, wizard_id)
    )]
    async fn on_event(&mut self, event: &ApiEvent) -> Result<EventOutcome, ContractError> {
        if !self.commands.matches(&event.command) {
            return Ok(EventOutcome::Ignored);
        }

        let raw = event.decode()?;
        let wizard_id = SiegeRequest::from_request(&raw.request)?.wizard_id;
        tracing::Span::current().record("wizard_id", wizard_id);
        info!("Received command used in siege export");

        let target = match event.command.as_str() {
            MATCHUP_INFO => self.on_matchup_info(wizard_id, raw.response)?,
            BATTLE_LOG => self.on_battle_log(&raw.request, raw.response)?,
            DEFENSE_LIST | DEFENSE_LIST_PRESET => self.on_defense_list(&raw.request, raw.response)?,
            other => {
                warn!(command = other, "Received unexpected command");
                return Err(ContractError::unknown_command(&self.name, other));
            }
        };

        if let Some(target) = target {
            self.flush(target)?;
        }
        Ok(EventOutcome::Handled)
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
