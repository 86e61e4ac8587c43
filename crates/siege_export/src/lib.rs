//! # Siege Export
//!
//! Assembles guild siege matchup info, battle logs and the HQ defense list
//! into one export document per match.

pub mod aggregator;
pub mod views;

pub use aggregator::{
    SiegeDocument, SiegeExporter, SiegeTarget, BATTLE_LOG, DEFENSE_LIST, DEFENSE_LIST_FILE,
    DEFENSE_LIST_PRESET, MATCHUP_INFO, SIEGE_COMMANDS,
};
pub use views::{
    battle_log_match_id, BattleLogRequest, DefenseListRequest, MatchupInfo, SiegeRequest,
    HQ_BASE_NUMBERS,
};
