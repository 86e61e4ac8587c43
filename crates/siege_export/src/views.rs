//! Typed views over siege requests and responses

use contracts::{decode_view, ContractError, JsonObject};
use serde::Deserialize;
use serde_json::Value;

/// Head-quarter base numbers (red, blue, yellow)
pub const HQ_BASE_NUMBERS: [i64; 3] = [1, 14, 27];

static NULL: Value = Value::Null;

fn field<'a>(body: &'a JsonObject, name: &str) -> &'a Value {
    body.get(name).unwrap_or(&NULL)
}

/// Fields every siege request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiegeRequest {
    pub wizard_id: i64,
}

impl SiegeRequest {
    pub fn from_request(request: &JsonObject) -> Result<Self, ContractError> {
        Ok(Self {
            wizard_id: decode_view(field(request, "wizard_id"), "request.wizard_id")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
struct MatchRef {
    match_id: i64,
}

/// `GetGuildSiegeMatchupInfo` response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchupInfo {
    pub ret_code: i64,
    match_info: Option<MatchRef>,
}

impl MatchupInfo {
    pub fn from_response(response: &JsonObject) -> Result<Self, ContractError> {
        Ok(Self {
            ret_code: decode_view(field(response, "ret_code"), "response.ret_code")?,
            match_info: decode_view(field(response, "match_info"), "response.match_info")?,
        })
    }

    pub fn is_success(&self) -> bool {
        self.ret_code == 0
    }

    pub fn match_id(&self) -> Result<i64, ContractError> {
        self.match_info
            .map(|m| m.match_id)
            .ok_or_else(|| {
                ContractError::validation("match_info.match_id", "missing from response")
            })
    }
}

/// `GetGuildSiegeBattleLog` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleLogRequest {
    pub log_type: i64,
}

impl BattleLogRequest {
    pub const ATTACK: i64 = 1;

    pub fn from_request(request: &JsonObject) -> Result<Self, ContractError> {
        Ok(Self {
            log_type: decode_view(field(request, "log_type"), "request.log_type")?,
        })
    }

    pub fn is_attack(&self) -> bool {
        self.log_type == Self::ATTACK
    }
}

/// Match id of a battle log: `log_list[0].guild_info_list[0].match_id`
pub fn battle_log_match_id(response: &JsonObject) -> Result<i64, ContractError> {
    let log = first_entry(response.get("log_list"), "log_list")?;
    let guild = first_entry(log.get("guild_info_list"), "log_list[0].guild_info_list")?;
    let found: MatchRef = decode_view(guild, "log_list[0].guild_info_list[0]")?;
    Ok(found.match_id)
}

fn first_entry<'a>(list: Option<&'a Value>, at: &str) -> Result<&'a Value, ContractError> {
    list.ok_or_else(|| ContractError::validation(at, "missing from response"))?
        .as_array()
        .ok_or_else(|| ContractError::validation(at, "expected a list"))?
        .first()
        .ok_or_else(|| ContractError::validation(at, "list is empty"))
}

/// Base defense list request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefenseListRequest {
    pub base_number: i64,
}

impl DefenseListRequest {
    pub fn from_request(request: &JsonObject) -> Result<Self, ContractError> {
        Ok(Self {
            base_number: decode_view(field(request, "base_number"), "request.base_number")?,
        })
    }

    pub fn is_headquarters(&self) -> bool {
        HQ_BASE_NUMBERS.contains(&self.base_number)
    }
}
