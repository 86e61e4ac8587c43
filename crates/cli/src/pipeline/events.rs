//! Event input - one JSON object per line.
//!
//! ```text
//! {"command": "HubUserLogin", "request": {...}, "response": {...}}
//! {"command": "GetGuildSiegeMatchupInfo", "request": "{\"wizard_id\":1}", "response": "{...}"}
//! ```
//!
//! `request` and `response` may be JSON values or JSON-encoded strings.

use contracts::ApiEvent;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CliError;

#[derive(Debug, Deserialize)]
struct EventLine {
    command: String,
    request: Value,
    response: Value,
}

/// Parse one input line; blank lines yield `None`
pub fn parse_event_line(line: &str) -> Result<Option<ApiEvent>, CliError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let parsed: EventLine =
        serde_json::from_str(line).map_err(|e| CliError::invalid_event(e.to_string()))?;
    if parsed.command.is_empty() {
        return Err(CliError::invalid_event("command is empty"));
    }

    Ok(Some(ApiEvent::new(
        parsed.command,
        body_text(parsed.request),
        body_text(parsed.response),
    )))
}

/// Bodies reach handlers as JSON text, exactly as the proxy captured them
fn body_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
