//! Typed read views over the profile document
//!
//! Only the keys used for ordering and file naming are decoded; the
//! document itself stays untyped so every other field round-trips as is.

use contracts::{decode_view, ContractError, JsonObject};
use serde::Deserialize;

/// `wizard_info` of a login response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WizardInfo {
    pub wizard_id: i64,
    pub wizard_name: String,
}

/// One `building_list` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Building {
    pub building_id: u64,
    pub building_master_id: u64,
}

/// Sort key of one `unit_list` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProfileUnit {
    pub unit_id: u64,
    pub building_id: u64,
    pub unit_level: u32,
    pub class: u32,
    pub attribute: u32,
}

/// Sort key of a rune
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RuneSlot {
    pub slot_no: u32,
}

/// Sort key of one `rune_craft_item_list` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CraftItem {
    pub craft_type: u32,
    pub craft_item_id: u64,
}

impl WizardInfo {
    pub fn from_response(response: &JsonObject) -> Result<Self, ContractError> {
        let info = response
            .get("wizard_info")
            .ok_or_else(|| ContractError::validation("wizard_info", "missing from response"))?;
        decode_view(info, "wizard_info")
    }

    /// Export file name: `<wizard_name>-<wizard_id>.json`
    ///
    /// Path separators and control characters in the name become `_`.
    pub fn file_name(&self) -> String {
        let name: String = self
            .wizard_name
            .chars()
            .map(|c| match c {
                '/' | '\\' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        format!("{}-{}.json", name, self.wizard_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unit_view_ignores_other_fields() {
        let unit: ProfileUnit = decode_view(
            &json!({
                "unit_id": 11, "building_id": 3, "unit_level": 40,
                "class": 6, "attribute": 2, "skills": [[1, 2]]
            }),
            "unit_list[0]",
        )
        .unwrap();
        assert_eq!(unit.unit_level, 40);
    }

    #[test]
    fn test_view_error_names_location() {
        let err = decode_view::<CraftItem>(&json!({"craft_type": 1}), "rune_craft_item_list[4]")
            .unwrap_err();
        match err {
            ContractError::Validation { field, message } => {
                assert_eq!(field, "rune_craft_item_list[4]");
                assert!(message.contains("craft_item_id"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wizard_info_file_name() {
        let response = json!({"wizard_info": {"wizard_id": 123, "wizard_name": "Rina"}});
        let info = WizardInfo::from_response(response.as_object().unwrap()).unwrap();
        assert_eq!(info.file_name(), "Rina-123.json");
    }

    #[test]
    fn test_file_name_strips_path_separators() {
        let info = WizardInfo {
            wizard_id: 5,
            wizard_name: "../..\\evil/x\0".to_string(),
        };
        assert_eq!(info.file_name(), ".._.._evil_x_-5.json");
    }

    #[test]
    fn test_wizard_info_missing() {
        let response = json!({"unit_list": []});
        assert!(matches!(
            WizardInfo::from_response(response.as_object().unwrap()),
            Err(ContractError::Validation { .. })
        ));
    }
}
