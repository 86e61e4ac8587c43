//! SortNormalizer - deterministic ordering of a profile document
//!
//! Final unit order (first differing key wins):
//! 1. units outside the storage building, then units inside it
//! 2. `class` descending
//! 3. `unit_level` descending
//! 4. `attribute` ascending
//! 5. `unit_id` ascending
//!
//! Runes (per unit and in the inventory) become a list sorted by `slot_no`.
//! Craft items sort by `craft_type` ascending, then `craft_item_id`
//! descending.

use contracts::{decode_view, json_kind, ContractError, JsonObject};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cmp::Ordering;

use crate::views::{Building, CraftItem, ProfileUnit, RuneSlot};

/// `building_master_id` of the storage building
pub const STORAGE_BUILDING_MASTER_ID: u64 = 25;

/// Storage id used when the profile has no storage building
pub const NO_STORAGE_BUILDING: u64 = 999;

/// Normalize a profile document in place.
///
/// Fails with a validation error when `building_list` is missing or any
/// sort key is malformed. `unit_list`, `runes` and `rune_craft_item_list`
/// are optional.
pub fn normalize(mut document: JsonObject) -> Result<JsonObject, ContractError> {
    let storage_id = storage_building_id(&document)?;

    if let Some(units) = document.get_mut("unit_list") {
        let units = as_list(units, "unit_list")?;
        sort_by_view::<ProfileUnit>(units, "unit_list", |a, b| {
            compare_units(a, b, storage_id)
        })?;

        for (i, unit) in units.iter_mut().enumerate() {
            if let Some(runes) = unit.get_mut("runes") {
                normalize_runes(runes, &format!("unit_list[{i}].runes"))?;
            }
        }
    }

    if let Some(runes) = document.get_mut("runes") {
        normalize_runes(runes, "runes")?;
    }

    if let Some(items) = document.get_mut("rune_craft_item_list") {
        let items = as_list(items, "rune_craft_item_list")?;
        sort_by_view(items, "rune_craft_item_list", compare_craft_items)?;
    }

    Ok(document)
}

/// Building id of the storage building, or `NO_STORAGE_BUILDING`
pub fn storage_building_id(document: &JsonObject) -> Result<u64, ContractError> {
    let buildings = document
        .get("building_list")
        .ok_or_else(|| ContractError::validation("building_list", "missing from response"))?
        .as_array()
        .ok_or_else(|| ContractError::validation("building_list", "expected a list"))?;

    let mut storage_id = NO_STORAGE_BUILDING;
    for (i, entry) in buildings.iter().enumerate() {
        let building: Building = decode_view(entry, &format!("building_list[{i}]"))?;
        if building.building_master_id == STORAGE_BUILDING_MASTER_ID {
            storage_id = building.building_id;
        }
    }
    Ok(storage_id)
}

/// Final unit order
pub fn compare_units(a: &ProfileUnit, b: &ProfileUnit, storage_id: u64) -> Ordering {
    let a_stored = a.building_id == storage_id;
    let b_stored = b.building_id == storage_id;

    a_stored
        .cmp(&b_stored)
        .then_with(|| b.class.cmp(&a.class))
        .then_with(|| b.unit_level.cmp(&a.unit_level))
        .then_with(|| a.attribute.cmp(&b.attribute))
        .then_with(|| a.unit_id.cmp(&b.unit_id))
}

pub fn compare_craft_items(a: &CraftItem, b: &CraftItem) -> Ordering {
    a.craft_type
        .cmp(&b.craft_type)
        .then_with(|| b.craft_item_id.cmp(&a.craft_item_id))
}

/// Turn a rune list or slot map into a list sorted by slot
fn normalize_runes(runes: &mut Value, at: &str) -> Result<(), ContractError> {
    let mut list = match runes.take() {
        Value::Null => return Ok(()),
        Value::Array(list) => list,
        Value::Object(slots) => slots.into_iter().map(|(_, rune)| rune).collect(),
        other => {
            return Err(ContractError::validation(
                at,
                format!("expected a list or map of runes, found {}", json_kind(&other)),
            ))
        }
    };

    sort_by_view(&mut list, at, |a: &RuneSlot, b: &RuneSlot| a.slot_no.cmp(&b.slot_no))?;
    *runes = Value::Array(list);
    Ok(())
}

fn as_list<'a>(value: &'a mut Value, at: &str) -> Result<&'a mut Vec<Value>, ContractError> {
    let kind = json_kind(value);
    value
        .as_array_mut()
        .ok_or_else(|| ContractError::validation(at, format!("expected a list, found {kind}")))
}

/// Stable sort of raw entries by a decoded key view
fn sort_by_view<T: DeserializeOwned>(
    entries: &mut Vec<Value>,
    at: &str,
    compare: impl Fn(&T, &T) -> Ordering,
) -> Result<(), ContractError> {
    let keys = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| decode_view::<T>(entry, &format!("{at}[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    let mut keyed: Vec<(T, Value)> = keys.into_iter().zip(entries.drain(..)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare(a, b));
    entries.extend(keyed.into_iter().map(|(_, entry)| entry));
    Ok(())
}
