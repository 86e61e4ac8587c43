//! # Profile Export
//!
//! Writes a deterministically ordered snapshot of the wizard profile on
//! every login.

pub mod exporter;
pub mod normalizer;
pub mod views;

pub use exporter::{ProfileExporter, PROFILE_COMMANDS};
pub use normalizer::{
    compare_craft_items, compare_units, normalize, storage_building_id, NO_STORAGE_BUILDING,
    STORAGE_BUILDING_MASTER_ID,
};
pub use views::{Building, CraftItem, ProfileUnit, RuneSlot, WizardInfo};
