//! Row types for the shipped game design tables.
//!
//! These structs define the on-disk record shape for items, skills, and
//! equipment. They are deserialized from RON, JSON, or TOML resource files
//! (or restored from binary snapshots) and published as immutable lookup
//! tables; only the `id` column is inspected by the engine, everything else
//! is opaque payload.

use serde::{Deserialize, Serialize};

use restable_core::record::{ColumnDef, TableRecord};

// ===========================================================================
// Shared enums
// ===========================================================================

/// Broad classification of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Consumable,
    Equipment,
    Material,
    Quest,
}

/// A character attribute that items and skills can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropType {
    Hp,
    Mp,
    Attack,
    Defense,
    Speed,
    Level,
}

/// Slot an equipment piece occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Helmet,
    Chest,
    Legs,
    Boots,
    Ring,
}

// ===========================================================================
// Items
// ===========================================================================

/// One row of the item configuration table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRow {
    pub id: u32,
    pub name: String,
    pub item_type: ItemType,
    /// Largest stack one inventory slot holds; 1 means unstackable.
    pub max_stack: u32,
    /// Attribute deltas applied when the item is consumed.
    #[serde(default)]
    pub prop_change_after_use: Vec<(PropType, i64)>,
    /// Starting durability for equippable items.
    #[serde(default)]
    pub durability: u32,
    /// Set when `item_type` is `Equipment`.
    #[serde(default)]
    pub equip_slot: Option<EquipSlot>,
}

impl TableRecord for ItemRow {
    type Key = u32;

    const FILE_STEM: &'static str = "items";

    fn columns() -> &'static [ColumnDef] {
        const COLS: &[ColumnDef] = &[
            ColumnDef::key("id"),
            ColumnDef::data("name"),
            ColumnDef::data("item_type"),
            ColumnDef::data("max_stack"),
            ColumnDef::data("prop_change_after_use"),
            ColumnDef::data("durability"),
            ColumnDef::data("equip_slot"),
        ];
        COLS
    }

    fn key(&self) -> u32 {
        self.id
    }
}

// ===========================================================================
// Skills
// ===========================================================================

/// What casting a skill does to its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillEffect {
    Damage { amount: i64 },
    Heal { amount: i64 },
    PropBuff { prop: PropType, delta: i64, duration_ms: u64 },
}

/// One row of the skill configuration table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRow {
    pub id: u32,
    pub name: String,
    pub mp_cost: i64,
    pub cooldown_ms: u64,
    /// Maximum cast distance in scene units; 0 means self-cast only.
    #[serde(default)]
    pub cast_range: u32,
    pub effect: SkillEffect,
}

impl TableRecord for SkillRow {
    type Key = u32;

    const FILE_STEM: &'static str = "skills";

    fn columns() -> &'static [ColumnDef] {
        const COLS: &[ColumnDef] = &[
            ColumnDef::key("id"),
            ColumnDef::data("name"),
            ColumnDef::data("mp_cost"),
            ColumnDef::data("cooldown_ms"),
            ColumnDef::data("cast_range"),
            ColumnDef::data("effect"),
        ];
        COLS
    }

    fn key(&self) -> u32 {
        self.id
    }
}

// ===========================================================================
// Equipment
// ===========================================================================

/// One row of the equipment stats table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipRow {
    pub id: u32,
    pub name: String,
    pub slot: EquipSlot,
    /// Attribute bonuses while equipped.
    #[serde(default)]
    pub prop_bonuses: Vec<(PropType, i64)>,
    pub max_durability: u32,
}

impl TableRecord for EquipRow {
    type Key = u32;

    const FILE_STEM: &'static str = "equips";

    fn columns() -> &'static [ColumnDef] {
        const COLS: &[ColumnDef] = &[
            ColumnDef::key("id"),
            ColumnDef::data("name"),
            ColumnDef::data("slot"),
            ColumnDef::data("prop_bonuses"),
            ColumnDef::data("max_durability"),
        ];
        COLS
    }

    fn key(&self) -> u32 {
        self.id
    }
}

// ===========================================================================
// Tests
// ===========================================================================
