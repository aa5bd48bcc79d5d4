//! Shipped game design tables and their startup wiring.
//!
//! [`schema`] defines the row types; [`load_game_data`] registers them,
//! spins the load pipeline, and returns the published [`TableSet`]. Pass
//! the returned set (or `Arc` it) to whatever subsystems need table
//! lookups; there is no global registry.

pub mod schema;

use log::info;

use restable_core::catalog::{DiscoveryError, TableCatalog};
use restable_core::config::LoadConfig;
use restable_core::registry::TableSet;
use restable_core::resolver::{FormatResolver, LoadError, ResResolver};
use restable_core::scheduler::load_tables;

use crate::schema::{EquipRow, ItemRow, SkillRow};

/// The standard resolver set: snapshot-first RON, JSON, and TOML.
pub fn standard_resolvers() -> Vec<Box<dyn ResResolver>> {
    vec![
        Box::new(FormatResolver::ron()),
        Box::new(FormatResolver::json()),
        Box::new(FormatResolver::toml()),
    ]
}

/// Register every shipped table with the catalog.
pub fn register_game_tables(
    catalog: &mut TableCatalog,
    config: &LoadConfig,
) -> Result<(), DiscoveryError> {
    catalog.register::<ItemRow>(config)?;
    catalog.register::<SkillRow>(config)?;
    catalog.register::<EquipRow>(config)?;
    Ok(())
}

/// Load all shipped game tables in one call.
pub fn load_game_data(config: &LoadConfig) -> Result<TableSet, LoadError> {
    let mut catalog = TableCatalog::new();
    register_game_tables(&mut catalog, config)?;
    info!(
        "loading {} game tables from {}",
        catalog.len(),
        config.data_root.display()
    );
    load_tables(catalog, &standard_resolvers(), config)
}
