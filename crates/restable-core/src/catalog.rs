//! Explicit registration of table record types.
//!
//! The catalog is the discovery step: each record type is registered once,
//! producing one descriptor per table. Registration validates the static
//! metadata and fails fast on anything unrecoverable; no file I/O happens
//! here. Table identity is the full file name (or the root-relative path,
//! for record types that declare one), and exactly one record type may claim
//! a given identity.

use std::collections::HashMap;

use crate::config::LoadConfig;
use crate::descriptor::{Descriptor, TableSlot};
use crate::record::{ColumnRole, TableRecord};

/// Fatal configuration errors detected at registration time.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Two record types resolve to the same resource file name. Ambiguous
    /// table identity is unrecoverable by policy.
    #[error(
        "record types [{first}] and [{second}] both map to resource file [{file_name}]; \
         rename one or set FILE_NAME on one of them"
    )]
    DuplicateFileName {
        file_name: String,
        first: &'static str,
        second: &'static str,
    },

    /// The record type marks no column as the key.
    #[error("table record type [{record_type}] declares no key column")]
    NoKeyColumn { record_type: &'static str },

    /// The record type marks more than one column as the key.
    #[error("table record type [{record_type}] declares multiple key columns: {columns:?}")]
    MultipleKeyColumns {
        record_type: &'static str,
        columns: Vec<&'static str>,
    },
}

/// The set of registered tables, ready for a load pass.
#[derive(Default)]
pub struct TableCatalog {
    slots: Vec<Box<dyn TableSlot>>,
    // table identity (file name or relative path) -> index into `slots`
    by_identity: HashMap<String, usize>,
}

impl TableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register record type `R` as one table, deriving its file name from
    /// the type (or its `FILE_NAME` override) and validating that exactly
    /// one column is marked as the key.
    pub fn register<R: TableRecord>(&mut self, config: &LoadConfig) -> Result<(), DiscoveryError> {
        let record_type = std::any::type_name::<R>();

        let key_columns: Vec<&'static str> = R::columns()
            .iter()
            .filter(|c| c.role == ColumnRole::Key)
            .map(|c| c.name)
            .collect();
        if key_columns.is_empty() {
            return Err(DiscoveryError::NoKeyColumn { record_type });
        }
        if key_columns.len() > 1 {
            return Err(DiscoveryError::MultipleKeyColumns {
                record_type,
                columns: key_columns,
            });
        }

        let full_file_name = match R::FILE_NAME {
            Some(name) => name.to_string(),
            None => format!("{}{}", R::FILE_STEM, config.default_suffix),
        };
        // A relative-path override is the table's identity; it lets two
        // types share a bare file name as long as their paths differ.
        let identity = match R::RELATIVE_PATH {
            Some(rel) => rel.to_string(),
            None => full_file_name.clone(),
        };
        if let Some(&existing) = self.by_identity.get(&identity) {
            return Err(DiscoveryError::DuplicateFileName {
                file_name: identity,
                first: self.slots[existing].record_type(),
                second: record_type,
            });
        }

        // Snapshot files are flat under the cache dir, so a relative-path
        // table folds its directories into the stem; two tables sharing a
        // bare file name then get distinct snapshots.
        let snapshot_stem = match R::RELATIVE_PATH {
            Some(rel) => {
                let no_ext = rel.rsplit_once('.').map_or(rel, |(stem, _)| stem);
                no_ext.replace(['/', '\\'], "_")
            }
            None => R::FILE_STEM.to_string(),
        };

        let index = self.slots.len();
        self.slots
            .push(Box::new(Descriptor::<R>::new(full_file_name, snapshot_stem)));
        self.by_identity.insert(identity, index);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registered file names, in registration order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.full_file_name())
    }

    pub(crate) fn into_slots(self) -> Vec<Box<dyn TableSlot>> {
        self.slots
    }
}
