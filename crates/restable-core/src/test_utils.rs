//! Shared helpers for unit and integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::record::{ColumnDef, TableRecord};

/// Minimal item table row used throughout the engine's own tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRow {
    pub id: u32,
    pub name: String,
    pub max_stack: u32,
}

impl TableRecord for ItemRow {
    type Key = u32;

    const FILE_STEM: &'static str = "items";

    fn columns() -> &'static [ColumnDef] {
        const COLS: &[ColumnDef] = &[
            ColumnDef::key("id"),
            ColumnDef::data("name"),
            ColumnDef::data("max_stack"),
        ];
        COLS
    }

    fn key(&self) -> u32 {
        self.id
    }
}

/// Create a unique temporary directory for test isolation.
pub fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("restable_test_{suffix}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Clean up a test directory.
pub fn remove_test_dir(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}
