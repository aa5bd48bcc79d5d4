//! The contract a row type must satisfy to be stored in a table.
//!
//! A table record is a plain serde struct plus a small amount of static
//! metadata: the backing file it comes from, a column list with exactly one
//! key column, and an accessor for the key value. Everything the engine does
//! (matching files, caching, building the identity map) hangs off this trait;
//! no runtime introspection is involved.

use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Bounds required of a table's key type.
///
/// `Ord` drives the identity map (keys iterate in order), `Hash + Eq` cover
/// hash-based consumers, and the serde bounds let keys round-trip through
/// snapshots as part of their record.
pub trait TableKey:
    Ord + Eq + Hash + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> TableKey for T where
    T: Ord + Eq + Hash + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// The role a column plays within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// The identity column. Exactly one per record type.
    Key,
    /// Opaque payload, copied verbatim into and out of snapshots.
    Data,
}

/// Static metadata for one column of a record type.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub role: ColumnRole,
}

impl ColumnDef {
    /// The identity column.
    pub const fn key(name: &'static str) -> Self {
        Self {
            name,
            role: ColumnRole::Key,
        }
    }

    /// A payload column.
    pub const fn data(name: &'static str) -> Self {
        Self {
            name,
            role: ColumnRole::Data,
        }
    }
}

/// One row type of one configuration table.
///
/// Implementations are registered explicitly with a
/// [`TableCatalog`](crate::catalog::TableCatalog); registration validates the
/// column metadata (exactly one [`ColumnRole::Key`] column) and derives the
/// table's backing file name.
pub trait TableRecord: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Key type of the identity column.
    type Key: TableKey;

    /// Base name of the backing resource file, without extension.
    const FILE_STEM: &'static str;

    /// Full file name override (stem plus extension). When `None`, the name
    /// is `FILE_STEM` plus the configured default suffix.
    const FILE_NAME: Option<&'static str> = None;

    /// Path relative to the data root. Set this to disambiguate when two
    /// directories contain a file with this table's name; only the file at
    /// this exact relative path will then match.
    const RELATIVE_PATH: Option<&'static str> = None;

    /// Column metadata. Exactly one entry must carry [`ColumnRole::Key`].
    fn columns() -> &'static [ColumnDef];

    /// The value of this record's identity column.
    fn key(&self) -> Self::Key;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_def_constructors() {
        let id = ColumnDef::key("id");
        assert_eq!(id.name, "id");
        assert_eq!(id.role, ColumnRole::Key);

        let name = ColumnDef::data("name");
        assert_eq!(name.name, "name");
        assert_eq!(name.role, ColumnRole::Data);
    }
}
