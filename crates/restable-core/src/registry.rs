//! The published set of finalized tables.
//!
//! A [`TableSet`] is built once by the load scheduler and then only read.
//! It is constructed and returned by value so consumers receive it by
//! ownership or reference from whatever wired the startup; there is no
//! process-wide singleton. Lookup is keyed by the record type: the set maps
//! each `TypeId` to its frozen table and downcasts on access.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::record::TableRecord;
use crate::table::Table;

/// Immutable registry of every loaded table. Safe to share across threads;
/// all tables are frozen before the set becomes reachable.
#[derive(Default)]
pub struct TableSet {
    tables: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    names: Vec<String>,
}

impl fmt::Debug for TableSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSet")
            .field("len", &self.tables.len())
            .field("names", &self.names)
            .finish()
    }
}

impl TableSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &mut self,
        type_id: TypeId,
        name: String,
        table: Arc<dyn Any + Send + Sync>,
    ) {
        self.tables.insert(type_id, table);
        self.names.push(name);
    }

    /// The table storing records of type `R`, if one was registered.
    pub fn table<R: TableRecord>(&self) -> Option<&Table<R>> {
        self.tables
            .get(&TypeId::of::<R>())
            .and_then(|t| t.downcast_ref::<Table<R>>())
    }

    /// Shared handle to the table storing records of type `R`.
    pub fn table_arc<R: TableRecord>(&self) -> Option<Arc<Table<R>>> {
        self.tables
            .get(&TypeId::of::<R>())
            .and_then(|t| Arc::clone(t).downcast::<Table<R>>().ok())
    }

    /// Identity-indexed record lookup.
    pub fn get<R: TableRecord>(&self, key: &R::Key) -> Option<&R> {
        self.table::<R>()?.get(key)
    }

    /// Number of published tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// File names of the published tables, in registration order.
    pub fn table_names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBuilder;
    use crate::test_utils::ItemRow;

    fn sample_set() -> TableSet {
        let mut builder = TableBuilder::new();
        builder.insert(ItemRow {
            id: 1,
            name: "potion".into(),
            max_stack: 1,
        });
        let table: Arc<Table<ItemRow>> = Arc::new(builder.build());
        let mut set = TableSet::empty();
        set.insert(
            TypeId::of::<ItemRow>(),
            "items.ron".into(),
            table as Arc<dyn Any + Send + Sync>,
        );
        set
    }

    #[test]
    fn typed_lookup() {
        let set = sample_set();
        let table = set.table::<ItemRow>().unwrap();
        assert_eq!(table.get(&1).unwrap().name, "potion");
        assert_eq!(set.get::<ItemRow>(&1).unwrap().max_stack, 1);
        assert!(set.get::<ItemRow>(&2).is_none());
    }

    #[test]
    fn shared_handle_outlives_the_set() {
        let set = sample_set();
        let table = set.table_arc::<ItemRow>().unwrap();
        drop(set);
        assert_eq!(table.get(&1).unwrap().name, "potion");
    }

    #[test]
    fn set_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TableSet>();
    }

    #[test]
    fn table_names_track_registration_order() {
        let set = sample_set();
        assert_eq!(set.table_names(), ["items.ron"]);
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
    }
}
