//! Per-table bookkeeping: bound source file, version stamp, builder, and the
//! finalized table.
//!
//! A [`Descriptor`] is created per registered record type and owns that
//! table's whole load-phase state. The scheduler and resolvers drive it
//! through the type-erased [`TableSlot`] face, so heterogeneous tables live
//! in one list; the concrete record type is recovered only inside the
//! generic impl (parsing, snapshot codec) and at registry publication, where
//! the `TypeId` keys the published table.
//!
//! Ownership discipline: during the load window a descriptor is exclusively
//! owned by its single loading unit. `finalize` freezes the builder into the
//! immutable table exactly once; after publication only shared reads remain.

use std::any::{Any, TypeId, type_name};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::record::TableRecord;
use crate::resolver::{Format, LoadError, parse_records};
use crate::snapshot;
use crate::table::{Table, TableBuilder};

/// Type-erased face of a [`Descriptor`], driven by the scheduler and by
/// resolvers during the load batch.
pub trait TableSlot: Send {
    /// Name of the record type, for error messages.
    fn record_type(&self) -> &'static str;

    /// Full name of the backing resource file (stem plus extension).
    fn full_file_name(&self) -> &str;

    /// Root-relative path override, when the record type declares one.
    fn relative_path(&self) -> Option<&'static str>;

    /// Bind the discovered resource file and capture its version stamp.
    /// Binding a second, different file is a fatal configuration conflict.
    fn bind_source(&mut self, path: &Path, root: &Path) -> Result<(), LoadError>;

    fn is_bound(&self) -> bool;

    fn source(&self) -> Option<&Path>;

    /// The bound source file's modification time, in milliseconds.
    fn version(&self) -> i64;

    /// Try to populate and finalize the table from its snapshot. Returns
    /// `false` on any cache miss.
    fn restore_snapshot(&mut self, cache_dir: &Path) -> bool;

    /// Parse the bound source file into the builder.
    fn parse_source(&mut self, format: Format) -> Result<(), LoadError>;

    /// Finalize the table, then persist a fresh snapshot. Write failures are
    /// logged and swallowed: the in-memory table is already valid, only the
    /// next startup's speed-up is lost.
    fn write_snapshot(&mut self, cache_dir: &Path);

    /// Freeze the builder into the immutable table. The first finalize wins.
    fn finalize(&mut self);

    fn is_finalized(&self) -> bool;

    /// Hand the finalized table to the registry.
    fn publish(&self) -> Option<(TypeId, Arc<dyn Any + Send + Sync>)>;
}

/// Engine-internal bookkeeping for one table.
pub struct Descriptor<R: TableRecord> {
    full_file_name: String,
    /// Name of this table's snapshot file, derived from the table identity
    /// at registration. Tables disambiguated by a relative path get distinct
    /// stems even when they share a bare file name.
    snapshot_stem: String,
    source: Option<PathBuf>,
    version: i64,
    builder: TableBuilder<R>,
    table: Option<Arc<Table<R>>>,
}

impl<R: TableRecord> Descriptor<R> {
    pub fn new(full_file_name: String, snapshot_stem: String) -> Self {
        Self {
            full_file_name,
            snapshot_stem,
            source: None,
            version: 0,
            builder: TableBuilder::new(),
            table: None,
        }
    }

    /// Insert a record into the builder, logging duplicate-key overwrites.
    fn insert(&mut self, record: R) {
        let key = record.key();
        if self.builder.insert(record).is_some() {
            warn!(
                "table [{}] has duplicate key {key:?}; keeping the later record",
                self.full_file_name
            );
        }
    }

    /// The finalized table, if the load pass has completed.
    pub fn table(&self) -> Option<&Arc<Table<R>>> {
        self.table.as_ref()
    }

    fn display_path(path: &Path, root: &Path) -> String {
        path.strip_prefix(root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

impl<R: TableRecord> TableSlot for Descriptor<R> {
    fn record_type(&self) -> &'static str {
        type_name::<R>()
    }

    fn full_file_name(&self) -> &str {
        &self.full_file_name
    }

    fn relative_path(&self) -> Option<&'static str> {
        R::RELATIVE_PATH
    }

    fn bind_source(&mut self, path: &Path, root: &Path) -> Result<(), LoadError> {
        if let Some(existing) = &self.source {
            if existing != path {
                return Err(LoadError::SourceConflict {
                    record_type: type_name::<R>(),
                    first: Self::display_path(existing, root),
                    second: Self::display_path(path, root),
                });
            }
            return Ok(());
        }
        self.version = snapshot::file_version(path).map_err(|source| LoadError::Read {
            file: path.to_path_buf(),
            source,
        })?;
        self.source = Some(path.to_path_buf());
        debug!(
            "resource file [{}] bound to table [{}]",
            path.display(),
            type_name::<R>()
        );
        Ok(())
    }

    fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn restore_snapshot(&mut self, cache_dir: &Path) -> bool {
        if self.source.is_none() {
            return false;
        }
        let Some(rows) = snapshot::read::<R>(cache_dir, &self.snapshot_stem, self.version) else {
            return false;
        };
        for row in rows {
            self.insert(row);
        }
        self.finalize();
        info!("table [{}] restored from snapshot", self.full_file_name);
        true
    }

    fn parse_source(&mut self, format: Format) -> Result<(), LoadError> {
        let path = match &self.source {
            Some(path) => path.clone(),
            None => {
                return Err(LoadError::Unbound {
                    record_type: type_name::<R>(),
                });
            }
        };
        let text = fs::read_to_string(&path).map_err(|source| LoadError::Read {
            file: path.clone(),
            source,
        })?;
        let rows: Vec<R> = parse_records(&text, format, &path, R::FILE_STEM)?;
        for row in rows {
            self.insert(row);
        }
        Ok(())
    }

    fn write_snapshot(&mut self, cache_dir: &Path) {
        if self.table.is_none() {
            self.finalize();
        }
        let Some(table) = &self.table else { return };
        let rows: Vec<&R> = table.values().collect();
        match snapshot::write(cache_dir, &self.snapshot_stem, self.version, &rows) {
            Ok(()) => info!(
                "table [{}] wrote snapshot ({} records)",
                self.full_file_name,
                rows.len()
            ),
            Err(e) => warn!(
                "table [{}] snapshot write failed, next startup will reparse: {e}",
                self.full_file_name
            ),
        }
    }

    fn finalize(&mut self) {
        if self.table.is_some() {
            error!(
                "table [{}] finalized twice; keeping the first table",
                self.full_file_name
            );
            return;
        }
        let builder = std::mem::take(&mut self.builder);
        self.table = Some(Arc::new(builder.build()));
    }

    fn is_finalized(&self) -> bool {
        self.table.is_some()
    }

    fn publish(&self) -> Option<(TypeId, Arc<dyn Any + Send + Sync>)> {
        let table = self.table.as_ref()?;
        Some((TypeId::of::<R>(), Arc::clone(table) as Arc<dyn Any + Send + Sync>))
    }
}
