//! Restable Core -- the static resource table engine.
//!
//! This crate loads large sets of rarely-changing configuration tables
//! (game design data: items, skills, equipment stats) from on-disk resource
//! files into strongly-typed immutable lookup tables, and caches each table
//! as a compressed, version-stamped binary snapshot so unchanged files skip
//! source parsing on the next startup.
//!
//! # Load Pipeline
//!
//! One call to [`scheduler::load_tables`] runs the whole startup sequence:
//!
//! 1. **Register** -- record types are registered in a
//!    [`catalog::TableCatalog`]; metadata conflicts (duplicate file names,
//!    bad key-column cardinality) fail here, before any I/O.
//! 2. **Scan & match** -- the data root is walked and each resource file is
//!    matched to its table by file name, or by relative path for types that
//!    declare one; a table matching two files is a fatal conflict.
//! 3. **Resolve** -- matched units fan out onto a dedicated worker pool
//!    sized from configuration. Each table either restores from its
//!    snapshot (version stamp equal to the source file's mtime) or parses
//!    the live source and writes a fresh snapshot. The first failure aborts
//!    the batch.
//! 4. **Publish** -- every table freezes into an immutable map and the
//!    whole set is returned as a [`registry::TableSet`].
//!
//! # Key Types
//!
//! - [`record::TableRecord`] -- the contract a row type satisfies: serde,
//!   column metadata with exactly one key column, and a key accessor.
//! - [`descriptor::Descriptor`] -- per-table bookkeeping (bound file,
//!   version stamp, builder, frozen table).
//! - [`snapshot`] -- the `[i64 version][lz4(bitcode)]` cache codec.
//! - [`resolver::ResResolver`] -- per-suffix adapter from resource file to
//!   populated table; [`resolver::FormatResolver`] is the standard
//!   snapshot-first implementation for RON, JSON, and TOML.
//! - [`registry::TableSet`] -- the published, immutable registry.

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod scheduler;
pub mod snapshot;
pub mod table;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use catalog::{DiscoveryError, TableCatalog};
pub use config::{ConfigError, LoadConfig, LoadSettings};
pub use record::{ColumnDef, ColumnRole, TableKey, TableRecord};
pub use registry::TableSet;
pub use resolver::{Format, FormatResolver, LoadError, ResResolver, ResolveCtx};
pub use scheduler::load_tables;
pub use table::Table;
