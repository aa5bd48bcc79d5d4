//! The bounded-parallel load pipeline.
//!
//! One call to [`load_tables`] takes the registered catalog through the full
//! startup sequence: scan the data root for candidate resource files, match
//! each file to its table, fan the matched units out onto a dedicated worker
//! pool, and publish the finalized tables as an immutable [`TableSet`].
//!
//! The pool is created fresh for the batch and sized from configuration
//! (the work is I/O-bound, so it must neither starve nor be starved by
//! unrelated work on a shared pool) and torn down when the batch ends. The
//! batch is fail-fast: the first unit error aborts the whole load, because a
//! server started against a partial table set is unsafe.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::catalog::TableCatalog;
use crate::config::{ConfigError, LoadConfig};
use crate::descriptor::TableSlot;
use crate::registry::TableSet;
use crate::resolver::{LoadError, ResResolver, ResolveCtx};

/// Run the load batch: scan, match, resolve in parallel, publish.
///
/// There is exactly one load pass per process lifetime; re-running against
/// already-populated descriptors is not supported.
pub fn load_tables(
    catalog: TableCatalog,
    resolvers: &[Box<dyn ResResolver>],
    config: &LoadConfig,
) -> Result<TableSet, LoadError> {
    if config.worker_threads == 0 {
        return Err(ConfigError::InvalidWorkerThreads {
            value: config.worker_threads.to_string(),
        }
        .into());
    }

    let mut slots = catalog.into_slots();
    if slots.is_empty() {
        return Ok(TableSet::empty());
    }

    let started = Instant::now();
    let files = scan_files(&config.data_root)?;
    let resolver_indices = match_sources(&mut slots, &files, resolvers, config)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .thread_name(|i| format!("res-load-{i}"))
        .build()?;
    let ctx = ResolveCtx::new(&config.cache_dir);
    pool.install(|| {
        slots
            .par_iter_mut()
            .zip(resolver_indices.par_iter())
            .try_for_each(|(slot, &resolver_idx)| {
                resolvers[resolver_idx].resolve(slot.as_mut(), &ctx)
            })
    })?;

    let mut set = TableSet::empty();
    for slot in &mut slots {
        if !slot.is_finalized() {
            slot.finalize();
        }
        // finalize above guarantees a table to publish
        if let Some((type_id, table)) = slot.publish() {
            set.insert(type_id, slot.full_file_name().to_string(), table);
        }
    }
    info!(
        "loaded {} tables in {:?} on {} workers",
        set.len(),
        started.elapsed(),
        config.worker_threads
    );
    Ok(set)
}

/// Collect readable regular files under the data root. Unreadable entries
/// are filtered out here, before dispatch.
fn scan_files(root: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::Scan {
            root: root.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "data root is not a directory",
            ),
        });
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => debug!("skipping unreadable entry under {}: {e}", root.display()),
        }
    }
    Ok(files)
}

/// Match each discovered file to its table and bind it, returning the
/// resolver index for every slot.
///
/// Lookup is by exact file name first, then by path relative to the data
/// root (for record types declaring a relative-path override). A slot that
/// ends up with two different files, or with none, is a fatal configuration
/// error.
fn match_sources(
    slots: &mut [Box<dyn TableSlot>],
    files: &[PathBuf],
    resolvers: &[Box<dyn ResResolver>],
    config: &LoadConfig,
) -> Result<Vec<usize>, LoadError> {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut by_rel: HashMap<&'static Path, usize> = HashMap::new();
    for (i, slot) in slots.iter().enumerate() {
        match slot.relative_path() {
            Some(rel) => {
                by_rel.insert(Path::new(rel), i);
            }
            None => {
                by_name.insert(slot.full_file_name().to_string(), i);
            }
        }
    }

    let mut assignment: Vec<Option<usize>> = vec![None; slots.len()];
    for file in files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(resolver_idx) = resolvers.iter().position(|r| name.ends_with(r.suffix())) else {
            continue;
        };
        let rel = file.strip_prefix(&config.data_root).unwrap_or(file);
        let slot_idx = by_name
            .get(name)
            .copied()
            .or_else(|| by_rel.get(rel).copied());
        let Some(i) = slot_idx else {
            debug!("resource file [{}] matches no registered table", rel.display());
            continue;
        };
        slots[i].bind_source(file, &config.data_root)?;
        assignment[i] = Some(resolver_idx);
        debug!(
            "resource file [{}] matched to table [{}]",
            rel.display(),
            slots[i].record_type()
        );
    }

    let mut resolved = Vec::with_capacity(slots.len());
    for (slot, assigned) in slots.iter().zip(assignment) {
        match assigned {
            Some(resolver_idx) if slot.is_bound() => resolved.push(resolver_idx),
            _ => {
                let file_name = slot
                    .relative_path()
                    .unwrap_or(slot.full_file_name())
                    .to_string();
                return Err(LoadError::MissingSource {
                    record_type: slot.record_type(),
                    file_name,
                });
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FormatResolver;
    use crate::test_utils::{ItemRow, make_test_dir, remove_test_dir};

    fn ron_resolvers() -> Vec<Box<dyn ResResolver>> {
        vec![Box::new(FormatResolver::ron())]
    }

    fn write_items(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, text).unwrap();
    }

    fn item_catalog(config: &LoadConfig) -> TableCatalog {
        let mut catalog = TableCatalog::new();
        catalog.register::<ItemRow>(config).unwrap();
        catalog
    }

    #[test]
    fn cold_load_populates_tables_and_cache() {
        let root = make_test_dir("sched_cold");
        write_items(
            &root,
            "items.ron",
            r#"[(id: 1, name: "potion", max_stack: 1), (id: 2, name: "arrow", max_stack: 99)]"#,
        );
        let config = LoadConfig::new(&root);

        let set = load_tables(item_catalog(&config), &ron_resolvers(), &config).unwrap();
        let table = set.table::<ItemRow>().unwrap();
        assert_eq!(table.get(&1).unwrap().max_stack, 1);
        assert_eq!(table.get(&2).unwrap().max_stack, 99);
        assert!(config.cache_dir.join("items.snap").is_file());

        remove_test_dir(&root);
    }

    #[test]
    fn warm_load_uses_snapshot() {
        let root = make_test_dir("sched_warm");
        write_items(
            &root,
            "items.ron",
            r#"[(id: 5, name: "sword", max_stack: 1)]"#,
        );
        let config = LoadConfig::new(&root);

        let first = load_tables(item_catalog(&config), &ron_resolvers(), &config).unwrap();
        assert_eq!(first.table::<ItemRow>().unwrap().len(), 1);

        // Second load of the unchanged file restores from the snapshot.
        let second = load_tables(item_catalog(&config), &ron_resolvers(), &config).unwrap();
        assert_eq!(second.table::<ItemRow>().unwrap().get(&5).unwrap().name, "sword");

        remove_test_dir(&root);
    }

    #[test]
    fn missing_source_file_is_fatal() {
        let root = make_test_dir("sched_missing");
        let config = LoadConfig::new(&root);

        let err = load_tables(item_catalog(&config), &ron_resolvers(), &config).unwrap_err();
        match err {
            LoadError::MissingSource { file_name, .. } => assert_eq!(file_name, "items.ron"),
            other => panic!("expected MissingSource, got {other:?}"),
        }

        remove_test_dir(&root);
    }

    #[test]
    fn two_files_for_one_table_is_fatal() {
        let root = make_test_dir("sched_conflict");
        write_items(&root, "a/items.ron", "[]");
        write_items(&root, "b/items.ron", "[]");
        let config = LoadConfig::new(&root);

        let err = load_tables(item_catalog(&config), &ron_resolvers(), &config).unwrap_err();
        match err {
            LoadError::SourceConflict { first, second, .. } => {
                let msg = format!("{first} {second}");
                assert!(msg.contains("a/items.ron") || msg.contains("a\\items.ron"));
                assert!(msg.contains("b/items.ron") || msg.contains("b\\items.ron"));
            }
            other => panic!("expected SourceConflict, got {other:?}"),
        }

        remove_test_dir(&root);
    }

    #[test]
    fn zero_workers_fails_before_any_io() {
        let root = make_test_dir("sched_zero_workers");
        let mut config = LoadConfig::new(root.join("nonexistent"));
        config.worker_threads = 0;

        let err = load_tables(item_catalog(&config), &ron_resolvers(), &config).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Config(ConfigError::InvalidWorkerThreads { .. })
        ));

        remove_test_dir(&root);
    }

    #[test]
    fn missing_data_root_is_a_scan_error() {
        let root = make_test_dir("sched_no_root");
        let config = LoadConfig::new(root.join("nonexistent"));

        let err = load_tables(item_catalog(&config), &ron_resolvers(), &config).unwrap_err();
        assert!(matches!(err, LoadError::Scan { .. }));

        remove_test_dir(&root);
    }

    #[test]
    fn unmatched_files_are_skipped() {
        let root = make_test_dir("sched_skip");
        write_items(&root, "items.ron", r#"[(id: 1, name: "x", max_stack: 1)]"#);
        write_items(&root, "notes.txt", "not a table");
        write_items(&root, "orphan.ron", "[]");
        let config = LoadConfig::new(&root);

        let set = load_tables(item_catalog(&config), &ron_resolvers(), &config).unwrap();
        assert_eq!(set.len(), 1);

        remove_test_dir(&root);
    }

    #[test]
    fn empty_catalog_loads_empty_set() {
        let root = make_test_dir("sched_empty");
        let config = LoadConfig::new(&root);
        let set = load_tables(TableCatalog::new(), &ron_resolvers(), &config).unwrap();
        assert!(set.is_empty());
        remove_test_dir(&root);
    }

    #[test]
    fn malformed_source_fails_the_batch() {
        let root = make_test_dir("sched_malformed");
        write_items(&root, "items.ron", "this is not ron {{{");
        let config = LoadConfig::new(&root);

        let err = load_tables(item_catalog(&config), &ron_resolvers(), &config).unwrap_err();
        match err {
            LoadError::Parse { file, .. } => {
                assert!(file.ends_with("items.ron"));
            }
            other => panic!("expected Parse, got {other:?}"),
        }

        remove_test_dir(&root);
    }
}
