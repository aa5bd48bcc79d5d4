//! Per-suffix resolvers and the load-pipeline error type.
//!
//! A resolver owns the policy for turning one kind of resource file into a
//! populated table. The scheduler hands it a fully-bound
//! [`TableSlot`](crate::descriptor::TableSlot) (the file is already matched
//! and version-stamped); the resolver decides how the records get there. The
//! standard [`FormatResolver`] restores from the snapshot cache when the
//! version stamp matches and otherwise parses the live source and writes a
//! fresh snapshot. Custom resolvers implement [`ResResolver`] and are
//! registered alongside the standard ones; the engine guarantees each is
//! invoked with at most one matched slot per discovered file.

use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::catalog::DiscoveryError;
use crate::config::ConfigError;
use crate::descriptor::TableSlot;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that abort the load batch. Cache staleness and snapshot write
/// failures are deliberately absent: neither is an error.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The data root could not be enumerated.
    #[error("failed to scan data root {root}: {source}")]
    Scan { root: PathBuf, source: io::Error },

    /// Two resource files both matched the same table.
    #[error(
        "table [{record_type}] matches two resource files: [{first}] and [{second}]; \
         declare RELATIVE_PATH = \"{first}\" or \"{second}\" on the record type to pick one"
    )]
    SourceConflict {
        record_type: &'static str,
        first: String,
        second: String,
    },

    /// A registered table's resource file never appeared under the root.
    #[error("no resource file named [{file_name}] found for table [{record_type}]")]
    MissingSource {
        record_type: &'static str,
        file_name: String,
    },

    /// A resolver ran against a slot with no bound source file.
    #[error("table [{record_type}] has no bound resource file")]
    Unbound { record_type: &'static str },

    #[error("failed to read {file}: {source}")]
    Read { file: PathBuf, source: io::Error },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    #[error("failed to build load worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

// ---------------------------------------------------------------------------
// Source formats
// ---------------------------------------------------------------------------

/// Supported source-file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Json,
    Toml,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, LoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        _ => Err(LoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Deserialize a record list from source text. RON and JSON sources are a
/// top-level array; TOML cannot express one, so TOML sources hold the list
/// under a top-level key equal to the table's file stem.
pub(crate) fn parse_records<R: DeserializeOwned>(
    text: &str,
    format: Format,
    file: &Path,
    toml_key: &str,
) -> Result<Vec<R>, LoadError> {
    match format {
        Format::Ron => ron::from_str(text).map_err(|e| LoadError::Parse {
            file: file.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(text).map_err(|e| LoadError::Parse {
            file: file.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Toml => {
            let table: toml::Value = toml::from_str(text).map_err(|e| LoadError::Parse {
                file: file.to_path_buf(),
                detail: e.to_string(),
            })?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| LoadError::Parse {
                    file: file.to_path_buf(),
                    detail: format!("missing key '{toml_key}' in TOML file"),
                })?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| LoadError::Parse {
                    file: file.to_path_buf(),
                    detail: e.to_string(),
                })
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver boundary
// ---------------------------------------------------------------------------

/// Shared context handed to resolvers during a load batch.
#[derive(Debug)]
pub struct ResolveCtx<'a> {
    cache_dir: &'a Path,
}

impl<'a> ResolveCtx<'a> {
    pub fn new(cache_dir: &'a Path) -> Self {
        Self { cache_dir }
    }

    /// Directory holding the snapshot cache files.
    pub fn cache_dir(&self) -> &Path {
        self.cache_dir
    }
}

/// Format-specific adapter that populates a matched table.
pub trait ResResolver: Send + Sync {
    /// File suffix this resolver claims, including the dot (e.g. `".ron"`).
    fn suffix(&self) -> &'static str;

    /// Populate and finalize the slot from its bound resource file.
    fn resolve(&self, slot: &mut dyn TableSlot, ctx: &ResolveCtx<'_>) -> Result<(), LoadError>;
}

/// The standard snapshot-first resolver: restore from the cache when the
/// version stamp matches, otherwise parse the live source and persist a
/// fresh snapshot for the next startup.
#[derive(Debug, Clone, Copy)]
pub struct FormatResolver {
    suffix: &'static str,
    format: Format,
}

impl FormatResolver {
    pub fn new(suffix: &'static str, format: Format) -> Self {
        Self { suffix, format }
    }

    pub fn ron() -> Self {
        Self::new(".ron", Format::Ron)
    }

    pub fn json() -> Self {
        Self::new(".json", Format::Json)
    }

    pub fn toml() -> Self {
        Self::new(".toml", Format::Toml)
    }
}

impl ResResolver for FormatResolver {
    fn suffix(&self) -> &'static str {
        self.suffix
    }

    fn resolve(&self, slot: &mut dyn TableSlot, ctx: &ResolveCtx<'_>) -> Result<(), LoadError> {
        if slot.restore_snapshot(ctx.cache_dir()) {
            return Ok(());
        }
        slot.parse_source(self.format)?;
        slot.write_snapshot(ctx.cache_dir());
        Ok(())
    }
}
