//! Compressed binary snapshot cache, one file per table.
//!
//! Layout: an 8-byte little-endian version stamp (the source file's
//! modification time in milliseconds), followed by the table's records as a
//! bitcode sequence compressed with LZ4:
//!
//! ```text
//! [version: i64 LE][lz4: compress_prepend_size(bitcode(Vec<R>))]
//! ```
//!
//! The version stamp is compared for exact equality against the live source
//! file before the payload is touched. A mismatch means the source changed
//! since the snapshot was written and the whole snapshot is discarded; a
//! coarse mtime stamp is cheap and the tables are developer-edited design
//! data, so an unnecessary reparse is acceptable while a stale table is not.
//!
//! On the read side every failure (missing file, short prefix, stale stamp,
//! corrupt payload) is a cache miss, never an error. Only the write side
//! reports errors, and callers swallow those too after logging.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Extension of snapshot files under the cache directory.
pub const SNAPSHOT_EXT: &str = "snap";

/// Width of the leading version stamp.
const VERSION_PREFIX_LEN: usize = 8;

/// Errors while persisting a snapshot. Read-side problems are cache misses,
/// not errors.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to create snapshot directory {dir}: {source}")]
    CreateDir { dir: PathBuf, source: io::Error },

    #[error("bitcode encoding failed: {0}")]
    Encode(String),

    #[error("failed to write snapshot {file}: {source}")]
    Write { file: PathBuf, source: io::Error },
}

/// Path of the snapshot file for a table stem.
pub fn snapshot_path(cache_dir: &Path, stem: &str) -> PathBuf {
    cache_dir.join(format!("{stem}.{SNAPSHOT_EXT}"))
}

/// A file's modification time in milliseconds since the Unix epoch.
///
/// This is the version stamp written into, and checked against, snapshots.
pub fn file_version(path: &Path) -> io::Result<i64> {
    let modified = fs::metadata(path)?.modified()?;
    let millis = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    Ok(millis)
}

/// Persist a table's record set under the given version stamp.
pub fn write<R: Serialize>(
    cache_dir: &Path,
    stem: &str,
    version: i64,
    rows: &[&R],
) -> Result<(), SnapshotError> {
    fs::create_dir_all(cache_dir).map_err(|source| SnapshotError::CreateDir {
        dir: cache_dir.to_path_buf(),
        source,
    })?;

    let payload = bitcode::serialize(&rows).map_err(|e| SnapshotError::Encode(e.to_string()))?;
    let compressed = lz4_flex::compress_prepend_size(&payload);

    let mut buf = Vec::with_capacity(VERSION_PREFIX_LEN + compressed.len());
    buf.extend_from_slice(&version.to_le_bytes());
    buf.extend_from_slice(&compressed);

    let path = snapshot_path(cache_dir, stem);
    fs::write(&path, buf).map_err(|source| SnapshotError::Write { file: path, source })?;
    Ok(())
}

/// Try to load a table's record set from its snapshot.
///
/// Returns `None` on any cache miss: no snapshot file, unreadable or stale
/// version stamp, or a payload that fails to decompress or decode. The
/// version comparison is exact equality with `live_version`.
pub fn read<R: DeserializeOwned>(cache_dir: &Path, stem: &str, live_version: i64) -> Option<Vec<R>> {
    let path = snapshot_path(cache_dir, stem);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            debug!("snapshot {} unreadable: {e}", path.display());
            return None;
        }
    };

    if bytes.len() < VERSION_PREFIX_LEN {
        warn!("snapshot {} truncated, ignoring", path.display());
        return None;
    }
    let mut prefix = [0u8; VERSION_PREFIX_LEN];
    prefix.copy_from_slice(&bytes[..VERSION_PREFIX_LEN]);
    let stored = i64::from_le_bytes(prefix);
    if stored != live_version {
        debug!(
            "snapshot {} is stale (stored version {stored}, live {live_version})",
            path.display()
        );
        return None;
    }

    let payload = match lz4_flex::decompress_size_prepended(&bytes[VERSION_PREFIX_LEN..]) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("snapshot {} corrupt ({e}), ignoring", path.display());
            return None;
        }
    };
    match bitcode::deserialize(&payload) {
        Ok(rows) => Some(rows),
        Err(e) => {
            warn!("snapshot {} failed to decode ({e}), ignoring", path.display());
            None
        }
    }
}
