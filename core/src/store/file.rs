//! File-backed parameter store.
//!
//! Layout: `<dir>/<key>` holds the raw value bytes, nothing else. Writes go
//! to a hidden temp file in the same directory (`.<key>.tmp.<pid>.<seq>`),
//! are synced, then renamed over the destination. The rename is the commit
//! point: readers in any process see either the old or the new complete
//! value, and a crash before it leaves the old value untouched.
//!
//! There is no locking. Writers to different keys never share a file, and
//! writers to the same key race only on the final rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::key::validate_key;
use super::Params;
use crate::error::StoreError;


/// Suffix marker of in-flight temp files; used by the watcher to ignore them.
pub const TEMP_MARKER: &str = ".tmp.";

/// Per-process sequence so concurrent stages of one key get distinct temp files.
static STAGE_SEQ: AtomicU64 = AtomicU64::new(0);


/// Parameter store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct ParamStore {
    dir: PathBuf,
}

impl ParamStore {
    /// Open the store at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Open {
            path: dir.clone(),
            source,
        })?;
        Ok(ParamStore { dir })
    }

    /// The directory holding the parameter files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// On-disk path of `key`. The key is not validated.
    pub fn param_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Write `value` to a synced temp file without publishing it.
    ///
    /// Nothing is visible to readers until [`StagedWrite::commit`]. Dropping
    /// the stage instead discards the temp file and leaves the current value
    /// (or absence) intact.
    pub fn stage(&self, key: &str, value: &[u8]) -> Result<StagedWrite, StoreError> {
        validate_key(key)?;
        let seq = STAGE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!(".{}{}{}.{}", key, TEMP_MARKER, std::process::id(), seq));

        let staged = StagedWrite {
            key: key.to_string(),
            tmp,
            dest: self.param_path(key),
            dir: self.dir.clone(),
            committed: false,
        };
        // On error `staged` is dropped here and removes whatever was written.
        write_synced(&staged.tmp, value).map_err(|e| StoreError::io(key, e))?;
        Ok(staged)
    }

    /// All keys currently present, sorted. In-flight temp files are skipped.
    ///
    /// Listing is a convenience for tools; it is not part of the
    /// cross-process contract.
    pub fn keys(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot list {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };
        let mut keys: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| validate_key(name).is_ok())
            .collect();
        keys.sort();
        keys
    }
}

impl Params for ParamStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        if validate_key(key).is_err() {
            debug!("get on invalid key {:?}", key);
            return None;
        }
        match fs::read(self.param_path(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("reading parameter '{}' failed, treating as absent: {}", key, e);
                None
            }
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.stage(key, value)?.commit()
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        match fs::remove_file(self.param_path(key)) {
            Ok(()) => {
                sync_dir(&self.dir);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    fn exists(&self, key: &str) -> bool {
        validate_key(key).is_ok() && self.param_path(key).is_file()
    }
}


/// A value written and synced to a temp file, waiting to be renamed into place.
#[derive(Debug)]
pub struct StagedWrite {
    key: String,
    tmp: PathBuf,
    dest: PathBuf,
    dir: PathBuf,
    committed: bool,
}

impl StagedWrite {
    /// Path of the temp file holding the staged value.
    pub fn temp_path(&self) -> &Path {
        &self.tmp
    }

    /// Publish the staged value by renaming it over the destination.
    pub fn commit(mut self) -> Result<(), StoreError> {
        fs::rename(&self.tmp, &self.dest).map_err(|e| StoreError::io(&self.key, e))?;
        self.committed = true;
        sync_dir(&self.dir);
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}


fn write_synced(path: &Path, value: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(value)?;
    file.sync_all()
}


/// Persist the directory entry change made by a rename or unlink.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir) {
        if let Err(e) = handle.sync_all() {
            debug!("directory sync of {} failed: {}", dir.display(), e);
        }
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
