//! Memoized merged table.
//!
//! The merged table only changes when an input file changes, so it is
//! computed once per distinct set of files and shared read-only afterwards.
//! Files are identified by canonical path, byte length, and modification
//! time; editing a source therefore forces a recompute on the next load.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::SystemTime;

use crate::data::merge::merge;
use crate::domain::{MergedTable, Metric};
use crate::error::DataError;
use crate::io::ingest::{SourceSpec, load_sources};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FileIdentity {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
}

/// Identity of the three input files in a data directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    files: Vec<FileIdentity>,
}

impl SourceKey {
    pub fn for_dir(data_dir: &Path) -> Result<Self, DataError> {
        let mut files = Vec::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let path = SourceSpec::for_metric(metric).path_in(data_dir);
            let meta = std::fs::metadata(&path).map_err(|e| match e.kind() {
                ErrorKind::NotFound => DataError::DataNotFound { path: path.clone() },
                _ => DataError::Io(e),
            })?;
            files.push(FileIdentity {
                path: path.canonicalize()?,
                len: meta.len(),
                modified: meta.modified().ok(),
            });
        }
        Ok(Self { files })
    }

    /// Whether both keys name the same files, whatever their versions.
    fn same_paths(&self, other: &SourceKey) -> bool {
        self.files.iter().map(|f| &f.path).eq(other.files.iter().map(|f| &f.path))
    }
}

/// Read-mostly cache of merged tables keyed by [`SourceKey`].
#[derive(Debug, Default)]
pub struct MergedCache {
    entries: RwLock<HashMap<SourceKey, Arc<MergedTable>>>,
}

impl MergedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static MergedCache {
        static CACHE: OnceLock<MergedCache> = OnceLock::new();
        CACHE.get_or_init(MergedCache::new)
    }

    /// Return the merged table for `data_dir`, loading and merging on a miss.
    ///
    /// Failed loads are not cached.
    pub fn get_or_load(&self, data_dir: &Path) -> Result<Arc<MergedTable>, DataError> {
        let key = SourceKey::for_dir(data_dir)?;

        if let Some(hit) = self.entries.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            log::debug!("merged table cache hit for {}", data_dir.display());
            return Ok(Arc::clone(hit));
        }

        log::info!("loading sources from {}", data_dir.display());
        let table = Arc::new(merge(&load_sources(data_dir)?));
        log::info!("merged table: {} common years", table.len());

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(raced) = entries.get(&key) {
            return Ok(Arc::clone(raced));
        }
        // Older versions of the same files can never be hit again.
        entries.retain(|cached, _| !cached.same_paths(&key));
        entries.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
