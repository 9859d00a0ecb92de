//! Output record for stale-file cleanup.
//!
//! Every cycle writes fonts whose names carry a fingerprint, so each change
//! to the icons leaves the previous generation's files behind. The data cache
//! remembers which files the last successful cycle produced; after the next
//! one, anything it recorded that the new cycle did not produce is deleted.
//!
//! # Storage
//!
//! A small JSON document at the `data_cache` path (default
//! `<project_root>/.glyphpack-data`):
//!
//! ```json
//! {
//!   "version": 1,
//!   "projects": {
//!     "/home/me/site": {
//!       "outputs": ["fonts/icons_3f2a9c01d4e5b678.ttf", "fonts/icons.css"]
//!     }
//!   }
//! }
//! ```
//!
//! Records are keyed by canonical project root, so one cache file can be
//! shared. Output paths are stored relative to that root when they live
//! under it, absolute otherwise.
//!
//! # Safety
//!
//! - Only paths the cache itself recorded are ever deleted.
//! - A missing, unreadable, or corrupt cache loads as empty: nothing is
//!   deleted, and the next save writes a fresh record.
//! - Saves go to `<file>.tmp` first and are renamed into place, so an
//!   interrupted write never leaves a truncated cache.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version of the cache format. Bump to discard existing caches when the
/// layout changes.
const CACHE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outputs recorded for one project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRecord {
    pub outputs: BTreeSet<String>,
}

impl ProjectRecord {
    /// Build a record from absolute output paths.
    pub fn from_paths<'a>(root: &Path, paths: impl IntoIterator<Item = &'a Path>) -> Self {
        Self {
            outputs: paths.into_iter().map(|p| record_path(root, p)).collect(),
        }
    }

    /// Recorded outputs as absolute paths.
    pub fn paths(&self, root: &Path) -> BTreeSet<PathBuf> {
        self.outputs.iter().map(|p| root.join(p)).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataCache {
    pub version: u32,
    pub projects: BTreeMap<String, ProjectRecord>,
}

impl Default for DataCache {
    fn default() -> Self {
        Self::empty()
    }
}

impl DataCache {
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            projects: BTreeMap::new(),
        }
    }

    /// Load the cache, falling back to empty on any problem.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::empty(),
            Err(e) => {
                log::warn!("Ignoring unreadable data cache {}: {}", path.display(), e);
                return Self::empty();
            }
        };
        let cache: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Ignoring corrupt data cache {}: {}", path.display(), e);
                return Self::empty();
            }
        };
        if cache.version != CACHE_VERSION {
            log::debug!(
                "Data cache version {} != {}, starting fresh",
                cache.version,
                CACHE_VERSION
            );
            return Self::empty();
        }
        cache
    }

    /// Write the cache atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = tmp_path(path);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn project(&self, root: &Path) -> ProjectRecord {
        self.projects
            .get(&project_key(root))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_project(&mut self, root: &Path, record: ProjectRecord) {
        self.projects.insert(project_key(root), record);
    }

    /// Reconcile this project's record against a fresh output set.
    ///
    /// See [`reconcile`].
    pub fn reconcile_project(&mut self, root: &Path, outputs: &[PathBuf]) -> Reconciled {
        let (record, result) = reconcile(root, &self.project(root), outputs);
        self.set_project(root, record);
        result
    }
}

/// Files removed (or not) by a reconcile.
#[derive(Debug, Default)]
pub struct Reconciled {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, io::Error)>,
}

/// Delete every previously recorded output absent from `outputs`.
///
/// The returned record is exactly `outputs`. Paths already gone from disk
/// are skipped; other deletion failures are logged and returned in
/// [`Reconciled::failed`] without aborting.
pub fn reconcile(
    root: &Path,
    previous: &ProjectRecord,
    outputs: &[PathBuf],
) -> (ProjectRecord, Reconciled) {
    let current = ProjectRecord::from_paths(root, outputs.iter().map(PathBuf::as_path));
    let mut result = Reconciled::default();

    for stale in previous.outputs.difference(&current.outputs) {
        let path = root.join(stale);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Removed stale output {}", path.display());
                result.deleted.push(path);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("Stale output already gone: {}", path.display());
            }
            Err(e) => {
                log::warn!("Could not remove {}: {}", path.display(), e);
                result.failed.push((path, e));
            }
        }
    }

    (current, result)
}

/// Cache key for a project root.
pub fn project_key(root: &Path) -> String {
    root.to_string_lossy().into_owned()
}

fn record_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
