//! File-backed measurement store.
//!
//! Reads a Signal K full-model JSON document from disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use batchpoints_sdk::{MeasurementStore, StoreError};
use batchpoints_types::MeasurementTree;
use parking_lot::Mutex;

/// A measurement store that reads the tree from a JSON file.
///
/// Another process (or a Signal K server dump) keeps the file up to date.
/// The store re-parses the file whenever its modification time or length
/// differs from the last read.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    description: String,
    cached: Mutex<Option<(Stamp, MeasurementTree)>>,
}

/// What identifies one version of the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: SystemTime,
    len: u64,
}

impl FileStore {
    /// Create a new file store for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            cached: Mutex::new(None),
        }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable description, for logs.
    pub fn description(&self) -> &str {
        &self.description
    }

    fn read_file(&self) -> Result<MeasurementTree, StoreError> {
        let content = fs::read(&self.path)?;
        Ok(MeasurementTree::from_json_slice(&content)?)
    }
}

impl MeasurementStore for FileStore {
    fn snapshot(&self) -> Result<MeasurementTree, StoreError> {
        let metadata = fs::metadata(&self.path)?;
        let stamp = metadata.modified().ok().map(|modified| Stamp {
            modified,
            len: metadata.len(),
        });

        let mut cached = self.cached.lock();
        if let (Some(stamp), Some((seen, tree))) = (stamp, cached.as_ref()) {
            if stamp == *seen {
                return Ok(tree.clone());
            }
        }

        let tree = self.read_file()?;
        *cached = stamp.map(|s| (s, tree.clone()));
        Ok(tree)
    }
}
