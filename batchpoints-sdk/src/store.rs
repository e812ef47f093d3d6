//! Access to the host's measurement store.

use std::fmt::Debug;
use std::sync::Arc;

use batchpoints_types::{MeasurementTree, ParseError};
use parking_lot::RwLock;
use thiserror::Error;

/// Errors a store can report when asked for a snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing data could not be read.
    #[error("failed to read measurement store: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data could not be parsed into a tree.
    #[error("failed to parse measurement store: {0}")]
    Parse(#[from] ParseError),

    /// The store is not available right now.
    #[error("measurement store unavailable: {0}")]
    Unavailable(String),
}

/// A measurement store the batcher samples on every update signal.
///
/// Implementations must be cheap enough to call on every update and must
/// return a self-consistent tree; nothing is cached on the batcher side.
pub trait MeasurementStore: Send + Sync + Debug {
    /// Return the current full tree.
    fn snapshot(&self) -> Result<MeasurementTree, StoreError>;
}

/// An in-memory store the host mutates directly.
///
/// Cloning a `SharedStore` shares the same tree.
///
/// # Example
///
/// ```rust
/// use batchpoints_sdk::{MeasurementStore, SharedStore};
/// use batchpoints_types::NodeKind;
///
/// let store = SharedStore::default();
/// store.update(|tree| {
///     tree.insert("self", "environment.depth.belowKeel", NodeKind::simple("sounder", 4.2))
/// });
///
/// let tree = store.snapshot().unwrap();
/// assert!(tree.owner("self").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    tree: Arc<RwLock<MeasurementTree>>,
}

impl SharedStore {
    /// Create a store holding `tree`.
    pub fn new(tree: MeasurementTree) -> Self {
        Self {
            tree: Arc::new(RwLock::new(tree)),
        }
    }

    /// Replace the whole tree.
    pub fn replace(&self, tree: MeasurementTree) {
        *self.tree.write() = tree;
    }

    /// Mutate the tree in place.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut MeasurementTree) -> R,
    {
        f(&mut *self.tree.write())
    }
}

impl MeasurementStore for SharedStore {
    fn snapshot(&self) -> Result<MeasurementTree, StoreError> {
        Ok(self.tree.read().clone())
    }
}

impl<S: MeasurementStore + ?Sized> MeasurementStore for Arc<S> {
    fn snapshot(&self) -> Result<MeasurementTree, StoreError> {
        (**self).snapshot()
    }
}
