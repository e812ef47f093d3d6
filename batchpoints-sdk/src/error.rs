//! Error types for the batcher.

use thiserror::Error;

use crate::extract::ExtractError;
use crate::store::StoreError;

/// Errors surfaced by [`Batcher`](crate::Batcher) operations.
///
/// The scheduled update and write paths never return these; they log and
/// carry on with an empty capture.
#[derive(Debug, Error)]
pub enum Error {
    /// `start()` was called on a batcher whose triggers are already in use.
    #[error("batcher already started")]
    AlreadyStarted,

    /// No owner id was configured and the tree names no `self`.
    #[error("no owner configured and the measurement tree has no self reference")]
    NoOwner,

    /// The measurement store failed to produce a snapshot.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The snapshot had no data for the owner.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}
