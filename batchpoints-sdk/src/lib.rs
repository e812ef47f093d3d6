//! # batchpoints-sdk
//!
//! Sample a live measurement tree, filter and batch its numeric values, and
//! hand the batches to downstream consumers on a separate schedule.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batchpoints_sdk::{Batcher, Output, SharedStore};
//! use batchpoints_types::{FilterSpec, NodeKind};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     // The host keeps this store up to date
//!     let store = SharedStore::default();
//!     store.update(|tree| {
//!         tree.self_ref = Some("vessels.self".into());
//!         tree.insert("self", "environment.wind.speedApparent", NodeKind::simple("nmea.II", 3.2));
//!     });
//!
//!     // Sample every second, flush every minute
//!     let batcher = Batcher::builder()
//!         .store(store.clone())
//!         .filter(FilterSpec::include(["environment.*"]))
//!         .update_interval(Duration::from_secs(1))
//!         .write_interval(Duration::from_secs(60))
//!         .output(Output::file("batch.json"))
//!         .build();
//!
//!     // Start background scheduling (non-blocking)
//!     let handle = batcher.start().unwrap();
//!
//!     // ... the host runs and keeps updating the store ...
//!
//!     handle.stop().await;
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`matches`]: include/exclude glob matching of dotted paths
//! - [`extract`]: flatten one owner's subtree into `(key, value)` pairs
//! - [`Accumulator`]: the in-progress batch, with `capture` and `drain_and_reset`
//! - [`Batcher`]: binds the update and write [`Trigger`]s to capture and flush
//! - [`Output`]: where flushed batches go (file, TCP, channel, callback)

mod batcher;
mod clock;
mod error;
mod extract;
mod filter;
mod output;
mod state;
mod store;

#[cfg(feature = "tokio")]
mod trigger;

pub use batcher::{
    Batcher, BatcherBuilder, Owner, DEFAULT_UPDATE_INTERVAL_MS, DEFAULT_WRITE_INTERVAL_MS,
};
#[cfg(feature = "tokio")]
pub use batcher::BatcherHandle;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;
pub use extract::{extract, ExtractError, Pair};
pub use filter::{matches, pattern_matches};
pub use output::{Output, PublishFn, TCP_SEND_TIMEOUT};
pub use state::Accumulator;
pub use store::{MeasurementStore, SharedStore, StoreError};
#[cfg(feature = "tokio")]
pub use trigger::{Trigger, TriggerHandle};

// Re-export types for convenience
pub use batchpoints_types::{
    Batch, FilterMode, FilterSpec, MeasurementTree, MetricKey, NodeKind, Reading, Timestamp,
    TreeNode,
};
