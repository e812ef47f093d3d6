//! # batchpoints
//!
//! Command line service and library glue around [`batchpoints_sdk`]: sample a
//! Signal K full-model document on one schedule, publish filtered batches of
//! its numeric values on another.
//!
//! ## Usage
//!
//! ```bash
//! # Sample full.json every second, print a batch every 10 seconds
//! batchpoints --store full.json
//!
//! # Only wind data, written to a file every minute
//! batchpoints --store full.json --include 'environment.wind.*' \
//!     --write-interval 1m --output file:wind.json
//!
//! # Settings from a file, overridden by BATCHPOINTS_* variables
//! BATCHPOINTS_OUTPUT=tcp:localhost:9000 batchpoints --store full.json --config batchpoints.toml
//! ```
//!
//! ### As a library with a file store
//!
//! ```no_run
//! use batchpoints::FileStore;
//! use batchpoints_sdk::{Batcher, Output};
//!
//! # async fn run() {
//! let batcher = Batcher::builder()
//!     .store(FileStore::new("full.json"))
//!     .output(Output::file("batch.json"))
//!     .build();
//! let handle = batcher.start().unwrap();
//! handle.stop().await;
//! # }
//! ```

pub mod duration;
pub mod settings;
pub mod store;

pub use duration::{format_duration, parse_duration};
pub use settings::{OutputTarget, Settings};
pub use store::FileStore;
