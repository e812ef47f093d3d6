//! Measurement stores provided by the command line tool.
//!
//! The in-memory [`SharedStore`](batchpoints_sdk::SharedStore) lives in the
//! SDK; this module adds stores backed by external data.

mod file;

pub use file::FileStore;
