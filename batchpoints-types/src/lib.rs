//! # batchpoints-types
//!
//! Core types for telemetry batching. This crate defines the measurement tree
//! that a host exposes, the metric keys that identify a single series, the
//! path filters applied before extraction, and the batch format handed to
//! downstream consumers.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Tagged tree model**: Measurement nodes are explicit variants, not shape-inspected JSON
//! - **Optional serialization**: Enable `serde`, `minicbor` and/or `json` features as needed
//! - **Stable keys**: The same path, sub-field and source always produce the same key
//!
//! ## Features
//!
//! - `std` (default): Standard library support
//! - `serde`: JSON/MessagePack/etc. serialization via serde
//! - `minicbor`: Compact binary serialization via CBOR
//! - `json`: Parse Signal K style full-model documents into a [`MeasurementTree`]
//! - `all`: Enable all of the above
//!
//! ## Example
//!
//! ```rust
//! use batchpoints_types::{Batch, MeasurementTree, MetricKey, NodeKind, Reading};
//!
//! let tree = MeasurementTree::builder()
//!     .owner("urn:mrn:signalk:uuid:self", |o| {
//!         o.measurement(
//!             "environment.wind.speedApparent",
//!             NodeKind::simple("test-source", Reading::Number(3.2)),
//!         )
//!     })
//!     .build();
//!
//! assert!(tree.owner("urn:mrn:signalk:uuid:self").is_some());
//!
//! let key = MetricKey::new("environment.wind.speedApparent", "test-source");
//! assert_eq!(key.as_str(), "environment.wind.speedApparent|test-source");
//!
//! let batch = Batch::new();
//! assert!(batch.is_empty());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod batch;
mod filter;
mod key;
mod tree;

#[cfg(feature = "json")]
mod json;

pub use batch::*;
pub use filter::*;
pub use key::*;
pub use tree::*;

#[cfg(feature = "json")]
pub use json::ParseError;

/// Timestamp attached to each capture, in milliseconds since the Unix epoch.
///
/// The engine never does arithmetic on it; it is carried into the batch
/// header as-is.
pub type Timestamp = u64;

/// Source id used when a measurement does not name the source that produced it.
pub const DEFAULT_SOURCE: &str = "default";

/// Separator between the path and the source inside a [`MetricKey`].
pub const KEY_SEPARATOR: char = '|';
