//! Metric keys - the identity of a single series inside a batch.

use alloc::string::String;
use core::fmt;

use crate::KEY_SEPARATOR;

/// Identifier of one series: a measurement path (extended with the sub-field
/// name for composite values) plus the source that produced it.
///
/// Serialized as `"<path>|<source>"`, e.g.
/// `navigation.position.longitude|gps-1`.
///
/// # Example
///
/// ```rust
/// use batchpoints_types::MetricKey;
///
/// let key = MetricKey::new("navigation.position.longitude", "gps-1");
/// assert_eq!(key.path(), "navigation.position.longitude");
/// assert_eq!(key.source(), "gps-1");
/// assert_eq!(key.to_string(), "navigation.position.longitude|gps-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[cfg_attr(
    feature = "minicbor",
    derive(minicbor::Encode, minicbor::Decode),
    cbor(transparent)
)]
pub struct MetricKey(#[cfg_attr(feature = "minicbor", n(0))] String);

impl MetricKey {
    /// Build a key from a path and a source id.
    pub fn new(path: &str, source: &str) -> Self {
        let mut key = String::with_capacity(path.len() + source.len() + 1);
        key.push_str(path);
        key.push(KEY_SEPARATOR);
        key.push_str(source);
        Self(key)
    }

    /// The full key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path part of the key, including any composite sub-field.
    ///
    /// Paths never contain the separator, so the split is at its first
    /// occurrence; sources may contain it.
    pub fn path(&self) -> &str {
        match self.0.split_once(KEY_SEPARATOR) {
            Some((path, _)) => path,
            None => &self.0,
        }
    }

    /// The source part of the key.
    pub fn source(&self) -> &str {
        match self.0.split_once(KEY_SEPARATOR) {
            Some((_, source)) => source,
            None => "",
        }
    }

    /// Consume the key, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MetricKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<MetricKey> for String {
    fn from(key: MetricKey) -> Self {
        key.0
    }
}
