//! Batch - the unit handed to downstream consumers on every flush.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::{MetricKey, Timestamp};

/// A batch of captures: one shared timestamp header plus one value series
/// per metric.
///
/// Serialized with serde as `{ "header": [...], "data": { "<key>": [...] } }`.
///
/// Every series is at most as long as the header. A metric first seen at
/// capture `k` starts its series at that capture, with no placeholder values
/// for earlier captures, so series of metrics that come and go can be
/// shorter than the header.
///
/// # Example
///
/// ```rust
/// use batchpoints_types::{Batch, MetricKey};
///
/// let mut batch = Batch::new();
/// batch.timestamps.push(1607203251539);
/// batch
///     .series
///     .insert(MetricKey::new("environment.wind.speedApparent", "test-source"), vec![0.0]);
///
/// assert_eq!(batch.len(), 1);
/// assert!(batch.is_aligned());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct Batch {
    /// Capture timestamps, in capture order.
    #[cfg_attr(feature = "serde", serde(rename = "header"))]
    #[cfg_attr(feature = "minicbor", n(0))]
    pub timestamps: Vec<Timestamp>,

    /// Captured values keyed by metric.
    #[cfg_attr(feature = "serde", serde(rename = "data"))]
    #[cfg_attr(feature = "minicbor", n(1))]
    pub series: BTreeMap<MetricKey, Vec<f64>>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty() && self.series.is_empty()
    }

    /// Number of captures.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Number of distinct metrics.
    pub fn metric_count(&self) -> usize {
        self.series.len()
    }

    /// Total number of captured values across all series.
    pub fn value_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    /// Get the series for a metric.
    pub fn get(&self, key: &MetricKey) -> Option<&[f64]> {
        self.series.get(key).map(Vec::as_slice)
    }

    /// Whether every series has exactly one value per capture.
    pub fn is_aligned(&self) -> bool {
        self.series.values().all(|s| s.len() == self.timestamps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sample() -> Batch {
        let mut batch = Batch::new();
        batch.timestamps = vec![1607203251539, 1607203251540];
        batch.series.insert(
            MetricKey::new("environment.wind.speedApparent", "test-source"),
            vec![0.0, 1.2],
        );
        batch.series.insert(
            MetricKey::new("environment.wind.angleApparent", "test-source"),
            vec![1.9799],
        );
        batch
    }

    #[test]
    fn counts() {
        let batch = sample();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.metric_count(), 2);
        assert_eq!(batch.value_count(), 3);
        assert!(!batch.is_empty());
        assert!(Batch::new().is_empty());
    }

    #[test]
    fn alignment_reports_short_series() {
        let mut batch = sample();
        assert!(!batch.is_aligned());

        batch
            .series
            .get_mut(&MetricKey::new("environment.wind.angleApparent", "test-source"))
            .unwrap()
            .push(1.98);
        assert!(batch.is_aligned());
    }

    #[test]
    fn lookup_by_key() {
        let batch = sample();
        assert_eq!(
            batch.get(&MetricKey::new("environment.wind.speedApparent", "test-source")),
            Some(&[0.0, 1.2][..])
        );
        assert_eq!(batch.get(&MetricKey::new("missing", "x")), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_header_and_data() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "header": [1607203251539u64, 1607203251540u64],
                "data": {
                    "environment.wind.angleApparent|test-source": [1.9799],
                    "environment.wind.speedApparent|test-source": [0.0, 1.2]
                }
            })
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn empty_batch_serializes_empty() {
        let json = serde_json::to_string(&Batch::new()).unwrap();
        assert_eq!(json, r#"{"header":[],"data":{}}"#);
    }

    #[cfg(feature = "minicbor")]
    #[test]
    fn test_minicbor_roundtrip() {
        let batch = sample();
        let bytes = minicbor::to_vec(&batch).unwrap();
        let parsed: Batch = minicbor::decode(&bytes).unwrap();
        assert_eq!(batch, parsed);
    }
}
