//! The in-progress batch and its two mutations.

use std::collections::BTreeMap;

use batchpoints_types::{Batch, MetricKey, Timestamp};
use parking_lot::Mutex;

/// Owns the batch being accumulated between flushes.
///
/// `capture` and `drain_and_reset` lock the same mutex, so a drain never
/// observes a half-applied capture.
#[derive(Debug, Default)]
pub struct Accumulator {
    batch: Mutex<Batch>,
}

impl Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sampling event.
    ///
    /// `now` is appended to the header. Each pair's value is appended to its
    /// metric's series, creating the series on first sight. Metrics missing
    /// from `pairs` keep their current length. If a key appears more than
    /// once in `pairs`, the last value wins.
    pub fn capture<I>(&self, now: Timestamp, pairs: I)
    where
        I: IntoIterator<Item = (MetricKey, f64)>,
    {
        let round: BTreeMap<MetricKey, f64> = pairs.into_iter().collect();

        let mut batch = self.batch.lock();
        batch.timestamps.push(now);
        for (key, value) in round {
            batch.series.entry(key).or_default().push(value);
        }
    }

    /// Take the current batch, leaving an empty one in its place.
    pub fn drain_and_reset(&self) -> Batch {
        std::mem::take(&mut *self.batch.lock())
    }

    /// Number of captures since the last drain.
    pub fn len(&self) -> usize {
        self.batch.lock().timestamps.len()
    }

    /// Whether nothing was captured since the last drain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

}
