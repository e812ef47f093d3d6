//! The Batcher: binds the update and write signals to capture and flush.

use std::sync::Arc;
#[cfg(feature = "tokio")]
use std::time::Duration;

use batchpoints_types::{Batch, FilterSpec};
#[cfg(feature = "tokio")]
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::extract::{extract, Pair};
use crate::output::Output;
use crate::state::Accumulator;
use crate::store::{MeasurementStore, SharedStore};
#[cfg(feature = "tokio")]
use crate::trigger::Trigger;

/// Default period of the update (sampling) trigger.
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 1_000;

/// Default period of the write (flush) trigger.
pub const DEFAULT_WRITE_INTERVAL_MS: u64 = 10_000;

/// Which owner's subtree is sampled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Owner {
    /// A fixed owner id.
    Id(String),

    /// Whatever the tree's `self` reference names at sampling time.
    #[default]
    SelfRef,
}

/// The main entry point: samples a measurement store on the update signal
/// and flushes accumulated batches to outputs on the write signal.
///
/// # Example
///
/// ```rust,no_run
/// use batchpoints_sdk::{Batcher, Output};
/// use batchpoints_types::FilterSpec;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let batcher = Batcher::builder()
///         .owner("urn:mrn:signalk:uuid:c0d79334")
///         .filter(FilterSpec::include(["environment.*"]))
///         .update_interval(Duration::from_secs(1))
///         .write_interval(Duration::from_secs(60))
///         .output(Output::file("batch.json"))
///         .build();
///
///     let handle = batcher.start().expect("first start");
///
///     tokio::signal::ctrl_c().await.unwrap();
///     handle.stop().await;
/// }
/// ```
#[derive(Debug)]
pub struct Batcher {
    inner: Arc<Inner>,
    #[cfg(feature = "tokio")]
    triggers: Mutex<Option<(Trigger, Trigger)>>,
}

#[derive(Debug)]
struct Inner {
    store: Arc<dyn MeasurementStore>,
    clock: Arc<dyn Clock>,
    owner: Owner,
    filter: FilterSpec,
    accumulator: Accumulator,
    outputs: Vec<Output>,
}

impl Batcher {
    /// Create a batcher over `store` with default settings.
    ///
    /// Samples the tree's own owner, selects every path, stamps captures with
    /// the system clock and has no outputs.
    pub fn new(store: impl MeasurementStore + 'static) -> Self {
        Self::builder().store(store).build()
    }

    /// Create a builder for configuring the batcher.
    pub fn builder() -> BatcherBuilder {
        BatcherBuilder::new()
    }

    /// The filter applied to measurement paths.
    pub fn filter(&self) -> &FilterSpec {
        &self.inner.filter
    }

    /// The owner being sampled.
    pub fn owner(&self) -> &Owner {
        &self.inner.owner
    }

    /// Extract the current pairs without capturing them.
    pub fn sample(&self) -> Result<Vec<Pair>, Error> {
        self.inner.sample()
    }

    /// Handle one update signal: sample the store and capture at the clock's
    /// current time.
    ///
    /// Failures to sample are logged and recorded as a capture with no
    /// values. Returns the number of values captured.
    pub fn update_now(&self) -> usize {
        self.inner.update()
    }

    /// Drain the accumulated batch without publishing it.
    pub fn flush(&self) -> Batch {
        self.inner.accumulator.drain_and_reset()
    }

    /// Number of captures waiting for the next flush.
    pub fn pending_captures(&self) -> usize {
        self.inner.accumulator.len()
    }

    /// Handle one write signal: drain the batch and emit it to every output.
    #[cfg(feature = "tokio")]
    pub async fn write_now(&self) {
        self.inner.write().await
    }

    /// Start reacting to the update and write triggers.
    ///
    /// This spawns a tokio task that handles one signal at a time. A signal
    /// being handled when the batcher is stopped runs to completion; signals
    /// still queued are dropped.
    ///
    /// The triggers are consumed, so a batcher can only be started once.
    #[cfg(feature = "tokio")]
    pub fn start(&self) -> Result<BatcherHandle, Error> {
        use tokio::sync::watch;
        use tracing::info;

        let (update, write) = self.triggers.lock().take().ok_or(Error::AlreadyStarted)?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let inner = self.inner.clone();

        info!(
            owner = ?inner.owner,
            filter_mode = %inner.filter.mode,
            patterns = inner.filter.patterns.len(),
            outputs = inner.outputs.len(),
            "batcher started"
        );

        let task = tokio::spawn(async move {
            let mut update = update.into_port();
            let mut write = write.into_port();
            let mut stop_rx = stop_rx;

            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    signal = update.next() => {
                        inner.update();
                        signal.done();
                    }
                    signal = write.next() => {
                        inner.write().await;
                        signal.done();
                    }
                }
            }

            info!("batcher stopped");
        });

        Ok(BatcherHandle { stop_tx, task })
    }
}

impl Inner {
    fn sample(&self) -> Result<Vec<Pair>, Error> {
        let tree = self.store.snapshot()?;
        let owner = match &self.owner {
            Owner::Id(id) => id.as_str(),
            Owner::SelfRef => tree.self_id().ok_or(Error::NoOwner)?,
        };
        Ok(extract(&tree, owner, &self.filter)?)
    }

    fn update(&self) -> usize {
        let now = self.clock.now_ms();
        let pairs = self.sample().unwrap_or_else(|e| {
            warn!(error = %e, "no data this cycle");
            Vec::new()
        });

        let count = pairs.len();
        self.accumulator.capture(now, pairs);
        debug!(timestamp = now, values = count, "captured");
        count
    }

    #[cfg(feature = "tokio")]
    async fn write(&self) {
        let batch = self.accumulator.drain_and_reset();
        debug!(
            captures = batch.len(),
            metrics = batch.metric_count(),
            values = batch.value_count(),
            aligned = batch.is_aligned(),
            "flushing batch"
        );

        for output in &self.outputs {
            if let Err(e) = output.emit(&batch).await {
                warn!(output = %output.describe(), error = %e, "failed to publish batch");
            }
        }
    }
}

impl Default for Batcher {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for configuring a Batcher.
#[derive(Debug, Default)]
pub struct BatcherBuilder {
    store: Option<Arc<dyn MeasurementStore>>,
    clock: Option<Arc<dyn Clock>>,
    owner: Owner,
    filter: FilterSpec,
    outputs: Vec<Output>,
    #[cfg(feature = "tokio")]
    update: Option<Trigger>,
    #[cfg(feature = "tokio")]
    write: Option<Trigger>,
}

impl BatcherBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the measurement store to sample.
    ///
    /// Defaults to an empty [`SharedStore`].
    pub fn store(mut self, store: impl MeasurementStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set the clock that stamps captures.
    ///
    /// Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Set the clock from a shared handle, so the host can keep driving it.
    pub fn shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sample a fixed owner.
    ///
    /// Defaults to the tree's `self` reference.
    pub fn owner(mut self, id: impl Into<String>) -> Self {
        self.owner = Owner::Id(id.into());
        self
    }

    /// Set the path filter.
    ///
    /// Defaults to selecting every path.
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    /// Add an output destination.
    ///
    /// Multiple outputs can be added; each flushed batch goes to all of them.
    pub fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    /// Set the trigger for the update (sampling) signal.
    #[cfg(feature = "tokio")]
    pub fn update_trigger(mut self, trigger: Trigger) -> Self {
        self.update = Some(trigger);
        self
    }

    /// Set the trigger for the write (flush) signal.
    #[cfg(feature = "tokio")]
    pub fn write_trigger(mut self, trigger: Trigger) -> Self {
        self.write = Some(trigger);
        self
    }

    /// Sample every `period`.
    ///
    /// Defaults to 1 second if no update trigger is set.
    #[cfg(feature = "tokio")]
    pub fn update_interval(self, period: Duration) -> Self {
        self.update_trigger(Trigger::interval(period))
    }

    /// Flush every `period`.
    ///
    /// Defaults to 10 seconds if no write trigger is set.
    #[cfg(feature = "tokio")]
    pub fn write_interval(self, period: Duration) -> Self {
        self.write_trigger(Trigger::interval(period))
    }

    /// Build the batcher.
    pub fn build(self) -> Batcher {
        let inner = Inner {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(SharedStore::default())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            owner: self.owner,
            filter: self.filter,
            accumulator: Accumulator::new(),
            outputs: self.outputs,
        };

        #[cfg(feature = "tokio")]
        let triggers = (
            self.update.unwrap_or_else(|| {
                Trigger::interval(Duration::from_millis(DEFAULT_UPDATE_INTERVAL_MS))
            }),
            self.write.unwrap_or_else(|| {
                Trigger::interval(Duration::from_millis(DEFAULT_WRITE_INTERVAL_MS))
            }),
        );

        Batcher {
            inner: Arc::new(inner),
            #[cfg(feature = "tokio")]
            triggers: Mutex::new(Some(triggers)),
        }
    }
}

/// Handle for a started batcher.
///
/// Dropping the handle also stops the batcher, without waiting for it.
#[cfg(feature = "tokio")]
#[derive(Debug)]
pub struct BatcherHandle {
    stop_tx: tokio::sync::watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

#[cfg(feature = "tokio")]
impl BatcherHandle {
    /// Stop reacting to triggers.
    ///
    /// Waits for a signal already being handled to finish; once this
    /// returns, no further capture or flush happens through the triggers.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "batcher task ended abnormally");
        }
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
