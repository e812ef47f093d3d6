//! Trigger ports that drive the update and write signals.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};

type Ack = Option<oneshot::Sender<()>>;

/// A source of signals for one side of the batcher.
///
/// Either a periodic timer or a manual port fired through a
/// [`TriggerHandle`].
///
/// # Example
///
/// ```rust
/// use batchpoints_sdk::Trigger;
/// use std::time::Duration;
///
/// let every_second = Trigger::interval(Duration::from_secs(1));
/// let (manual, handle) = Trigger::manual();
/// ```
#[derive(Debug)]
pub struct Trigger {
    kind: TriggerKind,
}

#[derive(Debug)]
enum TriggerKind {
    Interval(Duration),
    Manual(mpsc::UnboundedReceiver<Ack>),
}

impl Trigger {
    /// Fire every `period`, starting one period after the batcher starts.
    ///
    /// A zero period is raised to one millisecond.
    pub fn interval(period: Duration) -> Self {
        Self {
            kind: TriggerKind::Interval(period.max(Duration::from_millis(1))),
        }
    }

    /// A trigger fired by hand, plus the handle that fires it.
    pub fn manual() -> (Self, TriggerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                kind: TriggerKind::Manual(rx),
            },
            TriggerHandle { tx },
        )
    }

    /// The period of an interval trigger.
    pub fn period(&self) -> Option<Duration> {
        match &self.kind {
            TriggerKind::Interval(period) => Some(*period),
            TriggerKind::Manual(_) => None,
        }
    }

    /// Turn the trigger into a live port. Must be called inside a runtime.
    pub(crate) fn into_port(self) -> Port {
        match self.kind {
            TriggerKind::Interval(period) => {
                let mut interval = tokio::time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Port::Interval(interval)
            }
            TriggerKind::Manual(rx) => Port::Manual(rx),
        }
    }
}

/// A running trigger.
pub(crate) enum Port {
    Interval(Interval),
    Manual(mpsc::UnboundedReceiver<Ack>),
}

impl Port {
    /// Wait for the next signal. A manual port whose handles are all gone
    /// never fires again.
    pub(crate) async fn next(&mut self) -> Signal {
        match self {
            Port::Interval(interval) => {
                interval.tick().await;
                Signal { ack: None }
            }
            Port::Manual(rx) => match rx.recv().await {
                Some(ack) => Signal { ack },
                None => std::future::pending().await,
            },
        }
    }
}

/// One delivered signal. Acknowledged once the batcher has handled it.
pub(crate) struct Signal {
    ack: Ack,
}

impl Signal {
    pub(crate) fn done(self) {
        if let Some(ack) = self.ack {
            let _ = ack.send(());
        }
    }
}

/// Fires a manual [`Trigger`].
///
/// Cloning the handle gives another way to fire the same trigger.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    tx: mpsc::UnboundedSender<Ack>,
}

impl TriggerHandle {
    /// Fire the trigger and wait until the batcher has handled it.
    ///
    /// Returns `false` if the batcher stopped before handling the signal.
    pub async fn fire(&self) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Some(ack_tx)).is_err() {
            return false;
        }
        ack_rx.await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_keeps_period() {
        let trigger = Trigger::interval(Duration::from_millis(250));
        assert_eq!(trigger.period(), Some(Duration::from_millis(250)));

        let zero = Trigger::interval(Duration::ZERO);
        assert_eq!(zero.period(), Some(Duration::from_millis(1)));

        let (manual, _handle) = Trigger::manual();
        assert_eq!(manual.period(), None);
    }

    #[tokio::test]
    async fn manual_fire_resolves_after_done() {
        let (trigger, handle) = Trigger::manual();
        let mut port = trigger.into_port();

        let listener = tokio::spawn(async move {
            let signal = port.next().await;
            signal.done();
            port
        });

        assert!(handle.fire().await);
        let _port = listener.await.unwrap();
    }

    #[tokio::test]
    async fn fire_fails_once_port_is_dropped() {
        let (trigger, handle) = Trigger::manual();
        drop(trigger);

        assert!(!handle.fire().await);
    }

    #[tokio::test]
    async fn dropped_signal_reports_unhandled() {
        let (trigger, handle) = Trigger::manual();
        let mut port = trigger.into_port();

        let listener = tokio::spawn(async move {
            // received but never acknowledged
            let _signal = port.next().await;
        });

        assert!(!handle.fire().await);
        listener.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn interval_waits_one_period_before_first_signal() {
        let mut port = Trigger::interval(Duration::from_secs(1)).into_port();
        let start = Instant::now();

        port.next().await.done();
        assert!(start.elapsed() >= Duration::from_secs(1));

        port.next().await.done();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
