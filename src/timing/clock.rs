use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use crate::timing::calculator::now_seconds;

/// One second-granularity "now" shared by every row.
///
/// Consumers subscribe instead of polling the wall clock themselves, so all
/// rows rendered for a tick see the same value. The ticker task is owned by
/// this value and released on `stop()` or drop.
pub struct SharedClock {
    tx: Arc<watch::Sender<i64>>,
    period: Duration,
    ticker: Option<JoinHandle<()>>,
}

/// Read-only view of a `SharedClock`, cheap to clone into owners of race lists
#[derive(Debug, Clone)]
pub struct ClockReader {
    rx: watch::Receiver<i64>,
}

impl ClockReader {
    pub fn now(&self) -> i64 {
        *self.rx.borrow()
    }
}

impl SharedClock {
    pub fn new(period: Duration) -> Self {
        Self::starting_at(now_seconds(), period)
    }

    /// Clock seeded with an explicit value and not yet ticking
    pub fn starting_at(seconds: i64, period: Duration) -> Self {
        let (tx, _rx) = watch::channel(seconds);
        Self {
            tx: Arc::new(tx),
            period,
            ticker: None,
        }
    }

    /// Spawn the periodic ticker. Returns false if one is already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }

        let tx = Arc::clone(&self.tx);
        let period = self.period;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                publish(&tx, now_seconds());
            }
        }));

        debug!("Clock started ({:?} period)", self.period);
        true
    }

    /// Release the ticker. Returns true only for the call that released it.
    pub fn stop(&mut self) -> bool {
        match self.ticker.take() {
            Some(handle) => {
                handle.abort();
                debug!("Clock stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.tx.subscribe()
    }

    pub fn reader(&self) -> ClockReader {
        ClockReader {
            rx: self.tx.subscribe(),
        }
    }

    #[allow(dead_code)]
    pub fn now(&self) -> i64 {
        *self.tx.borrow()
    }

    /// Push a tick by hand. The value may move backward.
    #[allow(dead_code)]
    pub fn set(&self, seconds: i64) {
        publish(&self.tx, seconds);
    }
}

impl Drop for SharedClock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Only a changed second wakes subscribers
fn publish(tx: &watch::Sender<i64>, seconds: i64) {
    tx.send_if_modified(|current| {
        if *current == seconds {
            return false;
        }
        *current = seconds;
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_share_one_value() {
        let clock = SharedClock::starting_at(1_000, Duration::from_secs(1));
        let first = clock.subscribe();
        let second = clock.reader();

        clock.set(1_001);
        assert_eq!(*first.borrow(), 1_001);
        assert_eq!(second.now(), 1_001);
        assert_eq!(clock.now(), 1_001);
    }

    #[test]
    fn test_manual_tick_can_move_backward() {
        let clock = SharedClock::starting_at(1_000, Duration::from_secs(1));
        let reader = clock.reader();
        clock.set(990);
        assert_eq!(reader.now(), 990);
    }

    #[test]
    fn test_same_second_does_not_notify() {
        let clock = SharedClock::starting_at(1_000, Duration::from_secs(1));
        let rx = clock.subscribe();

        clock.set(1_000);
        assert!(!rx.has_changed().unwrap());

        clock.set(1_001);
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_start_stop_releases_ticker_once() {
        let mut clock = SharedClock::starting_at(0, Duration::from_millis(10));
        assert!(!clock.is_running());

        assert!(clock.start());
        assert!(!clock.start());
        assert!(clock.is_running());

        assert!(clock.stop());
        assert!(!clock.stop());
        assert!(!clock.is_running());

        // Can be re-activated after teardown
        assert!(clock.start());
        assert!(clock.stop());
    }

    #[tokio::test]
    async fn test_ticker_publishes_wall_clock() {
        let mut clock = SharedClock::starting_at(0, Duration::from_millis(10));
        let mut rx = clock.subscribe();
        clock.start();

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();

        let seen = *rx.borrow();
        assert!((seen - now_seconds()).abs() <= 1);
        clock.stop();
    }
}
