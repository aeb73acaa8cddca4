use parking_lot::RwLock;
use tokio::sync::watch;

/// A point-in-time view of the service for presentation.
///
/// Built from three independent snapshots (metrics, tables, counter), each
/// copied out under its own lock, so every individual field is consistent
/// even while the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestaurantState {
    pub active_customers: usize,
    pub produced_total: u64,
    pub served_total: u64,
    pub lost_customers: u64,
    pub occupancy: usize,
    pub capacity: usize,
    pub paused: bool,
}

/// Running totals plus the pause switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub produced_total: u64,
    pub served_total: u64,
    pub lost_customers: u64,
    pub paused: bool,
}

/// The metrics domain: every counter behind one reader/writer lock, plus the
/// pause switch.
///
/// Pausing wakes every [`Metrics::until_paused`] waiter at once.
#[derive(Debug)]
pub struct Metrics {
    tally: RwLock<Tally>,
    paused: watch::Sender<bool>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            tally: RwLock::default(),
            paused: watch::Sender::new(false),
        }
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_produced(&self) {
        let mut tally = self.tally.write();
        tally.produced_total = tally.produced_total.saturating_add(1);
    }

    pub fn record_served(&self) {
        let mut tally = self.tally.write();
        tally.served_total = tally.served_total.saturating_add(1);
    }

    pub fn record_lost(&self, customers: usize) {
        let mut tally = self.tally.write();
        tally.lost_customers = tally.lost_customers.saturating_add(customers as u64);
    }

    /// Flips the pause switch and returns the new value.
    pub fn toggle_pause(&self) -> bool {
        let mut paused = false;
        self.paused.send_modify(|p| {
            *p = !*p;
            paused = *p;
        });
        paused
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Completes as soon as the kitchen is paused (immediately if it already
    /// is).
    pub async fn until_paused(&self) {
        let mut rx = self.paused.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|paused| *paused).await;
    }

    pub fn snapshot(&self) -> Tally {
        Tally {
            paused: self.is_paused(),
            ..*self.tally.read()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_toggles() {
        let metrics = Metrics::new();
        metrics.record_produced();
        metrics.record_produced();
        metrics.record_served();
        metrics.record_lost(3);

        assert!(metrics.toggle_pause());
        assert!(metrics.is_paused());

        assert_eq!(
            metrics.snapshot(),
            Tally {
                produced_total: 2,
                served_total: 1,
                lost_customers: 3,
                paused: true,
            }
        );

        assert!(!metrics.toggle_pause());
    }

    #[tokio::test(start_paused = true)]
    async fn until_paused_wakes_on_the_toggle() {
        let metrics = std::sync::Arc::new(Metrics::new());
        let waiter = tokio::spawn({
            let metrics = metrics.clone();
            async move { metrics.until_paused().await }
        });

        tokio::time::sleep(core::time::Duration::from_secs(1)).await;
        assert!(!waiter.is_finished());

        metrics.toggle_pause();
        waiter.await.unwrap();

        // Already paused: resolves straight away.
        metrics.until_paused().await;
    }

    #[cfg(feature = "serde")]
    #[test]
    fn state_serializes_with_field_names() {
        let state = RestaurantState {
            produced_total: 4,
            capacity: 5,
            ..Default::default()
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["produced_total"], 4);
        assert_eq!(json["capacity"], 5);
        assert_eq!(json["paused"], false);
    }
}
