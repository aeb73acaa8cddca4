use crate::server::telemetry::record_state;
use bistro::{Lifecycle, Restaurant, RestaurantState, TableSnapshot};
use core::time::Duration;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Logs a status line every `every` and feeds the metric instruments, until
/// the restaurant begins shutting down.
pub async fn report_loop(restaurant: Arc<Restaurant>, every: Duration) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut previous = RestaurantState::default();

    loop {
        tokio::select! {
            biased;
            () = restaurant.closing() => break,
            _ = ticker.tick() => {}
        }

        let state = restaurant.state();
        record_state(&previous, &state);
        tracing::info!(
            customers = state.active_customers,
            produced = state.produced_total,
            served = state.served_total,
            lost = state.lost_customers,
            paused = state.paused,
            "Counter {}/{}",
            state.occupancy,
            state.capacity
        );
        previous = state;
    }

    // Account for whatever happened since the last tick.
    record_state(&previous, &restaurant.state());
}

/// Everything worth knowing once the restaurant has closed.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub lifecycle: Lifecycle,
    pub uptime_secs: f64,
    pub state: RestaurantState,
    pub tables: Vec<TableSnapshot>,
}

impl Summary {
    pub fn collect(restaurant: &Restaurant, uptime: Duration) -> Self {
        Self {
            lifecycle: restaurant.lifecycle(),
            uptime_secs: uptime.as_secs_f64(),
            state: restaurant.state(),
            tables: restaurant.tables(),
        }
    }

    pub fn log(&self) {
        let s = &self.state;
        tracing::info!(
            "Closed after {:.1}s: {} dishes produced, {} served, {} customers lost, {} still seated, {} dishes left on the counter",
            self.uptime_secs,
            s.produced_total,
            s.served_total,
            s.lost_customers,
            s.active_customers,
            s.occupancy
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro::RestaurantConfig;

    fn restaurant() -> Arc<Restaurant> {
        let config = RestaurantConfig {
            waiters: 1,
            arrival_probability: 0.0,
            ..Default::default()
        };
        Arc::new(Restaurant::new(config).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn report_loop_exits_on_close() {
        let restaurant = restaurant();
        restaurant.start().unwrap();
        restaurant.add_customers(2);

        let reporter = tokio::spawn(report_loop(
            Arc::clone(&restaurant),
            Duration::from_millis(500),
        ));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!reporter.is_finished());

        restaurant.close().await;
        tokio::time::timeout(Duration::from_millis(10), reporter)
            .await
            .expect("reporter should stop with the restaurant")
            .unwrap();
    }

    #[tokio::test]
    async fn summary_serializes_to_json() {
        let restaurant = restaurant();
        restaurant.seat(2, 3).unwrap();
        restaurant.close().await;

        let summary = Summary::collect(&restaurant, Duration::from_millis(1500));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["lifecycle"], "Stopped");
        assert_eq!(json["uptime_secs"], 1.5);
        assert_eq!(json["state"]["active_customers"], 3);
        assert_eq!(json["state"]["capacity"], 5);
        assert_eq!(json["tables"].as_array().unwrap().len(), 8);
        assert_eq!(json["tables"][2]["active_customers"], 3);
    }
}
