use crate::Kitchen;
use core::time::Duration;
use rand::Rng;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Seats new parties once per `period` until shutdown.
///
/// On each tick every empty table is seated with chance `probability`, with a
/// party of `1..=max_party` customers drawn uniformly.
pub async fn arrivals_loop(kitchen: Kitchen, period: Duration, probability: f64, max_party: usize) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Arrival generator started (every {period:?}, p = {probability})");

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = kitchen.shutdown_token().cancelled() => break,
            _ = ticker.tick() => {}
        }

        let _seated = seat_arrivals(&kitchen, probability, max_party);
        #[cfg(feature = "tracing")]
        {
            if _seated > 0 {
                tracing::debug!("{_seated} customers arrived");
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Arrival generator stopped");
}

/// Runs one round of arrivals. Returns the number of customers seated.
pub fn seat_arrivals(kitchen: &Kitchen, probability: f64, max_party: usize) -> usize {
    let mut rng = rand::rng();
    kitchen.tables().fill_empty(|| {
        if max_party > 0 && rng.random_bool(probability) {
            rng.random_range(1..=max_party)
        } else {
            0
        }
    })
}
