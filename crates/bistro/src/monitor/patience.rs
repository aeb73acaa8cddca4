use crate::Kitchen;
use core::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Checks every table once per `tick` until shutdown, sending away parties
/// that have run out of patience.
///
/// The first check happens one full tick after the monitor starts.
pub async fn patience_loop(kitchen: Kitchen, tick: Duration) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Patience monitor started (tick {tick:?})");

    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = kitchen.shutdown_token().cancelled() => break,
            _ = ticker.tick() => {}
        }
        expire_tables(&kitchen);
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Patience monitor stopped");
}

/// Empties every table that has waited past its patience threshold and adds
/// its customers to the lost count. Returns the number of customers lost.
///
/// Tables are reset under the registry lock; the loss is recorded afterwards
/// under the metrics lock, so the two locks are never held together.
pub fn expire_tables(kitchen: &Kitchen) -> usize {
    let expired = kitchen.tables().expire_impatient();
    let lost = expired
        .iter()
        .fold(0, |total: usize, e| total.saturating_add(e.customers));

    if lost > 0 {
        kitchen.metrics().record_lost(lost);
    }

    #[cfg(feature = "tracing")]
    {
        for e in &expired {
            tracing::info!(
                table = e.table,
                customers = e.customers,
                "Customers left without being served"
            );
        }
    }

    lost
}
