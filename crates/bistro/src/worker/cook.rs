use crate::{Dish, Interrupted, Kitchen, LatencyRange, Producer, RestaurantConfig};
use core::time::Duration;
use futures::{FutureExt, future::BoxFuture};

/// The default producer: a brigade of cooks that only cook while someone is
/// waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cooks {
    count: usize,
    cook_time: LatencyRange,
    idle_poll: Duration,
}

impl Cooks {
    pub const fn new(count: usize, cook_time: LatencyRange, idle_poll: Duration) -> Self {
        Self {
            count,
            cook_time,
            idle_poll,
        }
    }

    pub fn from_config(config: &RestaurantConfig) -> Self {
        Self::new(
            config.cooks,
            config.timings.cook_time,
            config.timings.idle_poll,
        )
    }
}

impl Producer for Cooks {
    fn workers(&self) -> usize {
        self.count
    }

    fn run(&self, worker_id: usize, kitchen: Kitchen) -> BoxFuture<'static, ()> {
        cook_loop(worker_id, kitchen, self.cook_time, self.idle_poll).boxed()
    }
}

/// A single cook's shift.
///
/// Each pass through the loop:
///
/// 1. exits if shutdown has been signalled;
/// 2. with no demand (nobody waiting, or the kitchen paused), rests for
///    `idle_poll` and checks again, never cooking speculatively;
/// 3. otherwise cooks for a duration drawn from `cook_time`;
/// 4. places the dish on the counter, waiting for space if it is full.
///
/// Pausing the kitchen throws away a dish that is still cooking or waiting
/// for space, and the cook goes back to idling. Shutdown during any wait ends
/// the shift.
pub async fn cook_loop(
    cook_id: usize,
    kitchen: Kitchen,
    cook_time: LatencyRange,
    idle_poll: Duration,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Cook {cook_id} started");

    let mut next_dish = 0_u64;

    loop {
        if kitchen.is_shutting_down() {
            break;
        }

        if !kitchen.has_demand() {
            if kitchen.sleep(idle_poll).await.is_err() {
                break;
            }
            continue;
        }

        let latency = cook_time.sample();
        let cooked = match kitchen.cook(latency).await {
            Ok(()) => {
                let dish = Dish::new(next_dish, cook_id);
                next_dish += 1;
                kitchen.place(dish).await
            }
            Err(e) => Err(e),
        };

        match cooked {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "Cook {cook_id} placed dish #{} after {:.1}s",
                    next_dish - 1,
                    latency.as_secs_f64()
                );
            }
            Err(Interrupted::Paused) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Cook {cook_id} dropped a dish: kitchen paused");
            }
            Err(Interrupted::Shutdown) => break,
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Cook {cook_id} finished shift");
}
