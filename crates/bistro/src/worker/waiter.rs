use crate::{Consumer, Kitchen, RestaurantConfig};
use core::time::Duration;
use futures::{FutureExt, future::BoxFuture};

/// The automatic consumer: waiters that carry every dish off the counter as
/// soon as it appears.
///
/// Automatic waiters only count dishes as served; they do not seat dishes at
/// particular tables. Table-level delivery is the interactive path through
/// [`Restaurant::deliver`](crate::Restaurant::deliver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waiters {
    count: usize,
    delivery_time: Duration,
}

impl Waiters {
    pub const fn new(count: usize, delivery_time: Duration) -> Self {
        Self {
            count,
            delivery_time,
        }
    }

    pub fn from_config(config: &RestaurantConfig) -> Self {
        Self::new(config.waiters, config.timings.delivery_time)
    }
}

impl Consumer for Waiters {
    fn workers(&self) -> usize {
        self.count
    }

    fn run(&self, worker_id: usize, kitchen: Kitchen) -> BoxFuture<'static, ()> {
        waiter_loop(worker_id, kitchen, self.delivery_time).boxed()
    }
}

/// A single waiter's shift: pop, carry for `delivery_time`, count as served.
///
/// Shutdown while waiting on the counter or while carrying a dish ends the
/// shift without touching the metrics.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub async fn waiter_loop(waiter_id: usize, kitchen: Kitchen, delivery_time: Duration) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Waiter {waiter_id} started");

    loop {
        let dish = match kitchen.counter().pop(kitchen.shutdown_token()).await {
            Ok(dish) => dish,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Waiter {waiter_id} stopped waiting: {_e}");
                break;
            }
        };

        if kitchen.sleep(delivery_time).await.is_err() {
            break;
        }

        kitchen.metrics().record_served();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Waiter {waiter_id} served dish #{} from cook {}",
            dish.id(),
            dish.cook_id()
        );
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Waiter {waiter_id} finished shift");
}
