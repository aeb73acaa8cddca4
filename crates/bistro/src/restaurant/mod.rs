//! The restaurant coordinator.
//!
//! [`Restaurant`] owns the counter, the table registry and the metrics, and
//! is the only public entry point to them. It launches every background task
//! on one [`TaskTracker`] and stops them all with one [`CancellationToken`].
//!
//! ## Shutdown protocol
//!
//! 1. [`Restaurant::close`] moves the lifecycle to `Stopping` and cancels the
//!    shared token. Every task is parked on a `select!` against that token,
//!    so each one wakes and returns.
//! 2. The tracker is closed and awaited until every launched task, including
//!    pending table clears, has exited.
//! 3. Only then is the counter closed, so no push or pop can ever race a
//!    closed counter.
//! 4. The lifecycle becomes `Stopped` and every other `close` caller is
//!    released.

mod lifecycle;

pub use lifecycle::*;

use crate::{
    Consumer, Cooks, Counter, Dish, Error, Kitchen, Manual, Metrics, Position, Producer,
    RestaurantConfig, RestaurantState, Result, TableRegistry, TableSnapshot, Visit, Waiters,
    arrivals_loop, clear_after, patience_loop,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_util::{
    sync::{CancellationToken, WaitForCancellationFuture},
    task::TaskTracker,
};

struct Control {
    state: Lifecycle,
    runtime: Option<Handle>,
}

/// A demand-gated producer/consumer restaurant.
///
/// Cooks fill a bounded counter only while some table is waiting; dishes are
/// drained either by automatic waiters or by hand through
/// [`try_consume`](Self::try_consume) and [`deliver`](Self::deliver). Parties
/// that wait longer than their patience leave and are counted as lost.
///
/// All operations take `&self`; share the restaurant behind an `Arc` to drive
/// it from several places.
///
/// # Example
///
/// ```no_run
/// use bistro::{Restaurant, RestaurantConfig};
/// use core::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> bistro::Result<()> {
/// let restaurant = Restaurant::new(RestaurantConfig {
///     waiters: 2,
///     ..Default::default()
/// })?;
/// restaurant.start()?;
/// restaurant.add_customers(5);
///
/// tokio::time::sleep(Duration::from_secs(5)).await;
/// println!("{:?}", restaurant.state());
///
/// restaurant.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Restaurant {
    config: RestaurantConfig,
    kitchen: Kitchen,
    producer: Box<dyn Producer>,
    consumer: Box<dyn Consumer>,
    tracker: TaskTracker,
    control: Mutex<Control>,
    stopped: CancellationToken,
}

impl Restaurant {
    /// Builds a restaurant with the default strategies: [`Cooks`] for
    /// production, and [`Waiters`] when `config.waiters > 0` or [`Manual`]
    /// consumption otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is rejected. No
    /// task is launched either way; call [`start`](Self::start) for that.
    pub fn new(config: RestaurantConfig) -> Result<Self> {
        let producer = Cooks::from_config(&config);
        if config.waiters > 0 {
            let consumer = Waiters::from_config(&config);
            Self::with_strategies(config, producer, consumer)
        } else {
            Self::with_strategies(config, producer, Manual)
        }
    }

    /// Builds a restaurant with caller-supplied production and consumption
    /// strategies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is rejected.
    pub fn with_strategies(
        config: RestaurantConfig,
        producer: impl Producer,
        consumer: impl Consumer,
    ) -> Result<Self> {
        config.validate()?;

        let counter = Counter::new(config.counter_capacity)?;
        let tables = TableRegistry::new(config.table_layout(), config.timings.patience);
        let kitchen = Kitchen::new(
            Arc::new(counter),
            Arc::new(tables),
            Arc::new(Metrics::new()),
            CancellationToken::new(),
        );

        Ok(Self {
            config,
            kitchen,
            producer: Box::new(producer),
            consumer: Box::new(consumer),
            tracker: TaskTracker::new(),
            control: Mutex::new(Control {
                state: Lifecycle::Created,
                runtime: None,
            }),
            stopped: CancellationToken::new(),
        })
    }

    /// Launches every producer and consumer worker, the patience monitor and
    /// the arrival generator on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless the restaurant is freshly created.
    /// - [`Error::MissingRuntime`] when called outside a Tokio runtime.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn start(&self) -> Result<()> {
        let mut control = self.control.lock();
        if control.state != Lifecycle::Created {
            return Err(Error::InvalidState {
                operation: "start",
                state: control.state,
            });
        }
        let runtime = Handle::try_current().map_err(|_| Error::MissingRuntime)?;

        let cooks = self.producer.workers();
        for worker_id in 1..=cooks {
            let task = self.producer.run(worker_id, self.kitchen.clone());
            self.tracker.spawn_on(task, &runtime);
        }

        let waiters = self.consumer.workers();
        for worker_id in 1..=waiters {
            let task = self.consumer.run(worker_id, self.kitchen.clone());
            self.tracker.spawn_on(task, &runtime);
        }

        let timings = &self.config.timings;
        self.tracker.spawn_on(
            patience_loop(self.kitchen.clone(), timings.patience_tick),
            &runtime,
        );
        self.tracker.spawn_on(
            arrivals_loop(
                self.kitchen.clone(),
                timings.arrival_interval,
                self.config.arrival_probability,
                self.config.max_party_size,
            ),
            &runtime,
        );

        control.state = Lifecycle::Running;
        control.runtime = Some(runtime);

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Restaurant open: {} cooks, {} waiters, {} tables, counter capacity {}",
            cooks,
            waiters,
            self.config.tables,
            self.config.counter_capacity
        );

        Ok(())
    }

    /// Stops every background task and closes the counter.
    ///
    /// Signals shutdown once, waits until every launched task (workers,
    /// monitors and pending table clears) has exited, then closes the
    /// counter. Closing a restaurant that was never started just marks it
    /// stopped.
    ///
    /// Calling `close` again, or concurrently, is harmless. Every call returns
    /// only once the lifecycle is [`Lifecycle::Stopped`] and the counter is
    /// closed, whichever call did the work.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub async fn close(&self) {
        let first = {
            let mut control = self.control.lock();
            match control.state {
                Lifecycle::Created | Lifecycle::Running => {
                    control.state = Lifecycle::Stopping;
                    true
                }
                Lifecycle::Stopping | Lifecycle::Stopped => false,
            }
        };

        #[cfg(feature = "tracing")]
        {
            if first {
                tracing::info!("Closing restaurant ({} tasks running)", self.tracker.len());
            }
        }

        self.kitchen.shutdown_token().cancel();
        self.tracker.close();
        self.tracker.wait().await;

        if first {
            self.kitchen.counter().close();
            let mut control = self.control.lock();
            control.state = Lifecycle::Stopped;
            control.runtime = None;

            drop(control);
            self.stopped.cancel();

            #[cfg(feature = "tracing")]
            tracing::info!("Restaurant closed");
        } else {
            self.stopped.cancelled().await;
        }
    }

    /// Completes once shutdown has been signalled, i.e. as soon as
    /// [`close`](Self::close) begins (or the restaurant is dropped).
    ///
    /// Background loops driven from outside the restaurant can race this in
    /// a `select!` to stop alongside the built-in tasks.
    pub fn closing(&self) -> WaitForCancellationFuture<'_> {
        self.kitchen.shutdown_token().cancelled()
    }

    /// Seats `count` customers, spreading them across the least busy tables.
    pub fn add_customers(&self, count: usize) {
        self.kitchen.tables().add_customers(count);
        #[cfg(feature = "tracing")]
        tracing::debug!("{count} customers added");
    }

    /// Lets up to `count` customers leave voluntarily. They are not counted
    /// as lost. Returns how many actually left.
    pub fn remove_customers(&self, count: usize) -> usize {
        let removed = self.kitchen.tables().remove_customers(count);
        #[cfg(feature = "tracing")]
        tracing::debug!("{removed} customers left");
        removed
    }

    /// Seats `count` customers at one table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTable`] if there is no such table.
    pub fn seat(&self, table: usize, count: usize) -> Result<()> {
        self.kitchen.tables().seat(table, count)
    }

    /// Flips the pause switch and returns whether production is now paused.
    ///
    /// Pausing stops production at once: a dish still cooking, or cooked and
    /// waiting for counter space, is thrown away. Dishes already on the
    /// counter, waiters, pending table clears and patience timers carry on.
    pub fn toggle_pause(&self) -> bool {
        let paused = self.kitchen.metrics().toggle_pause();
        #[cfg(feature = "tracing")]
        tracing::info!(paused, "Production {}", if paused { "paused" } else { "resumed" });
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.kitchen.metrics().is_paused()
    }

    /// A non-blocking snapshot of the whole service.
    pub fn state(&self) -> RestaurantState {
        let tally = self.kitchen.metrics().snapshot();
        let counter = self.kitchen.counter();
        RestaurantState {
            active_customers: self.kitchen.tables().active_customers(),
            produced_total: tally.produced_total,
            served_total: tally.served_total,
            lost_customers: tally.lost_customers,
            occupancy: counter.occupancy(),
            capacity: counter.capacity(),
            paused: tally.paused,
        }
    }

    /// Copies of every table, in registry order.
    pub fn tables(&self) -> Vec<TableSnapshot> {
        self.kitchen.tables().snapshot()
    }

    /// Copies of the dishes waiting on the counter, oldest first.
    pub fn counter_contents(&self) -> Vec<Dish> {
        self.kitchen.counter().snapshot()
    }

    /// Picks up the oldest dish from the counter, if there is one.
    ///
    /// The caller owns the dish and is expected to hand it to
    /// [`deliver`](Self::deliver). An empty counter is not an error: this
    /// simply returns `None` and changes nothing.
    pub fn try_consume(&self) -> Option<Dish> {
        let dish = self.kitchen.counter().try_pop();
        #[cfg(feature = "tracing")]
        {
            if let Some(dish) = &dish {
                tracing::debug!("Picked up dish #{} from cook {}", dish.id(), dish.cook_id());
            }
        }
        dish
    }

    /// Serves `dish` to the first waiting table (in registry order) strictly
    /// within `max_range` of `position`.
    ///
    /// On success the table is marked served, the served total goes up, a
    /// clear is scheduled for `clear_delay` later, and the table id is
    /// returned.
    ///
    /// # Errors
    ///
    /// Hands the dish back unchanged when no waiting table is in range. No
    /// state changes in that case.
    pub fn deliver(&self, dish: Dish, position: Position, max_range: f64) -> Result<usize, Dish> {
        let Some(visit) = self.kitchen.tables().serve_near(position, max_range) else {
            return Err(dish);
        };

        self.kitchen.metrics().record_served();
        self.schedule_clear(visit);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Dish #{} from cook {} delivered to table {}",
            dish.id(),
            dish.cook_id(),
            visit.table
        );

        Ok(visit.table)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.control.lock().state
    }

    pub fn config(&self) -> &RestaurantConfig {
        &self.config
    }

    /// Number of background tasks that have not exited yet.
    pub fn running_tasks(&self) -> usize {
        self.tracker.len()
    }

    // Spawned under the control lock so it cannot slip past `close`.
    fn schedule_clear(&self, visit: Visit) {
        let control = self.control.lock();
        match (&control.state, &control.runtime) {
            (Lifecycle::Running, Some(runtime)) => {
                self.tracker.spawn_on(
                    clear_after(self.kitchen.clone(), visit, self.config.timings.clear_delay),
                    runtime,
                );
            }
            (_state, _) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "Not scheduling a clear for table {} while {}",
                    visit.table,
                    _state
                );
            }
        }
    }
}

impl Drop for Restaurant {
    fn drop(&mut self) {
        // Tasks hold their own handles to the kitchen; make sure none outlive
        // the restaurant if it was never closed.
        self.kitchen.shutdown_token().cancel();
    }
}

impl core::fmt::Debug for Restaurant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Restaurant")
            .field("lifecycle", &self.lifecycle())
            .field("state", &self.state())
            .field("running_tasks", &self.running_tasks())
            .finish_non_exhaustive()
    }
}
