use crate::{Error, Position, Result};
use core::time::Duration;
use rand::Rng;

/// Tables are laid out on a grid this many tables wide.
pub const TABLES_PER_ROW: usize = 4;
/// Position of the first table on the floor.
pub const FIRST_TABLE: Position = Position::new(100.0, 300.0);
/// Horizontal distance between neighbouring tables.
pub const TABLE_SPACING_X: f64 = 200.0;
/// Vertical distance between table rows.
pub const TABLE_SPACING_Y: f64 = 150.0;

/// An inclusive range of simulated work durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyRange {
    pub min: Duration,
    pub max: Duration,
}

impl LatencyRange {
    pub const fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// A range that always yields `latency`.
    pub const fn fixed(latency: Duration) -> Self {
        Self::new(latency, latency)
    }

    /// Draws a duration uniformly from the range.
    pub fn sample(&self) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

/// Every timer the service runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    /// How long a cook spends on one dish.
    pub cook_time: LatencyRange,
    /// How long an automatic waiter spends carrying one dish.
    pub delivery_time: Duration,
    /// How long a cook waits before re-checking demand when nobody is
    /// waiting (or the kitchen is paused).
    pub idle_poll: Duration,
    /// How long seated customers wait before leaving unserved.
    pub patience: Duration,
    /// Period of the patience monitor.
    pub patience_tick: Duration,
    /// Period of the arrival generator.
    pub arrival_interval: Duration,
    /// Delay between serving a table and freeing it.
    pub clear_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            cook_time: LatencyRange::new(Duration::from_millis(1500), Duration::from_millis(2500)),
            delivery_time: Duration::from_millis(600),
            idle_poll: Duration::from_millis(500),
            patience: Duration::from_secs(30),
            patience_tick: Duration::from_secs(1),
            arrival_interval: Duration::from_secs(5),
            clear_delay: Duration::from_secs(3),
        }
    }
}

/// Construction parameters for a [`Restaurant`].
///
/// The defaults model a small dining room: a five-dish counter, two cooks,
/// no automatic waiters (dishes are carried by hand through
/// [`Restaurant::try_consume`] and [`Restaurant::deliver`]) and eight tables.
///
/// [`Restaurant`]: crate::Restaurant
/// [`Restaurant::try_consume`]: crate::Restaurant::try_consume
/// [`Restaurant::deliver`]: crate::Restaurant::deliver
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantConfig {
    /// Number of dishes the counter can hold.
    pub counter_capacity: usize,
    /// Number of cook tasks.
    pub cooks: usize,
    /// Number of automatic waiter tasks. Zero selects manual consumption.
    pub waiters: usize,
    /// Number of tables in the dining room.
    pub tables: usize,
    /// Largest party the arrival generator seats at once.
    pub max_party_size: usize,
    /// Chance that an empty table is seated on each arrival tick.
    pub arrival_probability: f64,
    pub timings: Timings,
}

impl Default for RestaurantConfig {
    fn default() -> Self {
        Self {
            counter_capacity: 5,
            cooks: 2,
            waiters: 0,
            tables: 8,
            max_party_size: 3,
            arrival_probability: 0.4,
            timings: Timings::default(),
        }
    }
}

impl RestaurantConfig {
    /// Rejects configurations the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.counter_capacity == 0 {
            return Err(Error::invalid_config(
                "counter capacity must be greater than 0",
            ));
        }
        if self.cooks == 0 {
            return Err(Error::invalid_config("at least one cook is required"));
        }
        if self.tables == 0 {
            return Err(Error::invalid_config("at least one table is required"));
        }
        if self.max_party_size == 0 {
            return Err(Error::invalid_config(
                "max party size must be greater than 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.arrival_probability) {
            return Err(Error::invalid_config(format!(
                "arrival probability {} is outside [0, 1]",
                self.arrival_probability
            )));
        }

        let t = &self.timings;
        if t.cook_time.min > t.cook_time.max {
            return Err(Error::invalid_config(format!(
                "cook time minimum {:?} exceeds maximum {:?}",
                t.cook_time.min, t.cook_time.max
            )));
        }
        for (name, value) in [
            ("idle poll", t.idle_poll),
            ("patience", t.patience),
            ("patience tick", t.patience_tick),
            ("arrival interval", t.arrival_interval),
        ] {
            if value.is_zero() {
                return Err(Error::invalid_config(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        Ok(())
    }

    /// Floor positions of every table, in registry order.
    pub fn table_layout(&self) -> Vec<Position> {
        (0..self.tables)
            .map(|i| {
                let col = (i % TABLES_PER_ROW) as f64;
                let row = (i / TABLES_PER_ROW) as f64;
                Position::new(
                    FIRST_TABLE.x + col * TABLE_SPACING_X,
                    FIRST_TABLE.y + row * TABLE_SPACING_Y,
                )
            })
            .collect()
    }
}
