use crate::{Counter, Dish, Metrics, TableRegistry};
use core::time::Duration;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Returned by a wait that was cut short by the shutdown signal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Shutdown signalled")]
pub struct Cancelled;

/// Why a cook stopped before the dish reached the counter.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    #[error("Shutdown signalled")]
    Shutdown,
    #[error("Kitchen paused")]
    Paused,
}

/// The shared state every background task works against.
///
/// A `Kitchen` is a cheap handle: cloning it clones the `Arc`s, not the
/// state. The counter, the table registry and the metrics each keep their own
/// lock, so holding one never blocks access to another.
#[derive(Debug, Clone)]
pub struct Kitchen {
    counter: Arc<Counter>,
    tables: Arc<TableRegistry>,
    metrics: Arc<Metrics>,
    shutdown: CancellationToken,
}

impl Kitchen {
    pub fn new(
        counter: Arc<Counter>,
        tables: Arc<TableRegistry>,
        metrics: Arc<Metrics>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            counter,
            tables,
            metrics,
            shutdown,
        }
    }

    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// The demand predicate: the kitchen is not paused and at least one table
    /// is waiting for a dish.
    ///
    /// The pause flag and the tables are read one after the other, never
    /// under both locks at once.
    pub fn has_demand(&self) -> bool {
        !self.metrics.is_paused() && self.tables.has_waiting()
    }

    /// Sleeps for `duration` unless shutdown is signalled first.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the shutdown token fired (or had already
    /// fired) before the duration elapsed.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(Cancelled),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Spends `duration` on a dish, giving up the moment the kitchen is paused
    /// or shutdown is signalled.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted::Shutdown`] or [`Interrupted::Paused`]; shutdown
    /// wins if both are already true.
    pub async fn cook(&self, duration: Duration) -> Result<(), Interrupted> {
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(Interrupted::Shutdown),
            () = self.metrics.until_paused() => Err(Interrupted::Paused),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Places a finished dish on the counter, waiting for space if it is
    /// full, and records it as produced.
    ///
    /// A pause while waiting for space throws the dish away, so nothing new
    /// reaches the counter once the kitchen is paused.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted::Shutdown`] if shutdown is signalled or the
    /// counter is closed, and [`Interrupted::Paused`] if the kitchen is
    /// paused first.
    pub async fn place(&self, dish: Dish) -> Result<(), Interrupted> {
        let placed = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Err(Interrupted::Shutdown),
            () = self.metrics.until_paused() => return Err(Interrupted::Paused),
            placed = self.counter.push(dish, &self.shutdown) => placed,
        };
        placed.map_err(|_| Interrupted::Shutdown)?;
        self.metrics.record_produced();
        Ok(())
    }
}
