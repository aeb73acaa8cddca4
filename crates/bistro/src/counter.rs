//! The bounded hand-off buffer between cooks and waiters.
//!
//! The [`Counter`] is a fixed-capacity FIFO of [`Dish`]es built from a
//! `parking_lot` mutex around a `VecDeque` plus two Tokio semaphores: `slots`
//! counts free places and `ready` counts queued dishes. A blocking push waits
//! on `slots`, a blocking pop waits on `ready`, and both race the caller's
//! [`CancellationToken`] so no worker can hang past shutdown.
//!
//! Every queued dish holds one forgotten `slots` permit until it is popped,
//! which keeps `0 <= occupancy <= capacity` without any extra bookkeeping.

use crate::{Dish, Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use thiserror::Error;
use tokio::sync::{Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;

/// Outcome of a blocking counter operation that did not complete.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterError {
    /// The shutdown token fired while the caller was waiting.
    #[error("Counter operation cancelled")]
    Cancelled,

    /// The counter was closed; no further pushes or pops are accepted.
    #[error("Counter is closed")]
    Closed,
}

/// A non-blocking push that was refused. The dish is handed back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TryPushError {
    #[error("Counter is full")]
    Full(Dish),

    #[error("Counter is closed")]
    Closed(Dish),
}

impl TryPushError {
    /// Recovers the dish that could not be placed.
    pub fn into_inner(self) -> Dish {
        match self {
            Self::Full(dish) | Self::Closed(dish) => dish,
        }
    }
}

/// A fixed-capacity, cancellation-aware FIFO of dishes.
pub struct Counter {
    dishes: Mutex<VecDeque<Dish>>,
    slots: Semaphore,
    ready: Semaphore,
    capacity: usize,
}

impl Counter {
    /// Creates an empty counter with room for `capacity` dishes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `capacity` is zero or exceeds what
    /// a Tokio semaphore can track.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::invalid_config(
                "counter capacity must be greater than 0",
            ));
        }
        if capacity > Semaphore::MAX_PERMITS {
            return Err(Error::invalid_config(format!(
                "counter capacity {capacity} exceeds {}",
                Semaphore::MAX_PERMITS
            )));
        }

        Ok(Self {
            dishes: Mutex::new(VecDeque::with_capacity(capacity)),
            slots: Semaphore::new(capacity),
            ready: Semaphore::new(0),
            capacity,
        })
    }

    /// Places a dish on the counter, waiting for a free slot.
    ///
    /// # Errors
    ///
    /// - [`CounterError::Cancelled`] if `shutdown` fires first. A token that
    ///   is already cancelled wins even when a slot is free.
    /// - [`CounterError::Closed`] if the counter is closed.
    ///
    /// In both cases the dish is dropped.
    pub async fn push(&self, dish: Dish, shutdown: &CancellationToken) -> Result<(), CounterError> {
        let permit = tokio::select! {
            biased;
            () = shutdown.cancelled() => return Err(CounterError::Cancelled),
            permit = self.slots.acquire() => permit.map_err(|_| CounterError::Closed)?,
        };
        permit.forget();
        self.enqueue(dish);
        Ok(())
    }

    /// Places a dish on the counter only if a slot is free right now.
    ///
    /// # Errors
    ///
    /// Hands the dish back as [`TryPushError::Full`] or
    /// [`TryPushError::Closed`].
    pub fn try_push(&self, dish: Dish) -> Result<(), TryPushError> {
        match self.slots.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.enqueue(dish);
                Ok(())
            }
            Err(TryAcquireError::NoPermits) => Err(TryPushError::Full(dish)),
            Err(TryAcquireError::Closed) => Err(TryPushError::Closed(dish)),
        }
    }

    /// Takes the oldest dish, waiting until one is available.
    ///
    /// # Errors
    ///
    /// - [`CounterError::Cancelled`] if `shutdown` fires first.
    /// - [`CounterError::Closed`] if the counter is closed.
    pub async fn pop(&self, shutdown: &CancellationToken) -> Result<Dish, CounterError> {
        let permit = tokio::select! {
            biased;
            () = shutdown.cancelled() => return Err(CounterError::Cancelled),
            permit = self.ready.acquire() => permit.map_err(|_| CounterError::Closed)?,
        };
        permit.forget();
        self.dequeue().ok_or(CounterError::Closed)
    }

    /// Takes the oldest dish if one is queued right now.
    ///
    /// Returns `None` when the counter is empty or closed.
    pub fn try_pop(&self) -> Option<Dish> {
        let permit = self.ready.try_acquire().ok()?;
        permit.forget();
        self.dequeue()
    }

    /// Number of dishes currently queued.
    pub fn occupancy(&self) -> usize {
        self.dishes.lock().len()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.occupancy() == 0
    }

    pub fn is_full(&self) -> bool {
        self.occupancy() == self.capacity
    }

    /// Copies out the queued dishes, oldest first.
    pub fn snapshot(&self) -> Vec<Dish> {
        self.dishes.lock().iter().cloned().collect()
    }

    /// Rejects every later push and pop, and wakes blocked callers with
    /// [`CounterError::Closed`]. Dishes still queued are dropped with the
    /// counter.
    pub fn close(&self) {
        self.slots.close();
        self.ready.close();
    }

    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }

    // Caller must already own a forgotten `slots` permit.
    fn enqueue(&self, dish: Dish) {
        self.dishes.lock().push_back(dish);
        self.ready.add_permits(1);
    }

    // Caller must already own a forgotten `ready` permit.
    fn dequeue(&self) -> Option<Dish> {
        let dish = self.dishes.lock().pop_front();
        if dish.is_some() {
            self.slots.add_permits(1);
        }
        dish
    }
}

impl core::fmt::Debug for Counter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Counter")
            .field("occupancy", &self.occupancy())
            .field("capacity", &self.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}
