use core::time::Duration;
use tokio::time::Instant;

/// A prepared dish: the unit of work handed from cooks to waiters.
///
/// Dishes are immutable once created. Ownership moves exclusively from the
/// cook that prepared it, into the [`Counter`], and out to whichever consumer
/// pops it; `Clone` exists only so snapshots can copy queued dishes out.
///
/// Ids are monotonic per cook, so `(cook_id, id)` is unique across a run but
/// carries no ordering between cooks.
///
/// [`Counter`]: crate::Counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dish {
    id: u64,
    cook_id: usize,
    created_at: Instant,
}

impl Dish {
    /// Creates a dish stamped with the current time.
    pub fn new(id: u64, cook_id: usize) -> Self {
        Self {
            id,
            cook_id,
            created_at: Instant::now(),
        }
    }

    /// The id local to the cook that produced this dish.
    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn cook_id(&self) -> usize {
        self.cook_id
    }

    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    /// How long ago the dish left the stove.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
