use crate::Kitchen;
use futures::future::BoxFuture;

/// A strategy for filling the counter.
///
/// The restaurant asks for [`workers`](Producer::workers) tasks at start-up
/// and spawns the future returned by [`run`](Producer::run) for each one,
/// numbering workers from 1. A worker must return once the kitchen's shutdown
/// token fires, and must race every wait against it.
pub trait Producer: Send + Sync + 'static {
    /// Number of producer tasks to launch.
    fn workers(&self) -> usize;

    /// Runs one producer until shutdown.
    fn run(&self, worker_id: usize, kitchen: Kitchen) -> BoxFuture<'static, ()>;
}

/// A strategy for draining the counter.
///
/// Same contract as [`Producer`]. A strategy with zero workers leaves the
/// counter to be drained interactively through
/// [`Restaurant::try_consume`](crate::Restaurant::try_consume).
pub trait Consumer: Send + Sync + 'static {
    /// Number of consumer tasks to launch.
    fn workers(&self) -> usize;

    /// Runs one consumer until shutdown.
    fn run(&self, worker_id: usize, kitchen: Kitchen) -> BoxFuture<'static, ()>;
}
