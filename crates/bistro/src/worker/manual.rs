use crate::{Consumer, Kitchen};
use futures::future::{self, BoxFuture, FutureExt};

/// Interactive consumption: no background waiters.
///
/// Dishes stay on the counter until someone picks one up with
/// [`Restaurant::try_consume`] and carries it to a table with
/// [`Restaurant::deliver`]. A full counter therefore stalls the cooks until
/// the next pick-up.
///
/// [`Restaurant::try_consume`]: crate::Restaurant::try_consume
/// [`Restaurant::deliver`]: crate::Restaurant::deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Manual;

impl Consumer for Manual {
    fn workers(&self) -> usize {
        0
    }

    fn run(&self, _worker_id: usize, _kitchen: Kitchen) -> BoxFuture<'static, ()> {
        future::ready(()).boxed()
    }
}
