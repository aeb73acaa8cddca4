use core::fmt;

/// Where a [`Restaurant`](crate::Restaurant) is in its run.
///
/// `Created -> Running -> Stopping -> Stopped`. A restaurant that is closed
/// before it was started goes straight from `Created` to `Stopping`. The
/// pause switch is orthogonal to these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifecycle {
    /// Constructed; no task has been launched.
    Created,
    /// Background tasks are running.
    Running,
    /// Shutdown was signalled; waiting for tasks to exit.
    Stopping,
    /// Every task exited and the counter is closed. Terminal.
    Stopped,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Created => write!(f, "created"),
            Lifecycle::Running => write!(f, "running"),
            Lifecycle::Stopping => write!(f, "stopping"),
            Lifecycle::Stopped => write!(f, "stopped"),
        }
    }
}
