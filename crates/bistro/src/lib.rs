mod config;
mod counter;
mod dish;
mod error;
mod kitchen;
mod metrics;
mod monitor;
mod restaurant;
mod table;
mod worker;

pub use crate::config::*;
pub use crate::counter::*;
pub use crate::dish::*;
pub use crate::error::*;
pub use crate::kitchen::*;
pub use crate::metrics::*;
pub use crate::monitor::*;
pub use crate::restaurant::*;
pub use crate::table::*;
pub use crate::worker::*;
