//! Periodic and one-shot timers that act on the dining room.
//!
//! - [`patience`] - expires tables whose customers waited too long.
//! - [`arrivals`] - seats new parties at empty tables.
//! - [`clear`] - frees a table a short while after it was served.
//!
//! Every timer races the kitchen's shutdown token and returns as soon as it
//! fires.

mod arrivals;
mod clear;
mod patience;

pub use arrivals::*;
pub use clear::*;
pub use patience::*;
