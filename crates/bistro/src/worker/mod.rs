//! Background workers that move dishes through the counter.
//!
//! ## Structure
//!
//! - [`interface`] - the [`Producer`] and [`Consumer`] strategy traits.
//! - [`cook`] - demand-gated producers ([`Cooks`]).
//! - [`waiter`] - automatic consumers ([`Waiters`]).
//! - [`manual`] - interactive consumption with no background task
//!   ([`Manual`]).

mod cook;
mod interface;
mod manual;
mod waiter;

pub use cook::*;
pub use interface::*;
pub use manual::*;
pub use waiter::*;
