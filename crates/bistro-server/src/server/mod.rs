//! Process-level plumbing around the [`bistro::Restaurant`].
//!
//! - [`config`] - CLI / environment configuration.
//! - [`report`] - periodic status reports and the final summary.
//! - [`telemetry`] - log subscriber and optional OpenTelemetry metrics.

pub mod config;
pub mod report;
pub mod telemetry;
