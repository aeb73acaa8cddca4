//! # Telemetry Features
//!
//! Logs are always written to the console through `tracing_subscriber`. The
//! optional `metrics` feature additionally exports restaurant metrics via
//! OpenTelemetry.
//!
//! ## Feature matrix
//!
//! - `metrics`: Enables OpenTelemetry metrics (counters and gauges).
//! - `stdout`: Enables the stdout exporter for those metrics.
//!
//! ## Feature constraints
//!
//! - `stdout` requires `metrics`.
//!
//! ## Metrics behavior
//!
//! - `dishes_produced`, `dishes_served` and `customers_lost` are monotonic
//!   counters, fed with the difference between two status reports.
//! - `counter_occupancy` and `active_customers` are gauges set on every
//!   report.
//!
//! ## Example usage
//!
//! Export metrics to stdout every five seconds:
//!
//! ```bash
//! cargo run -p bistro-server --features metrics,stdout
//! ```

// Disallow using `stdout` without `metrics`
#[cfg(all(feature = "stdout", not(feature = "metrics")))]
compile_error!("The 'stdout' feature requires 'metrics' to be enabled.");

use bistro::RestaurantState;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Gauge, Meter};
#[cfg(feature = "metrics")]
use opentelemetry::{InstrumentationScope, KeyValue};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::Resource;
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics as sdkmetrics;
#[cfg(feature = "metrics")]
use opentelemetry_semantic_conventions as semvcns;
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

pub struct TelemetryProviders {
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

pub fn init_telemetry() -> anyhow::Result<TelemetryProviders> {
    #[cfg(feature = "metrics")]
    let meter_provider = init_metrics();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        )
        .try_init()?;

    #[cfg(feature = "metrics")]
    {
        opentelemetry::global::set_meter_provider(meter_provider.clone());
        let scope = InstrumentationScope::builder("bistro")
            .with_version(env!("CARGO_PKG_VERSION"))
            .with_schema_url(semvcns::SCHEMA_URL)
            .build();
        init_metric_handles(opentelemetry::global::meter_with_scope(scope));
    }

    Ok(TelemetryProviders {
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

/// Flushes and stops every exporter. Errors are printed, not returned: the
/// process is exiting anyway.
pub fn shutdown_telemetry(_providers: TelemetryProviders) {
    #[cfg(feature = "metrics")]
    {
        if let Err(err) = _providers.meter_provider.force_flush() {
            eprintln!("Error flushing metrics: {:#?}", err);
        }
        if let Err(err) = _providers.meter_provider.shutdown() {
            eprintln!("Error shutting down meter: {:#?}", err);
        }
    }
}

#[cfg(feature = "metrics")]
fn resource() -> Resource {
    Resource::builder()
        .with_service_name("bistro")
        .with_schema_url(
            [KeyValue::new(
                semvcns::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            semvcns::SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "metrics")]
fn init_metrics() -> sdkmetrics::SdkMeterProvider {
    let builder = sdkmetrics::SdkMeterProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::MetricExporter;
        let exporter = MetricExporter::default();
        let reader = sdkmetrics::PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(5))
            .build();

        builder.with_reader(reader)
    };

    builder.build()
}

// Metric handles - only compiled when metrics feature is enabled
#[cfg(feature = "metrics")]
static DISHES_PRODUCED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static DISHES_SERVED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static CUSTOMERS_LOST: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static COUNTER_OCCUPANCY: OnceLock<Gauge<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static ACTIVE_CUSTOMERS: OnceLock<Gauge<u64>> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: Meter) {
    let _ = DISHES_PRODUCED.set(
        meter
            .u64_counter("dishes_produced")
            .with_description("Dishes placed on the counter by cooks")
            .build(),
    );

    let _ = DISHES_SERVED.set(
        meter
            .u64_counter("dishes_served")
            .with_description("Dishes taken off the counter and served")
            .build(),
    );

    let _ = CUSTOMERS_LOST.set(
        meter
            .u64_counter("customers_lost")
            .with_description("Customers who left after running out of patience")
            .build(),
    );

    let _ = COUNTER_OCCUPANCY.set(
        meter
            .u64_gauge("counter_occupancy")
            .with_description("Dishes currently waiting on the counter")
            .build(),
    );

    let _ = ACTIVE_CUSTOMERS.set(
        meter
            .u64_gauge("active_customers")
            .with_description("Customers currently seated")
            .build(),
    );
}

/// Records the change between two consecutive status reports.
#[cfg(feature = "metrics")]
pub fn record_state(previous: &RestaurantState, current: &RestaurantState) {
    if let Some(counter) = DISHES_PRODUCED.get() {
        counter.add(
            current.produced_total.saturating_sub(previous.produced_total),
            &[],
        );
    }
    if let Some(counter) = DISHES_SERVED.get() {
        counter.add(
            current.served_total.saturating_sub(previous.served_total),
            &[],
        );
    }
    if let Some(counter) = CUSTOMERS_LOST.get() {
        counter.add(
            current.lost_customers.saturating_sub(previous.lost_customers),
            &[],
        );
    }
    if let Some(gauge) = COUNTER_OCCUPANCY.get() {
        gauge.record(current.occupancy as u64, &[]);
    }
    if let Some(gauge) = ACTIVE_CUSTOMERS.get() {
        gauge.record(current.active_customers as u64, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_state(_previous: &RestaurantState, _current: &RestaurantState) {}
