use anyhow::{Context, bail};
use bistro::{LatencyRange, RestaurantConfig, Timings};
use clap::Parser;
use core::time::Duration;

/// Runtime configuration for the `bistro-server` binary.
///
/// Every value can be given as a CLI flag or an environment variable (a
/// `.env` file in the working directory is loaded first). The defaults mirror
/// the library's defaults, except that two automatic waiters are hired since
/// nobody is around to carry dishes by hand.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bistro-server",
    version,
    about = "Runs a demand-gated restaurant of cooks and waiters and reports on it"
)]
pub struct CliArgs {
    /// Number of dishes the counter can hold.
    ///
    /// Environment variable: `COUNTER_CAPACITY`
    #[arg(long, env = "COUNTER_CAPACITY", default_value_t = 5)]
    pub counter_capacity: usize,

    /// Number of cook tasks.
    ///
    /// Environment variable: `NUM_COOKS`
    #[arg(long, env = "NUM_COOKS", default_value_t = 2)]
    pub cooks: usize,

    /// Number of automatic waiter tasks. With zero, dishes pile up on the
    /// counter until it is full.
    ///
    /// Environment variable: `NUM_WAITERS`
    #[arg(long, env = "NUM_WAITERS", default_value_t = 2)]
    pub waiters: usize,

    /// Number of tables in the dining room.
    ///
    /// Environment variable: `NUM_TABLES`
    #[arg(long, env = "NUM_TABLES", default_value_t = 8)]
    pub tables: usize,

    /// Largest party seated at once by the arrival generator.
    ///
    /// Environment variable: `MAX_PARTY_SIZE`
    #[arg(long, env = "MAX_PARTY_SIZE", default_value_t = 3)]
    pub max_party_size: usize,

    /// Chance, per arrival tick, that an empty table gets a new party.
    ///
    /// Environment variable: `ARRIVAL_PROBABILITY`
    #[arg(long, env = "ARRIVAL_PROBABILITY", default_value_t = 0.4)]
    pub arrival_probability: f64,

    /// Shortest time a cook spends on one dish, in milliseconds.
    ///
    /// Environment variable: `COOK_TIME_MIN_MS`
    #[arg(long, env = "COOK_TIME_MIN_MS", default_value_t = 1500)]
    pub cook_time_min_ms: u64,

    /// Longest time a cook spends on one dish, in milliseconds.
    ///
    /// Environment variable: `COOK_TIME_MAX_MS`
    #[arg(long, env = "COOK_TIME_MAX_MS", default_value_t = 2500)]
    pub cook_time_max_ms: u64,

    /// Time a waiter spends carrying a dish, in milliseconds.
    ///
    /// Environment variable: `DELIVERY_TIME_MS`
    #[arg(long, env = "DELIVERY_TIME_MS", default_value_t = 600)]
    pub delivery_time_ms: u64,

    /// How often an idle cook re-checks for demand, in milliseconds.
    ///
    /// Environment variable: `IDLE_POLL_MS`
    #[arg(long, env = "IDLE_POLL_MS", default_value_t = 500)]
    pub idle_poll_ms: u64,

    /// How long customers wait before leaving unserved, in seconds.
    ///
    /// Environment variable: `PATIENCE_SECS`
    #[arg(long, env = "PATIENCE_SECS", default_value_t = 30)]
    pub patience_secs: u64,

    /// Period of the patience monitor, in milliseconds.
    ///
    /// Environment variable: `PATIENCE_TICK_MS`
    #[arg(long, env = "PATIENCE_TICK_MS", default_value_t = 1000)]
    pub patience_tick_ms: u64,

    /// Period of the arrival generator, in milliseconds.
    ///
    /// Environment variable: `ARRIVAL_INTERVAL_MS`
    #[arg(long, env = "ARRIVAL_INTERVAL_MS", default_value_t = 5000)]
    pub arrival_interval_ms: u64,

    /// Delay between serving a table and freeing it, in milliseconds.
    ///
    /// Environment variable: `CLEAR_DELAY_MS`
    #[arg(long, env = "CLEAR_DELAY_MS", default_value_t = 3000)]
    pub clear_delay_ms: u64,

    /// Customers seated right after start-up.
    ///
    /// Environment variable: `INITIAL_CUSTOMERS`
    #[arg(long, env = "INITIAL_CUSTOMERS", default_value_t = 0)]
    pub initial_customers: usize,

    /// How often a status line is logged, in milliseconds.
    ///
    /// Environment variable: `REPORT_INTERVAL_MS`
    #[arg(long, env = "REPORT_INTERVAL_MS", default_value_t = 2000)]
    pub report_interval_ms: u64,

    /// Stop on its own after this many seconds instead of waiting for a
    /// signal.
    ///
    /// Environment variable: `RUN_FOR_SECS`
    #[arg(long, env = "RUN_FOR_SECS")]
    pub run_for_secs: Option<u64>,

    /// Print the final summary as JSON on stdout.
    ///
    /// Environment variable: `SUMMARY_JSON`
    #[arg(long, env = "SUMMARY_JSON", default_value_t = false)]
    pub summary_json: bool,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub restaurant: RestaurantConfig,
    pub initial_customers: usize,
    pub report_interval: Duration,
    pub run_for: Option<Duration>,
    pub summary_json: bool,
}

impl TryFrom<CliArgs> for ServiceConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.report_interval_ms == 0 {
            bail!("REPORT_INTERVAL_MS must be greater than 0");
        }

        if args.run_for_secs == Some(0) {
            bail!("RUN_FOR_SECS must be greater than 0 when set");
        }

        let restaurant = RestaurantConfig {
            counter_capacity: args.counter_capacity,
            cooks: args.cooks,
            waiters: args.waiters,
            tables: args.tables,
            max_party_size: args.max_party_size,
            arrival_probability: args.arrival_probability,
            timings: Timings {
                cook_time: LatencyRange::new(
                    Duration::from_millis(args.cook_time_min_ms),
                    Duration::from_millis(args.cook_time_max_ms),
                ),
                delivery_time: Duration::from_millis(args.delivery_time_ms),
                idle_poll: Duration::from_millis(args.idle_poll_ms),
                patience: Duration::from_secs(args.patience_secs),
                patience_tick: Duration::from_millis(args.patience_tick_ms),
                arrival_interval: Duration::from_millis(args.arrival_interval_ms),
                clear_delay: Duration::from_millis(args.clear_delay_ms),
            },
        };
        restaurant
            .validate()
            .context("invalid restaurant configuration")?;

        Ok(Self {
            restaurant,
            initial_customers: args.initial_customers,
            report_interval: Duration::from_millis(args.report_interval_ms),
            run_for: args.run_for_secs.map(Duration::from_secs),
            summary_json: args.summary_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(flags: &[&str]) -> anyhow::Result<ServiceConfig> {
        let args = CliArgs::try_parse_from(core::iter::once("bistro-server").chain(flags.iter().copied()))?;
        ServiceConfig::try_from(args)
    }

    #[test]
    fn defaults_match_the_library_timings() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.restaurant.timings, Timings::default());
        assert_eq!(config.restaurant.counter_capacity, 5);
        assert_eq!(config.restaurant.waiters, 2);
        assert_eq!(config.report_interval, Duration::from_secs(2));
        assert_eq!(config.run_for, None);
        assert!(!config.summary_json);
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--cooks",
            "4",
            "--waiters",
            "0",
            "--patience-secs",
            "5",
            "--run-for-secs",
            "60",
            "--summary-json",
        ])
        .unwrap();
        assert_eq!(config.restaurant.cooks, 4);
        assert_eq!(config.restaurant.waiters, 0);
        assert_eq!(config.restaurant.timings.patience, Duration::from_secs(5));
        assert_eq!(config.run_for, Some(Duration::from_secs(60)));
        assert!(config.summary_json);
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(parse(&["--cooks", "0"]).is_err());
        assert!(parse(&["--counter-capacity", "0"]).is_err());
        assert!(parse(&["--arrival-probability", "1.5"]).is_err());
        assert!(parse(&["--cook-time-min-ms", "3000", "--cook-time-max-ms", "1000"]).is_err());
        assert!(parse(&["--report-interval-ms", "0"]).is_err());
        assert!(parse(&["--run-for-secs", "0"]).is_err());
    }
}
