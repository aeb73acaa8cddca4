#![doc = include_str!("../README.md")]

mod server;

use bistro::Restaurant;
use clap::Parser;
use core::time::Duration;
use server::config::{CliArgs, ServiceConfig};
use server::report::{Summary, report_loop};
use server::telemetry::{init_telemetry, shutdown_telemetry};
use std::sync::Arc;
use tokio::signal;
use tokio::time::Instant;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServiceConfig::try_from(args)?;

    let providers = init_telemetry()?;
    log_startup_info(&config);

    let started = Instant::now();
    let restaurant = Arc::new(Restaurant::new(config.restaurant.clone())?);
    restaurant.start()?;
    if config.initial_customers > 0 {
        restaurant.add_customers(config.initial_customers);
    }

    let reporter = tokio::spawn(report_loop(
        Arc::clone(&restaurant),
        config.report_interval,
    ));

    shutdown_signal(config.run_for).await;

    restaurant.close().await;
    if let Err(e) = reporter.await {
        tracing::error!("Status reporter failed: {:?}", e);
    }

    let summary = Summary::collect(&restaurant, started.elapsed());
    if config.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.log();
    }

    shutdown_telemetry(providers);
    Ok(())
}

fn log_startup_info(config: &ServiceConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting restaurant with full config: {:#?}", config);
    } else {
        let r = &config.restaurant;
        tracing::info!(
            "Starting restaurant with {} cooks, {} waiters, {} tables",
            r.cooks,
            r.waiters,
            r.tables
        );
    }
}

async fn shutdown_signal(run_for: Option<Duration>) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let deadline = async {
        match run_for {
            Some(run_for) => tokio::time::sleep(run_for).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
        () = deadline => tracing::info!("Run time elapsed"),
    }

    tracing::info!("Shutdown signal received, closing the restaurant...");
}
