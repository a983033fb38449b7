#![doc = include_str!("../README.md")]

mod sim;

use anyhow::bail;
use clap::Parser;
use liftbank::{CarPool, DispatchChannel, EventSink, dispatch_call};
use sim::config::{CliArgs, SimConfig};
use sim::sink::LogSink;
use sim::telemetry::init_telemetry;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = SimConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    run_simulation(config, Arc::new(LogSink), shutdown_signal()).await
}

/// Runs the bank until `shutdown` resolves or the configured run time is up,
/// then stops the generator and the cars in that order.
async fn run_simulation(
    config: SimConfig,
    sink: Arc<dyn EventSink>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let channel = Arc::new(DispatchChannel::new());
    let shutdown_token = CancellationToken::new();

    let pool = CarPool::spawn(
        config.bank.clone(),
        Arc::clone(&channel),
        Arc::clone(&sink),
        shutdown_token.clone(),
    )?;

    for &call in &config.calls {
        dispatch_call(&channel, sink.as_ref(), call)?;
    }

    let generator = config.generator()?.map(|generator| {
        let channel = Arc::clone(&channel);
        let sink = Arc::clone(&sink);
        let token = shutdown_token.clone();
        tokio::spawn(async move { generator.run(&channel, sink.as_ref(), &token).await })
    });

    match config.run_for {
        Some(limit) => tokio::select! {
            () = shutdown => {},
            () = tokio::time::sleep(limit) => {
                tracing::info!("Run time of {limit:?} elapsed");
            },
        },
        None => shutdown.await,
    }

    tracing::info!("Stopping the bank...");

    // The generator has to stop pushing before the pool closes the channel.
    shutdown_token.cancel();
    if let Some(generator) = generator {
        generator.await??;
    }

    let report = pool.shutdown().await;

    for car in pool.snapshot() {
        tracing::info!(
            car = car.id,
            "car {} finished at floor {} after {} trips ({} left pending)",
            car.id,
            car.floor,
            car.serviced,
            car.pending
        );
    }
    for call in &report.undelivered {
        tracing::warn!("call {call} was never picked up by a car");
    }

    if !report.timed_out.is_empty() {
        bail!("cars {:?} did not stop in time and were aborted", report.timed_out);
    }
    if let Some((car, e)) = report.failures.into_iter().next() {
        return Err(anyhow::Error::new(e).context(format!("car {car} worker failed")));
    }

    tracing::info!("Simulation shut down successfully");
    Ok(())
}

fn log_startup_info(config: &SimConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting elevator bank with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting elevator bank with {} cars over {} floors",
            config.bank.num_cars,
            config.bank.num_floors
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
