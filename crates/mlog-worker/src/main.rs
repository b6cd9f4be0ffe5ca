//! Motion logger binary.

use std::sync::Arc;

use mlog_media::RpiCamera;
use mlog_storage::DriveClient;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mlog_worker::{metrics, Pipeline, WorkerConfig};

fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run()) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mlog=info,motionlog=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting motionlog");

    let config = WorkerConfig::from_env();
    config.validate()?;
    info!("Worker config: {:?}", config);

    if let Some(addr) = config.metrics_addr {
        metrics::init_metrics(addr)?;
        info!("Serving metrics on {}", addr);
    }

    let drive = DriveClient::from_env().await?;
    let camera = RpiCamera::open(config.camera_config())?;

    let mut pipeline = Pipeline::new(config, camera, Arc::new(drive))?;

    let started = tokio::select! {
        result = pipeline.startup() => Some(result),
        _ = shutdown_signal() => None,
    };

    let outcome = match started {
        Some(Ok(())) => {
            tokio::select! {
                _ = pipeline.run() => {},
                _ = shutdown_signal() => {},
            }
            Ok(())
        }
        Some(Err(e)) => Err(e),
        None => Ok(()),
    };

    // The camera is released on every exit path.
    if let Err(e) = pipeline.shutdown().await {
        error!("Failed to release camera: {}", e);
    }

    outcome?;
    info!("motionlog shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Received shutdown signal");
}
