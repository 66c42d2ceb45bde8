use std::net::SocketAddr;
use std::sync::Arc;

use opentelemetry::global;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use induk::config::Configuration;
use induk::{app, initialize_state, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // read configuration file.
    let config = Configuration::default().read();
    let endpoint = config
        .telemetry
        .as_ref()
        .map(|telemetry| telemetry.otlp_endpoint.as_str())
        .filter(|endpoint| !endpoint.is_empty());

    let otel_logs = match endpoint {
        Some(endpoint) => Some(telemetry::setup_logging(endpoint)?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(otel_logs)
        .init();

    let tracer = match endpoint {
        Some(endpoint) => {
            let provider = telemetry::setup_tracer(endpoint)?;
            global::set_tracer_provider(provider.clone());
            Some(provider)
        },
        None => None,
    };

    let state = initialize_state(Arc::clone(&config)).await?;
    let recorder = telemetry::install_recorder()?;

    // Stop background tasks on shutdown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = state
        .limiter
        .spawn_sweeper(config.rate_limit.sweep_interval(), shutdown_rx.clone());
    let collector = telemetry::spawn_process_collector(shutdown_rx.clone());

    let metrics_listener = TcpListener::bind(&config.server.metrics_address).await?;
    tracing::info!(addr = %config.server.metrics_address, "metrics listening");
    let mut metrics_shutdown = shutdown_rx;
    let metrics = tokio::spawn(async move {
        let result = axum::serve(metrics_listener, telemetry::metrics_router(recorder))
            .with_graceful_shutdown(async move {
                let _ = metrics_shutdown.wait_for(|stop| *stop).await;
            })
            .await;

        if let Err(err) = result {
            tracing::error!(error = %err, "metrics listener failed");
        }
    });

    let app = app(state);
    let addr = format!("{}:{}", config.server.address, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        name = %config.name,
        mode = %config.server.mode,
        rate_limit = config.rate_limit.limit,
        window_secs = config.rate_limit.window_secs,
        "server listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("shutting down");
    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(sweeper, collector, metrics);

    if let Some(provider) = tracer {
        if let Err(err) = provider.shutdown() {
            tracing::warn!(error = %err, "cannot flush traces");
        }
    }

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
