use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use loginform::config::Configuration;
use loginform::database::MongoStore;
use loginform::{AppState, ServerError, app, telemetry};
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = Configuration::default()
        .path(std::env::var("CONFIG_PATH").map(PathBuf::from).unwrap_or_default())
        .read();

    // initialize tracing.
    let (otlp_logs, log_provider) = match config.telemetry.otlp.as_deref() {
        Some(endpoint) => {
            let (bridge, provider) = telemetry::setup_logging(endpoint)?;
            (Some(bridge), Some(provider))
        },
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(fmt::layer())
        .with(otlp_logs)
        .init();

    let tracer = config
        .telemetry
        .otlp
        .as_deref()
        .map(telemetry::setup_tracer)
        .transpose()?;

    // the service is useless without its collection.
    let store = MongoStore::connect(&config.mongodb).await.inspect_err(|err| {
        tracing::error!(
            error = %err,
            database = %config.mongodb.database,
            "cannot connect to mongodb"
        )
    })?;

    let mut state = AppState::new(Arc::clone(&config), Arc::new(store.clone()));
    if config.telemetry.prometheus {
        state = state.with_metrics(telemetry::setup_metrics_recorder()?);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server started");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.shutdown().await;
    if let Some(provider) = tracer {
        if let Err(err) = provider.shutdown() {
            tracing::warn!(error = ?err, "tracer provider not flushed");
        }
    }
    if let Some(provider) = log_provider {
        if let Err(err) = provider.shutdown() {
            tracing::warn!(error = ?err, "logger provider not flushed");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutting down");
}
