//! API server entry point.

use std::error::Error;

use api::config::{Config, LogFormat};
use invoice::FsInvoiceStorage;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryStore, PostgresStore, Store};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Serves the API on `store` until a shutdown signal, then drains the invoice queue.
async fn serve<S>(store: S, config: &Config, metrics_handle: PrometheusHandle) -> Result<(), BoxError>
where
    S: Store + Clone + 'static,
{
    let invoice_storage = FsInvoiceStorage::new(config.invoice_dir.clone());
    let (state, invoice_worker) = api::create_state(store, invoice_storage);
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, invoice_dir = %config.invoice_dir.display(), "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("waiting for queued invoices");
    invoice_worker.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 1. Load configuration (.env is optional)
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // 2. Initialize tracing
    init_tracing(&config);

    // 3. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 4. Pick the store and serve
    match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.database_max_connections).await?;
            store.run_migrations().await?;
            tracing::info!("using Postgres store");
            serve(store, &config, metrics_handle).await?;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            serve(InMemoryStore::new(), &config, metrics_handle).await?;
        }
    }

    tracing::info!("server shut down gracefully");
    Ok(())
}
