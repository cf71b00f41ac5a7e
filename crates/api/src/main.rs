//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use saga::{
    AuditPublisher, HttpRestaurantDirectory, InMemoryRestaurantDirectory, LogAuditPublisher,
    RandomSettlement, RestaurantDirectory,
};
use store::{InMemoryOrderStore, InMemoryPaymentStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
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

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the restaurant directory: remote service if configured,
    // seeded in-memory directory otherwise
    let directory: Arc<dyn RestaurantDirectory> = match &config.restaurant_service_url {
        Some(url) => {
            tracing::info!(%url, "using remote restaurant directory");
            Arc::new(HttpRestaurantDirectory::new(
                url.clone(),
                config.call_timeout(),
            ))
        }
        None => {
            let directory = InMemoryRestaurantDirectory::new();
            for id in &config.restaurant_ids {
                directory.add_restaurant(id.as_str());
            }
            tracing::info!(
                restaurants = directory.len(),
                "using in-memory restaurant directory"
            );
            Arc::new(directory)
        }
    };

    // 4. Wire stores, settlement, and the saga components
    let settlement = Arc::new(RandomSettlement::new(config.payment_success_rate));
    let state = api::create_state(
        InMemoryOrderStore::new(),
        InMemoryPaymentStore::new(),
        directory,
        settlement,
        config.call_timeout(),
    );
    let audit: Arc<dyn AuditPublisher> = Arc::new(LogAuditPublisher::new());

    // 5. Build the application
    let app = api::create_app(state, metrics_handle, audit);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
