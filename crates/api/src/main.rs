//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat, PaymentMode};
use common::{RandomIds, SystemClock};
use domain::PaymentGateway;
use gateway::{HttpPaymentGateway, InMemoryPaymentGateway};
use store::{InMemoryStore, PostgresStore};
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

fn payment_gateway(mode: &PaymentMode) -> Arc<dyn PaymentGateway> {
    match mode {
        PaymentMode::Live(gateway_config) => {
            tracing::info!(base_url = %gateway_config.base_url, "using card payment gateway");
            Arc::new(HttpPaymentGateway::new(gateway_config.clone()))
        }
        PaymentMode::SandboxFake => {
            tracing::warn!("PAYMENT_MODE=sandbox-fake: every charge is approved in memory");
            Arc::new(InMemoryPaymentGateway::new())
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Choose store and gateway, then build application state
    let gateway = payment_gateway(&config.payment_mode);
    let state = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL store");
            if config.seed_products {
                api::seed::seed_products(&store, &RandomIds, &SystemClock)
                    .await
                    .expect("failed to seed products");
            }
            api::create_state(store, gateway, &config)
        }
        None => {
            let store = InMemoryStore::new();
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            if config.seed_products {
                api::seed::seed_products(&store, &RandomIds, &SystemClock)
                    .await
                    .expect("failed to seed products");
            }
            api::create_state(store, gateway, &config)
        }
    };

    // 4. Build the application
    let app = api::create_app(state, metrics_handle, &config);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, prefix = %config.api_prefix, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
