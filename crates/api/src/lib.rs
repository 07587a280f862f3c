//! HTTP API server with observability for the checkout backend.
//!
//! Exposes the catalog and checkout use cases over REST, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;
pub mod validation;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use checkout::{Checkout, CheckoutPorts};
use common::Money;
use domain::{
    CustomerRepository, DeliveryRepository, PaymentGateway, ProductRepository,
    TransactionRepository,
};
use gateway::InMemoryPaymentGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use store::InMemoryStore;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Fees applied when a create request leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultFees {
    pub base_fee: Money,
    pub delivery_fee: Money,
}

/// Shared application state accessible from all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub checkout: Checkout,
    pub fees: DefaultFees,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    config: &Config,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route("/products", get(routes::products::list))
        .route("/products/{id}", get(routes::products::get))
        .route("/transactions", post(routes::transactions::create))
        .route(
            "/transactions/process-payment",
            post(routes::transactions::process_payment),
        )
        .route("/transactions/{id}", get(routes::transactions::get))
        .route(
            "/transactions/number/{number}",
            get(routes::transactions::get_by_number),
        )
        .with_state(state);

    let api = if config.api_prefix.is_empty() {
        api
    } else {
        Router::new().nest(&config.api_prefix, api)
    };

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(api)
        .merge(metrics_router)
        .layer(cors_layer(config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(_)) => {
            tracing::warn!("CORS_ORIGIN is not a valid header value, allowing any origin");
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Wires the use cases to a store and a payment gateway.
pub fn create_state<S>(
    store: S,
    gateway: Arc<dyn PaymentGateway>,
    config: &Config,
) -> Arc<AppState>
where
    S: ProductRepository
        + CustomerRepository
        + TransactionRepository
        + DeliveryRepository
        + Clone
        + 'static,
{
    let ports = CheckoutPorts::from_store(store, gateway)
        .with_poll_policy(config.poll_policy)
        .with_currency(config.currency.clone());

    Arc::new(AppState {
        checkout: Checkout::new(ports),
        fees: DefaultFees {
            base_fee: config.base_fee,
            delivery_fee: config.delivery_fee,
        },
    })
}

/// Creates the default application state: in-memory store and an
/// in-memory gateway that approves every charge.
pub fn create_default_state(
    config: &Config,
) -> (Arc<AppState>, InMemoryStore, InMemoryPaymentGateway) {
    let store = InMemoryStore::new();
    let gateway = InMemoryPaymentGateway::new();
    let state = create_state(store.clone(), Arc::new(gateway.clone()), config);
    (state, store, gateway)
}
