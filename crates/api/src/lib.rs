//! HTTP API server for the storefront order services.
//!
//! Provides REST endpoints for checkout, order administration, the address
//! book and invoice downloads, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use checkout::{AddressService, CheckoutCoordinator, OrderService};
use invoice::{InvoiceDispatcher, InvoiceGenerator, InvoiceStorage};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store, F: InvoiceStorage> {
    pub store: S,
    pub checkout: CheckoutCoordinator<S>,
    pub orders: OrderService<S>,
    pub addresses: AddressService<S>,
    pub invoices: Arc<InvoiceGenerator<S, F>>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, F>(state: Arc<AppState<S, F>>, metrics_handle: PrometheusHandle) -> Router
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    use routes::{addresses, admin, orders, system};

    let metrics_router = Router::new()
        .route("/metrics", get(system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(system::health::<S, F>))
        .route("/api/orders", post(orders::create::<S, F>))
        .route("/api/orders/user", get(orders::history::<S, F>))
        .route("/api/orders/{id}", get(orders::get::<S, F>))
        .route(
            "/api/orders/invoice/{order_number}",
            get(orders::invoice::<S, F>),
        )
        .route("/api/admin/orders", get(admin::list::<S, F>))
        .route("/api/admin/orders/{id}", delete(admin::delete::<S, F>))
        .route("/api/admin/orders/{id}/placed", put(admin::placed::<S, F>))
        .route(
            "/api/admin/orders/{id}/confirmed",
            put(admin::confirmed::<S, F>),
        )
        .route("/api/admin/orders/{id}/ship", put(admin::ship::<S, F>))
        .route("/api/admin/orders/{id}/deliver", put(admin::deliver::<S, F>))
        .route("/api/admin/orders/{id}/cancel", put(admin::cancel::<S, F>))
        .route("/api/addresses", post(addresses::create::<S, F>))
        .route("/api/addresses/user", get(addresses::list::<S, F>))
        .route("/api/addresses/default", get(addresses::default::<S, F>))
        .route("/api/addresses/{id}", delete(addresses::delete::<S, F>))
        .route(
            "/api/addresses/{id}/default",
            put(addresses::set_default::<S, F>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the services over one store and starts the invoice worker.
///
/// The worker exits after the returned state, and every clone of it, is
/// dropped and the queued jobs are done.
pub fn create_state<S, F>(store: S, invoice_storage: F) -> (Arc<AppState<S, F>>, JoinHandle<()>)
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    let invoices = Arc::new(InvoiceGenerator::new(store.clone(), invoice_storage));
    let (dispatcher, worker) = InvoiceDispatcher::spawn(Arc::clone(&invoices));

    let state = Arc::new(AppState {
        checkout: CheckoutCoordinator::new(store.clone(), dispatcher),
        orders: OrderService::new(store.clone()),
        addresses: AddressService::new(store.clone()),
        invoices,
        store,
    });

    (state, worker)
}
