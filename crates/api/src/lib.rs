//! HTTP surface for the order and payment services.
//!
//! Both services share one process in the default wiring but talk only
//! through the saga's service seams, so either side can be split out
//! behind the HTTP client implementations without touching the handlers.

pub mod config;
pub mod correlation;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    AuditPublisher, InMemoryRestaurantDirectory, LocalPaymentGateway, LocalStatusCallback,
    OrderCoordinator, PaymentProcessor, RandomSettlement, RestaurantDirectory, SettlementStrategy,
};
use store::{OrderStore, PaymentStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Default bound on every cross-service call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Wires the coordinator and processor over the given stores and seams.
///
/// The payment side settles in-process through [`LocalPaymentGateway`] and
/// reports back through [`LocalStatusCallback`].
pub fn create_state<S, P>(
    order_store: S,
    payment_store: P,
    directory: Arc<dyn RestaurantDirectory>,
    settlement: Arc<dyn SettlementStrategy>,
    call_timeout: Duration,
) -> Arc<AppState<S, P>>
where
    S: OrderStore + Clone + 'static,
    P: PaymentStore + Clone + 'static,
{
    let callback = Arc::new(LocalStatusCallback::new(order_store.clone()));
    let processor = Arc::new(PaymentProcessor::new(
        payment_store,
        settlement,
        callback,
        call_timeout,
    ));
    let gateway = Arc::new(LocalPaymentGateway::new(processor.clone()));
    let coordinator = OrderCoordinator::new(order_store, directory, gateway, call_timeout);

    Arc::new(AppState {
        coordinator,
        processor,
    })
}

/// Default wiring: in-memory restaurant directory (returned for seeding)
/// and the production random settlement draw.
pub fn create_default_state<S, P>(
    order_store: S,
    payment_store: P,
) -> (Arc<AppState<S, P>>, Arc<InMemoryRestaurantDirectory>)
where
    S: OrderStore + Clone + 'static,
    P: PaymentStore + Clone + 'static,
{
    let directory = Arc::new(InMemoryRestaurantDirectory::new());
    let state = create_state(
        order_store,
        payment_store,
        directory.clone(),
        Arc::new(RandomSettlement::default()),
        DEFAULT_CALL_TIMEOUT,
    );
    (state, directory)
}

/// Creates the Axum application router with all routes, middleware, and
/// shared state.
pub fn create_app<S, P>(
    state: Arc<AppState<S, P>>,
    metrics_handle: PrometheusHandle,
    audit: Arc<dyn AuditPublisher>,
) -> Router
where
    S: OrderStore + Clone + 'static,
    P: PaymentStore + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::create::<S, P>).get(routes::orders::list::<S, P>),
        )
        .route(
            "/orders/user/{user_id}",
            get(routes::orders::list_for_user::<S, P>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S, P>).delete(routes::orders::cancel::<S, P>),
        )
        .route(
            "/orders/{id}/status",
            get(routes::orders::status::<S, P>).put(routes::orders::update_status::<S, P>),
        )
        .route(
            "/orders/{id}/note",
            post(routes::orders::add_note::<S, P>)
                .put(routes::orders::update_note::<S, P>)
                .delete(routes::orders::remove_note::<S, P>),
        )
        .route(
            "/payments",
            post(routes::payments::create::<S, P>).get(routes::payments::list::<S, P>),
        )
        .route(
            "/payments/user/{user_id}",
            get(routes::payments::list_for_user::<S, P>),
        )
        .route("/payments/{id}", get(routes::payments::get::<S, P>))
        .route(
            "/payments/{id}/confirm",
            post(routes::payments::confirm::<S, P>),
        )
        .route(
            "/payments/{id}/status",
            put(routes::payments::update_status::<S, P>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(middleware::from_fn_with_state(
            audit,
            correlation::audit_log,
        ))
        .layer(middleware::from_fn(correlation::with_correlation_id))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
