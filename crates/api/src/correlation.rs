//! Correlation-id and audit middleware.
//!
//! Every request carries a correlation id: taken from the inbound
//! `x-correlation-id` header when present, generated otherwise. The id is
//! stored in the request extensions for handlers and downstream calls,
//! echoed on the response, and stamped on the audit record published when
//! the response completes.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use common::CorrelationId;
use saga::{AuditPublisher, AuditRecord};

/// Resolves the request's correlation id and echoes it on the response.
pub async fn with_correlation_id(mut request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CorrelationId::HEADER)
        .and_then(|value| value.to_str().ok())
        .map(CorrelationId::from_value)
        .unwrap_or_default();

    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(CorrelationId::HEADER), value);
    }
    response
}

/// Publishes one audit record per handled request, fire-and-forget.
pub async fn audit_log(
    State(audit): State<Arc<dyn AuditPublisher>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .cloned()
        .unwrap_or_default();

    let response = next.run(request).await;

    audit.publish(AuditRecord::for_request(
        service_for_path(&path),
        correlation_id,
        method,
        path.clone(),
        response.status().as_u16(),
        started.elapsed().as_millis() as u64,
    ));
    response
}

fn service_for_path(path: &str) -> &'static str {
    if path.starts_with("/payments") {
        "payment-service"
    } else {
        "order-service"
    }
}
