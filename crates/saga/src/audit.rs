//! Audit log publication.
//!
//! Every handled request produces one audit record, published to an
//! external log sink. The sink is opaque and at-least-once from the
//! publisher's point of view; publication is fire-and-forget and a failing
//! sink must never fail the request that produced the record.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use common::CorrelationId;
use serde::Serialize;

/// Severity of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditLevel {
    Info,
    Error,
}

/// A structured audit record describing one handled request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub log_type: AuditLevel,
    pub service_name: &'static str,
    pub correlation_id: CorrelationId,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub duration_ms: u64,
    pub message: String,
}

impl AuditRecord {
    /// Builds a record for a completed request; level is derived from the
    /// response status.
    pub fn for_request(
        service_name: &'static str,
        correlation_id: CorrelationId,
        method: impl Into<String>,
        path: impl Into<String>,
        status_code: u16,
        duration_ms: u64,
    ) -> Self {
        let method = method.into();
        let path = path.into();
        let message = format!("{method} {path} - {status_code} ({duration_ms}ms)");
        Self {
            timestamp: Utc::now(),
            log_type: if status_code >= 400 {
                AuditLevel::Error
            } else {
                AuditLevel::Info
            },
            service_name,
            correlation_id,
            method,
            path,
            status_code,
            duration_ms,
            message,
        }
    }
}

/// Sink for audit records.
pub trait AuditPublisher: Send + Sync {
    /// Publishes one record. Must not fail the caller; implementations
    /// swallow their own errors.
    fn publish(&self, record: AuditRecord);
}

/// Publishes audit records through `tracing`, standing in for the external
/// log bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAuditPublisher;

impl LogAuditPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl AuditPublisher for LogAuditPublisher {
    fn publish(&self, record: AuditRecord) {
        match record.log_type {
            AuditLevel::Info => tracing::info!(
                target: "audit",
                correlation_id = %record.correlation_id,
                service = record.service_name,
                status = record.status_code,
                duration_ms = record.duration_ms,
                "{}",
                record.message
            ),
            AuditLevel::Error => tracing::error!(
                target: "audit",
                correlation_id = %record.correlation_id,
                service = record.service_name,
                status = record.status_code,
                duration_ms = record.duration_ms,
                "{}",
                record.message
            ),
        }
    }
}

/// In-memory audit sink for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditPublisher {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl InMemoryAuditPublisher {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record published so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Returns the number of records published.
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl AuditPublisher for InMemoryAuditPublisher {
    fn publish(&self, record: AuditRecord) {
        self.records.lock().unwrap().push(record);
    }
}
