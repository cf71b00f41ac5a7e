//! Restaurant directory lookup.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::CorrelationId;
use domain::RestaurantId;

use crate::error::SagaError;

/// Read-only lookup against the external restaurant directory.
#[async_trait]
pub trait RestaurantDirectory: Send + Sync {
    /// Resolves whether the restaurant exists.
    async fn exists(
        &self,
        id: &RestaurantId,
        correlation_id: &CorrelationId,
    ) -> Result<bool, SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryDirectoryState {
    known: HashSet<RestaurantId>,
    unavailable: bool,
}

/// In-memory restaurant directory for the default wiring and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRestaurantDirectory {
    state: Arc<RwLock<InMemoryDirectoryState>>,
}

impl InMemoryRestaurantDirectory {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a restaurant as existing.
    pub fn add_restaurant(&self, id: impl Into<RestaurantId>) {
        self.state.write().unwrap().known.insert(id.into());
    }

    /// Configures the directory to fail every lookup.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Returns the number of registered restaurants.
    pub fn len(&self) -> usize {
        self.state.read().unwrap().known.len()
    }

    /// Returns true if no restaurants are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RestaurantDirectory for InMemoryRestaurantDirectory {
    async fn exists(
        &self,
        id: &RestaurantId,
        _correlation_id: &CorrelationId,
    ) -> Result<bool, SagaError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(SagaError::unavailable(
                "restaurant directory",
                "directory offline",
            ));
        }
        Ok(state.known.contains(id))
    }
}

/// Restaurant directory backed by the restaurant service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRestaurantDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRestaurantDirectory {
    /// Creates a directory client against the given base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RestaurantDirectory for HttpRestaurantDirectory {
    async fn exists(
        &self,
        id: &RestaurantId,
        correlation_id: &CorrelationId,
    ) -> Result<bool, SagaError> {
        let url = format!("{}/restaurants/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .header(CorrelationId::HEADER, correlation_id.as_str())
            .send()
            .await
            .map_err(|e| SagaError::unavailable("restaurant directory", e))?;

        Ok(response.status().is_success())
    }
}
