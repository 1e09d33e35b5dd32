//! Tile render backend control.
//!
//! The render backend re-reads its style file when it receives a reload
//! signal. [`DockerBackend`] delivers that signal to the backend's container
//! through the Docker Engine HTTP API.

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::fetch::{AsyncHttpClient, HttpError};

/// Default Docker Engine API endpoint.
pub const DEFAULT_DOCKER_ENDPOINT: &str = "http://localhost:2375";

/// Signal that makes the render backend reload its style.
pub const DEFAULT_RELOAD_SIGNAL: &str = "SIGHUP";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("Render backend container '{0}' not found")]
    NotFound(String),

    #[error("Failed to signal render backend: {0}")]
    Http(#[from] HttpError),

    #[error("Unexpected container description: {0}")]
    InvalidResponse(String),
}

/// Control surface of the tile render backend.
pub trait RenderBackend: Send + Sync {
    /// Asks the backend to reload its style document.
    fn reload(&self) -> impl Future<Output = Result<(), BackendError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ContainerInspect {
    #[serde(rename = "Id")]
    id: String,
}

/// Render backend running in a Docker container.
pub struct DockerBackend<C: AsyncHttpClient> {
    http_client: C,
    endpoint: String,
    container: String,
    signal: String,
}

impl<C: AsyncHttpClient> DockerBackend<C> {
    pub fn new(
        http_client: C,
        endpoint: impl Into<String>,
        container: impl Into<String>,
        signal: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            container: container.into(),
            signal: signal.into(),
        }
    }

    /// Resolves the configured container name to its ID.
    async fn container_id(&self) -> Result<String, BackendError> {
        let url = format!("{}/containers/{}/json", self.endpoint, self.container);
        let body = self.http_client.get(&url).await.map_err(|e| match e.status() {
            Some(404) => BackendError::NotFound(self.container.clone()),
            _ => BackendError::Http(e),
        })?;

        let inspect: ContainerInspect = serde_json::from_slice(&body)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        Ok(inspect.id)
    }
}

impl<C: AsyncHttpClient> RenderBackend for DockerBackend<C> {
    async fn reload(&self) -> Result<(), BackendError> {
        let id = self.container_id().await?;
        debug!(container = %self.container, id = %id, "Resolved render backend container");

        let url = format!(
            "{}/containers/{}/kill?signal={}",
            self.endpoint, id, self.signal
        );
        self.http_client.post(&url).await.map_err(|e| match e.status() {
            Some(404) => BackendError::NotFound(self.container.clone()),
            _ => BackendError::Http(e),
        })?;

        info!(container = %self.container, signal = %self.signal, "Sent reload signal");
        Ok(())
    }
}
