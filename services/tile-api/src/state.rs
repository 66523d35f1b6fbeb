//! Application state for the tile API.

use std::sync::Arc;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use storage::{PostgisEngine, QueryBuilder, SchemaError, SpatialEngine};

use crate::config::ServiceConfig;

/// Shared application state.
pub struct AppState {
    /// Engine every query runs on.
    pub engine: Arc<dyn SpatialEngine>,

    /// Builds parameterized queries for the configured dataset.
    pub query_builder: QueryBuilder,

    /// Whether 500 bodies carry the engine diagnostic.
    pub expose_engine_errors: bool,

    /// Prometheus exporter, when a recorder is installed.
    pub metrics_handle: Option<PrometheusHandle>,

    /// Owned store handle, closed on shutdown.
    postgis: Option<Arc<PostgisEngine>>,
}

impl AppState {
    /// Open the PostGIS pool described by `config`.
    pub async fn connect(config: &ServiceConfig) -> Result<Self> {
        let query_builder = config.query_builder()?;
        let postgis = Arc::new(PostgisEngine::connect(&config.database).await?);

        info!(
            table = %config.dataset.table,
            layer = %config.tiles.layer_name,
            "Application state initialized"
        );

        Ok(Self {
            engine: postgis.clone(),
            query_builder,
            expose_engine_errors: config.errors.expose_engine_errors,
            metrics_handle: None,
            postgis: Some(postgis),
        })
    }

    /// State around an engine the caller owns.
    pub fn with_engine(
        engine: Arc<dyn SpatialEngine>,
        config: &ServiceConfig,
    ) -> Result<Self, SchemaError> {
        Ok(Self {
            engine,
            query_builder: config.query_builder()?,
            expose_engine_errors: config.errors.expose_engine_errors,
            metrics_handle: None,
            postgis: None,
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Close the store handle if this state owns one.
    pub async fn shutdown(&self) {
        if let Some(postgis) = &self.postgis {
            postgis.close().await;
        }
    }
}
