//! Prometheus metrics.
//!
//! Counters are recorded at their call sites through the `metrics` facade:
//!
//! - `tessera_errors_total{code,category}` from [`TesseraError::record_metrics`](crate::error::TesseraError::record_metrics)
//! - `tessera_authz_decisions_total{decision,reason}` from the access policy evaluator
//! - `tessera_predicates_compiled_total{entity}` from the predicate compiler
//! - `tessera_auth_failures_total{error_type}` from the authentication layer
//!
//! This module installs the recorder and renders it for `GET /metrics`.

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{ErrorCode, Result, TesseraError};

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    /// Labels added to every metric
    #[serde(default)]
    pub global_labels: HashMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            global_labels: HashMap::new(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

/// Handle to the installed recorder. Renders nothing when metrics are disabled.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    prometheus_handle: Option<PrometheusHandle>,
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("prometheus_handle", &self.prometheus_handle.is_some())
            .finish()
    }
}

impl MetricsRegistry {
    /// A registry with no recorder behind it.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.prometheus_handle.is_some()
    }

    /// Render all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.prometheus_handle
            .as_ref()
            .map(|h| h.render())
            .unwrap_or_default()
    }
}

/// Install the global Prometheus recorder.
///
/// # Errors
///
/// Fails if a recorder is already installed in this process.
pub fn init_metrics(config: &MetricsConfig) -> Result<MetricsRegistry> {
    if !config.enabled {
        return Ok(MetricsRegistry::disabled());
    }

    let mut builder = PrometheusBuilder::new();
    for (key, value) in &config.global_labels {
        builder = builder.add_global_label(key, value);
    }

    let handle = builder.install_recorder().map_err(|e| {
        TesseraError::with_internal(
            ErrorCode::ConfigurationError,
            "Failed to install metrics recorder",
            e.to_string(),
        )
    })?;

    register_metric_descriptions();
    tracing::info!(labels = config.global_labels.len(), "Metrics initialized");

    Ok(MetricsRegistry {
        prometheus_handle: Some(handle),
    })
}

fn register_metric_descriptions() {
    describe_counter!("tessera_errors_total", "Errors by code and category");
    describe_counter!(
        "tessera_authz_decisions_total",
        "Access policy decisions by outcome and reason"
    );
    describe_counter!(
        "tessera_predicates_compiled_total",
        "Predicates compiled per entity"
    );
    describe_counter!(
        "tessera_auth_failures_total",
        "Rejected credentials by failure type"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_registry_renders_nothing() {
        let registry = init_metrics(&MetricsConfig {
            enabled: false,
            ..Default::default()
        })
        .unwrap();
        assert!(!registry.is_enabled());
        assert_eq!(registry.render(), "");
    }
}
