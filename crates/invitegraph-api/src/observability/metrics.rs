//! Prometheus exposition.
//!
//! Installs the `metrics-exporter-prometheus` recorder and describes every
//! metric the service emits:
//!
//! - `invitegraph_http_requests_total`, `invitegraph_http_request_duration_seconds`
//! - `invitegraph_cache_hits_total`, `invitegraph_cache_misses_total`
//! - `invitegraph_upstream_requests_total`
//! - `invitegraph_network_nodes`

use std::sync::Arc;

use axum::{extract::State, http::header::CONTENT_TYPE, response::IntoResponse};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::middleware::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Handle used by the metrics endpoint to render the registry.
#[derive(Clone)]
pub struct MetricsState {
    handle: Arc<PrometheusHandle>,
}

impl MetricsState {
    pub fn new(handle: PrometheusHandle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Renders the current metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to install Prometheus recorder: recorder already installed")]
    AlreadyInstalled,
}

/// Installs the global Prometheus recorder and describes the service metrics.
///
/// # Errors
///
/// Returns an error if a recorder is already installed.
pub fn init_metrics() -> Result<MetricsState, MetricsError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|_| MetricsError::AlreadyInstalled)?;

    describe_metrics();

    Ok(MetricsState::new(handle))
}

fn describe_metrics() {
    metrics::describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests");
    metrics::describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "HTTP request duration in seconds"
    );

    invitegraph_domain::cache::register_cache_metrics();
    invitegraph_domain::network::register_network_metrics();
    invitegraph_upstream::register_upstream_metrics();
}

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Handler for the metrics endpoint.
pub async fn metrics_handler(State(state): State<MetricsState>) -> impl IntoResponse {
    ([(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], state.render())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only one recorder can be installed per process, so these tests use
    // unregistered recorders and never call `init_metrics`.

    #[test]
    fn test_render_reports_recorded_counter() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let state = MetricsState::new(recorder.handle());

        metrics::with_local_recorder(&recorder, || {
            metrics::counter!(HTTP_REQUESTS_TOTAL, "route" => "/health").increment(2);
        });

        let output = state.clone().render();
        assert!(output.contains("invitegraph_http_requests_total"));
        assert!(output.contains("route=\"/health\""));
    }

    #[tokio::test]
    async fn test_handler_sets_prometheus_content_type() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let state = MetricsState::new(recorder.handle());

        let response = metrics_handler(State(state)).await.into_response();

        assert_eq!(response.headers()[CONTENT_TYPE], PROMETHEUS_CONTENT_TYPE);
    }
}
