//! Prometheus metrics for the HTTP surface and domain events.
//!
//! The recorder is installed once per process and rendered in-process at
//! `/metrics`, so no separate exporter listener is started.

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Once, OnceLock};
use std::time::Instant;
use tracing::{info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// All metric names share the `klozbuy_` prefix.
macro_rules! metric_name {
    (counter, $name:literal) => {
        concat!("klozbuy_", $name, "_total")
    };
    (histogram, $name:literal) => {
        concat!("klozbuy_", $name)
    };
}

/// Install the Prometheus recorder. Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("Prometheus handle was already set");
            }
            info!("Prometheus recorder installed");
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    });
}

/// Current metrics in the Prometheus text format.
pub fn render() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

pub struct HttpMetrics;

impl HttpMetrics {
    pub fn record_request(method: &str, route: &str, status: u16, duration_secs: f64) {
        let labels = [
            ("method", method.to_string()),
            ("route", route.to_string()),
            ("status", status.to_string()),
        ];
        ::metrics::counter!(metric_name!(counter, "http_requests"), &labels).increment(1);
        ::metrics::histogram!(metric_name!(histogram, "http_request_duration_seconds"), &labels)
            .record(duration_secs);
    }
}

pub struct DomainMetrics;

impl DomainMetrics {
    pub fn user_created() {
        ::metrics::counter!(metric_name!(counter, "users_created")).increment(1);
    }

    pub fn post_created(post_type: &str) {
        ::metrics::counter!(metric_name!(counter, "posts_created"), "post_type" => post_type.to_string())
            .increment(1);
    }

    pub fn follow_created() {
        ::metrics::counter!(metric_name!(counter, "follows_created")).increment(1);
    }

    pub fn follow_removed() {
        ::metrics::counter!(metric_name!(counter, "follows_removed")).increment(1);
    }
}

/// Route-level middleware recording a counter and latency per request.
///
/// Installed with `route_layer` so the matched route template is known.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let method = req.method().clone();

    let response = next.run(req).await;

    HttpMetrics::record_request(
        method.as_str(),
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
