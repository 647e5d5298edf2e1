//! Request metrics middleware.
//!
//! Emits, through the `metrics` facade:
//!
//! - `invitegraph_http_requests_total` (counter; `method`, `route`, `status_class`)
//! - `invitegraph_http_request_duration_seconds` (histogram; same labels)
//!
//! The route label is the matched pattern (`/api/network/:profile_id`), never
//! the raw path, so profile ids do not become label values.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Instant,
};

use axum::{
    extract::MatchedPath,
    http::{Request, Response},
};
use tower::{Layer, Service};

pub const HTTP_REQUESTS_TOTAL: &str = "invitegraph_http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "invitegraph_http_request_duration_seconds";

/// Route label for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Success,
    ClientError,
    ServerError,
    Other,
}

impl StatusClass {
    fn of(status: u16) -> Self {
        match status {
            200..=299 => StatusClass::Success,
            400..=499 => StatusClass::ClientError,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Other,
        }
    }

    fn label(self) -> &'static str {
        match self {
            StatusClass::Success => "2xx",
            StatusClass::ClientError => "4xx",
            StatusClass::ServerError => "5xx",
            StatusClass::Other => "other",
        }
    }
}

/// Request counters shared between the layer and whoever wants to read them.
///
/// Every recorded request also goes to the `metrics` facade; the atomics
/// exist so counts can be read back without a Prometheus scrape.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    requests: AtomicU64,
    total_duration_us: AtomicU64,
    success: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished request.
    pub fn record(&self, method: &str, route: &str, status: u16, duration_us: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.total_duration_us
            .fetch_add(duration_us, Ordering::Relaxed);

        let class = StatusClass::of(status);
        match class {
            StatusClass::Success => self.success.fetch_add(1, Ordering::Relaxed),
            StatusClass::ClientError => self.client_errors.fetch_add(1, Ordering::Relaxed),
            StatusClass::ServerError => self.server_errors.fetch_add(1, Ordering::Relaxed),
            StatusClass::Other => 0,
        };

        let labels = [
            ("method", method.to_string()),
            ("route", route.to_string()),
            ("status_class", class.label().to_string()),
        ];
        metrics::counter!(HTTP_REQUESTS_TOTAL, &labels).increment(1);
        metrics::histogram!(HTTP_REQUEST_DURATION_SECONDS, &labels)
            .record(duration_us as f64 / 1_000_000.0);
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn success_count(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn client_error_count(&self) -> u64 {
        self.client_errors.load(Ordering::Relaxed)
    }

    pub fn server_error_count(&self) -> u64 {
        self.server_errors.load(Ordering::Relaxed)
    }

    /// Mean request duration in microseconds, 0 before the first request.
    pub fn avg_duration_us(&self) -> u64 {
        let count = self.request_count();
        if count == 0 {
            0
        } else {
            self.total_duration_us.load(Ordering::Relaxed) / count
        }
    }
}

/// Layer that records request metrics.
#[derive(Clone)]
pub struct MetricsLayer {
    metrics: Arc<RequestMetrics>,
}

impl MetricsLayer {
    pub fn new(metrics: Arc<RequestMetrics>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    metrics: Arc<RequestMetrics>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MetricsService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();
        let method = request.method().to_string();
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());
        let metrics = Arc::clone(&self.metrics);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(request).await?;
            let duration_us = start.elapsed().as_micros() as u64;
            metrics.record(&method, &route, response.status().as_u16(), duration_us);
            Ok(response)
        })
    }
}
