//! HTTP route definitions and handlers.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

use invitegraph_domain::error::DomainError;
use invitegraph_domain::model::{Profile, ProfileId};
use invitegraph_domain::validation::parse_profile_id;
use invitegraph_upstream::UpstreamClient;

use super::state::AppState;
use crate::middleware::{
    cors_layer, MetricsLayer, RequestIdLayer, RequestLoggingLayer, RequestMetrics,
};
use crate::observability::{metrics_handler, MetricsState};
use crate::utils::{no_store, now_iso};

/// Custom JSON extractor that returns 400 Bad Request instead of 422
/// Unprocessable Entity for deserialization errors.
///
/// Preserves 413 Payload Too Large for body limit errors.
pub struct JsonBadRequest<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBadRequest<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBadRequest(value)),
            Err(rejection) => {
                use axum::extract::rejection::JsonRejection;

                let status = match &rejection {
                    JsonRejection::BytesRejection(_)
                        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE =>
                    {
                        StatusCode::PAYLOAD_TOO_LARGE
                    }
                    _ => StatusCode::BAD_REQUEST,
                };

                Err(ApiError::new(status, "Invalid request body")
                    .with_details(rejection.body_text()))
            }
        }
    }
}

/// Default request body size limit (1MB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

fn api_routes<U: UpstreamClient>() -> Router<Arc<AppState<U>>> {
    Router::new()
        .route("/api/search-users", get(search_users::<U>))
        .route(
            "/api/profile-enhanced/:profile_id",
            get(enhanced_profile::<U>),
        )
        .route("/api/invitations/:profile_id", get(invitations::<U>))
        .route("/api/network/:profile_id", get(network::<U>))
        .route(
            "/api/recent-searches",
            get(list_recent_searches::<U>).post(record_recent_search::<U>),
        )
        .route("/api/cache-stats", get(cache_stats::<U>))
        .route("/api/cache-clear", post(cache_clear::<U>))
}

/// Creates the HTTP router with all API endpoints and `/health`.
///
/// Applies the default body size limit (1MB).
pub fn create_router<U: UpstreamClient>(state: AppState<U>) -> Router {
    create_router_with_body_limit(state, DEFAULT_BODY_LIMIT)
}

/// Creates the HTTP router with a custom body size limit.
pub fn create_router_with_body_limit<U: UpstreamClient>(
    state: AppState<U>,
    body_limit: usize,
) -> Router {
    api_routes::<U>()
        .route("/health", get(health_check))
        .with_state(Arc::new(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors_layer())
}

/// Creates the production router: API endpoints, `/health`, the Prometheus
/// endpoint at `metrics_path` when a recorder is installed, and the request
/// middleware stack.
///
/// Layers run outermost first: CORS, request ID, metrics, logging.
pub fn create_router_with_observability<U: UpstreamClient>(
    state: AppState<U>,
    metrics_state: Option<MetricsState>,
    metrics_path: &str,
    body_limit: usize,
    request_metrics: Arc<RequestMetrics>,
) -> Router {
    let mut router = api_routes::<U>()
        .with_state(Arc::new(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .route("/health", get(health_check));

    if let Some(metrics_state) = metrics_state {
        router = router.merge(
            Router::new()
                .route(metrics_path, get(metrics_handler))
                .with_state(metrics_state),
        );
    }

    router
        .layer(RequestLoggingLayer::new())
        .layer(MetricsLayer::new(request_metrics))
        .layer(RequestIdLayer::new())
        .layer(cors_layer())
}

// ============================================================
// Error Handling
// ============================================================

const QUERY_TOO_SHORT: &str = "Query must be at least 2 characters";
const INVALID_PROFILE_ID: &str = "Valid profile ID is required";
const PROFILE_NOT_FOUND: &str = "Profile not found";

/// Error response body: `{error, details?, query?}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
            query: None,
        }
    }

    /// Creates a validation error (400).
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Creates a not found error (404).
    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Creates an internal error (500) with details.
    pub fn internal(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error).with_details(details)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Maps a domain error for a route whose unexpected failures report
    /// `fallback` as the error message.
    ///
    /// Client input errors become 400, a missing profile 404. An upstream
    /// status surfaces as `"<Label> API error: <status>"` with upstream's body
    /// as details. Anything else is a 500 carrying the error text as details.
    pub fn from_domain(err: DomainError, fallback: &str) -> Self {
        match err {
            DomainError::QueryTooShort { .. } => Self::bad_request(QUERY_TOO_SHORT),
            DomainError::InvalidProfileId { .. } => Self::bad_request(INVALID_PROFILE_ID),
            DomainError::ProfileNotFound { .. } => Self::not_found(PROFILE_NOT_FOUND),
            DomainError::UpstreamStatus { ref body, .. } => {
                error!(error = %err, body = %body, "Upstream returned an error status");
                Self::internal(err.to_string(), body.clone())
            }
            other => {
                error!(error = %other, fallback, "Request failed");
                Self::internal(fallback, other.to_string())
            }
        }
    }

    /// Like [`ApiError::from_domain`], but reports upstream statuses under
    /// `fallback` with the status line as details.
    pub fn from_domain_opaque(err: DomainError, fallback: &str) -> Self {
        match err {
            DomainError::UpstreamStatus { .. } => {
                error!(error = %err, fallback, "Request failed");
                Self::internal(fallback, err.to_string())
            }
            other => Self::from_domain(other, fallback),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn profile_id_param(raw: &str) -> ApiResult<ProfileId> {
    parse_profile_id(raw).map_err(|_| ApiError::bad_request(INVALID_PROFILE_ID))
}

// ============================================================
// Health
// ============================================================

/// Liveness probe.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Lookups
// ============================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

async fn search_users<U: UpstreamClient>(
    State(state): State<Arc<AppState<U>>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<impl IntoResponse> {
    let query = params.query.unwrap_or_default();
    let results = state
        .search
        .search(Some(&query))
        .await
        .map_err(|e| {
            let err = ApiError::from_domain(e, "Failed to search users");
            if err.status() == StatusCode::INTERNAL_SERVER_ERROR {
                err.with_query(&query)
            } else {
                err
            }
        })?;
    Ok(Json(results))
}

async fn enhanced_profile<U: UpstreamClient>(
    State(state): State<Arc<AppState<U>>>,
    Path(profile_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = profile_id_param(&profile_id)?;
    let profile = state
        .profile
        .enhanced_profile(id)
        .await
        .map_err(|e| ApiError::from_domain_opaque(e, "Failed to fetch enhanced profile"))?;
    Ok(Json(profile))
}

async fn invitations<U: UpstreamClient>(
    State(state): State<Arc<AppState<U>>>,
    Path(profile_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = profile_id_param(&profile_id)?;
    let list = state
        .invitations
        .list_invitations(id)
        .await
        .map_err(|e| ApiError::from_domain(e, "Failed to fetch invitations"))?;
    Ok(Json(list))
}

#[derive(Debug, Deserialize)]
pub struct NetworkParams {
    pub depth: Option<String>,
}

async fn network<U: UpstreamClient>(
    State(state): State<Arc<AppState<U>>>,
    Path(profile_id): Path<String>,
    Query(params): Query<NetworkParams>,
) -> ApiResult<impl IntoResponse> {
    let id = profile_id_param(&profile_id)?;
    let depth = state.network.resolve_depth(params.depth.as_deref());
    info!(profile_id = %id, depth, "Building network graph");
    let graph = state
        .network
        .build_network(id, depth)
        .await
        .map_err(|e| ApiError::from_domain(e, "Failed to build network graph"))?;
    Ok(Json(graph))
}

// ============================================================
// Recent Searches
// ============================================================

#[derive(Debug, Serialize)]
struct RecordedResponse {
    success: bool,
    count: usize,
}

async fn list_recent_searches<U: UpstreamClient>(
    State(state): State<Arc<AppState<U>>>,
) -> impl IntoResponse {
    let entries = match state.recent.list().await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "Could not read recent searches");
            Vec::new()
        }
    };
    (no_store(), Json(entries))
}

async fn record_recent_search<U: UpstreamClient>(
    State(state): State<Arc<AppState<U>>>,
    JsonBadRequest(profile): JsonBadRequest<Profile>,
) -> ApiResult<impl IntoResponse> {
    let count = state
        .recent
        .record(profile)
        .await
        .map_err(|e| ApiError::from_domain(e, "Failed to add recent search"))?;
    Ok(Json(RecordedResponse {
        success: true,
        count,
    }))
}

// ============================================================
// Cache Introspection
// ============================================================

async fn cache_stats<U: UpstreamClient>(
    State(state): State<Arc<AppState<U>>>,
) -> impl IntoResponse {
    let stats = state.cache.stats();
    let body = serde_json::json!({
        "hitRate": stats.active_ratio_label(),
        "cache": stats,
        "timestamp": now_iso(),
    });
    (no_store(), Json(body))
}

async fn cache_clear<U: UpstreamClient>(
    State(state): State<Arc<AppState<U>>>,
) -> impl IntoResponse {
    state.cache.clear();
    info!("Response cache cleared");
    (
        no_store(),
        Json(serde_json::json!({
            "message": "Cache cleared successfully",
            "timestamp": now_iso(),
        })),
    )
}
