//! DocQA API Gateway
//!
//! HTTP surface for the upload, query and telemetry pipelines:
//! - Multipart uploads extracted and stored per organization
//! - Questions answered against the stored extraction
//! - Browser telemetry snapshots
//! - Health, readiness and Prometheus metrics

pub mod handlers;
pub mod middleware;
pub mod services;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use docqa_common::{config::AppConfig, OrganizationStore, QuestionAnswerer, SnapshotStore};
use docqa_ingestion::Extractor;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::middleware::{metrics::track_metrics, rate_limit};
use crate::services::{QueryPipeline, TelemetryPipeline, UploadPipeline};

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn OrganizationStore>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub answerer: Arc<dyn QuestionAnswerer>,
    pub extractor: Arc<Extractor>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn upload_pipeline(&self) -> UploadPipeline {
        UploadPipeline::new(self.store.clone(), self.extractor.clone())
    }

    pub fn query_pipeline(&self) -> QueryPipeline {
        QueryPipeline::new(self.store.clone(), self.answerer.clone())
    }

    pub fn telemetry_pipeline(&self) -> TelemetryPipeline {
        TelemetryPipeline::new(self.snapshots.clone())
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::metrics::metrics))

        // Document endpoints
        .route("/upload_file/{org_id}", post(handlers::upload::upload_file))
        .route("/query/{org_id}", post(handlers::query::query))

        // Organization records
        .route("/organizations", get(handlers::organizations::list_organizations))
        .route("/organizations/{id}", get(handlers::organizations::get_organization))

        // Browser telemetry
        .route("/telemetry", post(handlers::telemetry::collect))
        .route_layer(from_fn(track_metrics));

    if config.rate_limit.enabled {
        let limit = rate_limit::create_rate_limiter(
            config.rate_limit.requests_per_second,
            config.rate_limit.burst,
        );
        router = router.layer(from_fn_with_state(limit, rate_limit::rate_limit_middleware));
    }

    router
        .layer(DefaultBodyLimit::max(
            config.server.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // request ids are set outside the propagation layer
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}
