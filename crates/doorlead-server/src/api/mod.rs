mod leads;
mod track;
mod uploads;
mod webhooks;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{capture_client_ip, request_id};
use crate::notify::Notifications;
use crate::rate_limit::RateLimiter;

/// Multipart uploads may carry up to 30 MB of images plus encoding overhead.
const UPLOAD_BODY_LIMIT: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub limiter: Arc<dyn RateLimiter>,
    pub meta: Arc<doorlead_meta::MetaClient>,
    pub notifier: Arc<Notifications>,
    pub blob: Option<Arc<doorlead_blob::BlobClient>>,
    pub markets: Arc<doorlead_core::MarketDirectory>,
    pub secrets: WebhookSecrets,
}

/// Shared-secret tokens for the webhook providers. An unset token means the
/// corresponding endpoint accepts unauthenticated deliveries.
#[derive(Clone, Default)]
pub struct WebhookSecrets {
    pub leadbridge: Option<String>,
    pub zapier: Option<String>,
}

/// Failure body: `{"success": false, "error": …, "details"?: …}`.
///
/// This is the wire contract the deployed form client parses, so the shape
/// is fixed even though it differs from typical envelope styles.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            error: error.into(),
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn rate_limited() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "Too many requests")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(error: &doorlead_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database operation failed");
    ApiError::internal("Internal server error")
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-leadbridge-token"),
            HeaderName::from_static("x-zapier-secret"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/submit-lead", post(leads::submit_lead))
        .route("/api/update-lead", post(leads::update_lead))
        .route(
            "/api/upload-images",
            post(uploads::upload_images).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/track-view", post(track::track_view))
        .route("/api/track-event", post(track::track_event))
        .route(
            "/api/leadbridge-webhook",
            post(webhooks::leadbridge_webhook).get(webhooks::webhook_probe),
        )
        .route("/api/zapier-webhook", post(webhooks::zapier_webhook))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(axum::middleware::from_fn(capture_client_ip)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match doorlead_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthData {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    status: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}
