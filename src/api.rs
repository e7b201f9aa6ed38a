//! HTTP layer: axum router for the summary and history endpoints.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, OriginalUri, Query, State};
use axum::http::{header::HeaderName, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use crate::pipeline::{PipelineError, SummaryService};
use crate::summary::{HistoricalRecord, SummaryRequest, SummaryResult};

static START_TIME: OnceLock<Instant> = OnceLock::new();
static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Default page size of the history listing
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
/// Largest page the history listing returns
pub const MAX_HISTORY_LIMIT: usize = 100;

const INTERNAL_ERROR_DETAIL: &str = "Erro interno do servidor.";

pub type AppState = Arc<SummaryService>;

/// Errors as seen by HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unprocessable(String),
    Internal,
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(msg) | PipelineError::InvalidOutput(msg) => {
                ApiError::BadRequest(msg)
            }
            // Already logged by the pipeline; details stay out of the response
            PipelineError::Provider(_) | PipelineError::Storage(_) => ApiError::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_DETAIL.to_string(),
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

/// Build the application router around a shared service.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    START_TIME.get_or_init(Instant::now);

    let cors = if cors_origins.is_empty() || cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods(Any)
    } else {
        let origins = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<_>>();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_headers(Any)
            .allow_methods(Any)
    };

    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let request_id = req
                .headers()
                .get(&REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            info_span!(
                "http.request",
                method = %req.method(),
                uri = %req.uri(),
                request_id = %request_id
            )
        })
        .on_request(|_req: &Request<Body>, _span: &tracing::Span| {
            info!("request.start");
        })
        .on_response(
            |res: &Response, latency: std::time::Duration, _span: &tracing::Span| {
                info!(status = %res.status(), latency_ms = %latency.as_millis(), "request.end");
            },
        );

    let api = Router::new()
        .route("/analise", post(create_summary))
        .route("/historico", get(list_history))
        .route("/schema", get(schema));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health))
        .route("/", get(root))
        .fallback(fallback_404)
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER.clone()))
        .layer(SetRequestIdLayer::new(
            REQUEST_ID_HEADER.clone(),
            MakeRequestUuid,
        ))
}

async fn create_summary(
    State(service): State<AppState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SummaryResult>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Unprocessable(e.body_text()))?;
    let options = request.options.unwrap_or_default();

    let result = service.handle_request(&request.text, &options).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn list_history(
    State(service): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<HistoricalRecord>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let records = service.history(limit, offset).await?;
    Ok(Json(records))
}

async fn schema() -> Json<serde_json::Value> {
    Json(json!({
        "request": schemars::schema_for!(SummaryRequest),
        "response": schemars::schema_for!(SummaryResult),
    }))
}

async fn health() -> Json<serde_json::Value> {
    let uptime = START_TIME
        .get()
        .map(|start| start.elapsed().as_secs_f64())
        .unwrap_or(0.0);
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": uptime
    }))
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "health": "/health",
            "analise": "/api/v1/analise",
            "historico": "/api/v1/historico",
            "schema": "/api/v1/schema"
        }
    }))
}

async fn fallback_404(uri: OriginalUri) -> impl IntoResponse {
    let path = uri.0.path().to_string();
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "detail": "Endpoint não encontrado.",
            "path": path
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[tokio::test]
    async fn storage_failure_hides_details() {
        let err = PipelineError::Storage(StorageError::Task("disk on fire".to_string()));
        let api_error = ApiError::from(err);
        assert!(matches!(api_error, ApiError::Internal));

        let response = api_error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], INTERNAL_ERROR_DETAIL);
    }

    #[test]
    fn validation_failures_keep_their_message() {
        let err = PipelineError::InvalidInput("Texto vazio.".to_string());
        assert!(matches!(ApiError::from(err), ApiError::BadRequest(msg) if msg == "Texto vazio."));
    }
}
