use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use pipeline::ProcessedDocument;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use validate::ValidationSummary;

use crate::cache::CacheStats;
use crate::error::ApiError;
use crate::metrics::{MetricsSnapshot, TimedOperation};
use crate::state::AppState;

/// Multipart field carrying the uploaded document
const UPLOAD_FIELD: &str = "file";

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .route("/process-document/", post(process_document))
        .route("/processed-documents/", get(list_documents))
        .route("/processed-documents/:filename", get(get_document))
        .route("/processed-documents/:filename/summary", get(get_summary))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HomeResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    ocr: String,
    ner: String,
    store: String,
}

#[derive(Serialize)]
struct ListResponse {
    processed_files: Vec<String>,
}

#[derive(Serialize)]
struct SummaryResponse {
    filename: String,
    #[serde(flatten)]
    summary: ValidationSummary,
}

#[derive(Serialize)]
struct MetricsResponse {
    #[serde(flatten)]
    metrics: MetricsSnapshot,
    cache: Option<CacheStats>,
}

async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Document processing service is running",
    })
}

fn component_status<E: std::fmt::Display>(result: Result<(), E>) -> String {
    match result {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("error: {e}"),
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let pipeline = &state.pipeline;
    let ocr = component_status(pipeline.extractor().ocr_engine().ping().await);
    let ner = component_status(pipeline.tagger().engine().ping().await);
    let store = component_status(pipeline.store().ping().await);

    let healthy = [&ocr, &ner, &store].iter().all(|s| s.as_str() == "ok");
    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        ocr,
        ner,
        store,
    })
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        metrics: state.metrics.snapshot(),
        cache: state.cache.as_ref().map(|c| c.stats()),
    })
}

/// Pull the `file` field out of the form; other fields are ignored.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_multipart("malformed multipart body", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("uploaded file has no filename".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::from_multipart("failed to read upload", e))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(ApiError::BadRequest(format!(
        "missing multipart field {UPLOAD_FIELD:?}"
    )))
}

async fn process_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ProcessedDocument>, ApiError> {
    let timer = TimedOperation::start();

    let outcome = match read_upload(&mut multipart).await {
        Ok((filename, bytes)) => state
            .pipeline
            .process_timed(&bytes, &filename)
            .await
            .map_err(ApiError::from),
        Err(e) => Err(e),
    };

    match &outcome {
        Ok((record, stages)) => {
            state.metrics.record_request(true);
            state
                .metrics
                .record_document(timer.elapsed(), stages, record.entities.len());
        }
        Err(_) => state.metrics.record_request(false),
    }
    outcome.map(|(record, _)| Json(record))
}

async fn list_documents(State(state): State<Arc<AppState>>) -> Result<Json<ListResponse>, ApiError> {
    let mut processed_files = state.pipeline.store().list().await?;
    processed_files.sort();
    Ok(Json(ListResponse { processed_files }))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<ProcessedDocument>, ApiError> {
    let record = state.pipeline.store().get(&filename).await?;
    Ok(Json(record))
}

async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let record = state.pipeline.store().get(&filename).await?;
    Ok(Json(SummaryResponse {
        summary: record.summary(),
        filename: record.filename,
    }))
}
