use crate::awards::{
    AwardEngine, AwardSummary, CatalogOverview, DateRangePolicy, HonourRoll, HonourRollEntry,
    OperatorId, ResolvedCallsign, Summit, SummitCatalog,
};
use crate::config::AwardConfig;
use crate::error::AppError;
use crate::sources::{
    ActivationCsvImporter, CatalogImporter, InMemoryCallsignDirectory, RejectedRecord,
};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub readiness: Arc<AtomicBool>,
    pub metrics: Arc<PrometheusHandle>,
}

/// Award data served by the HTTP endpoints. Loaded once at start-up.
#[derive(Clone)]
pub struct AwardState {
    pub catalog: Arc<SummitCatalog>,
    pub roll: Arc<HonourRoll>,
    pub generated_at: Option<DateTime<Utc>>,
    pub rules: Arc<AwardConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HonourRollQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HonourRollResponse {
    pub generated_at: Option<DateTime<Utc>>,
    pub total_operators: usize,
    pub entries: Vec<HonourRollEntry>,
}

#[derive(Debug, Serialize)]
pub struct SummitListResponse {
    pub overview: CatalogOverview,
    pub summits: Vec<Summit>,
}

/// One row of the operator picker.
#[derive(Debug, Serialize)]
pub struct OperatorListing {
    pub operator_id: OperatorId,
    pub callsign: ResolvedCallsign,
}

#[derive(Debug, Deserialize)]
pub struct ComputeRequest {
    pub catalog_csv: String,
    pub activations_csv: String,
    #[serde(default)]
    pub callsigns_csv: Option<String>,
    #[serde(default)]
    pub date_range: Option<DateRangePolicy>,
}

#[derive(Debug, Serialize)]
pub struct ComputeResponse {
    pub operators: usize,
    pub rejected: Vec<RejectedRecord>,
    pub summaries: Vec<AwardSummary>,
}

pub fn award_router(state: AwardState) -> Router {
    Router::new()
        .route("/api/v1/summits", get(summits_endpoint))
        .route("/api/v1/operators", get(operators_endpoint))
        .route("/api/v1/awards", get(honour_roll_endpoint))
        .route("/api/v1/awards/compute", post(compute_endpoint))
        .route("/api/v1/awards/:operator_id", get(operator_endpoint))
        .with_state(state)
}

/// Award routes plus the health, readiness and metrics probes.
pub fn with_service_routes(state: AwardState) -> Router {
    award_router(state)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub async fn summits_endpoint(State(state): State<AwardState>) -> Json<SummitListResponse> {
    Json(SummitListResponse {
        overview: state.catalog.overview(),
        summits: state.catalog.summits().to_vec(),
    })
}

pub async fn honour_roll_endpoint(
    State(state): State<AwardState>,
    Query(query): Query<HonourRollQuery>,
) -> Json<HonourRollResponse> {
    let entries = match query.search.as_deref() {
        Some(term) => state.roll.search_entries(term),
        None => state.roll.entries(),
    };

    Json(HonourRollResponse {
        generated_at: state.generated_at,
        total_operators: state.roll.summaries().len(),
        entries,
    })
}

pub async fn operators_endpoint(State(state): State<AwardState>) -> Json<Vec<OperatorListing>> {
    Json(
        state
            .roll
            .alphabetical()
            .into_iter()
            .map(|summary| OperatorListing {
                operator_id: summary.operator_id,
                callsign: summary.callsign.clone(),
            })
            .collect(),
    )
}

pub async fn operator_endpoint(
    State(state): State<AwardState>,
    Path(operator_id): Path<u64>,
) -> Result<Json<AwardSummary>, AppError> {
    let operator = OperatorId(operator_id);
    state
        .roll
        .operator(operator)
        .cloned()
        .map(Json)
        .ok_or(AppError::OperatorNotFound(operator))
}

/// Computes summaries from uploaded exports without touching the served
/// honour roll.
pub async fn compute_endpoint(
    State(state): State<AwardState>,
    Json(payload): Json<ComputeRequest>,
) -> Result<Json<ComputeResponse>, AppError> {
    let ComputeRequest {
        catalog_csv,
        activations_csv,
        callsigns_csv,
        date_range,
    } = payload;

    let catalog = CatalogImporter::from_reader(Cursor::new(catalog_csv.into_bytes()))?;
    let batch = ActivationCsvImporter::from_reader(Cursor::new(activations_csv.into_bytes()))?;
    let directory = callsigns_csv
        .map(|csv| InMemoryCallsignDirectory::from_reader(Cursor::new(csv.into_bytes())))
        .transpose()?;

    let thresholds = state.rules.thresholds_for(catalog.len());
    let mut engine = AwardEngine::new(&catalog, &thresholds)
        .with_date_range(date_range.unwrap_or(state.rules.date_range));
    if let Some(directory) = directory.as_ref() {
        engine = engine.with_directory(directory);
    }

    let summaries = engine.aggregate(&batch.records);
    Ok(Json(ComputeResponse {
        operators: summaries.len(),
        rejected: batch.rejected,
        summaries,
    }))
}
