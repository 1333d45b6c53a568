use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use pmrt_calc::calculator::{
    CalculationReport, FormField, FormSubmission, ScoreResult, SentinelMode,
};
use pmrt_calc::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub(crate) struct ModelListResponse {
    pub(crate) default_model: String,
    pub(crate) models: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FormResponse {
    pub(crate) model: String,
    pub(crate) outcome_label: String,
    pub(crate) sentinel_mode: SentinelMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) intercept: Option<f64>,
    pub(crate) fields: Vec<FormField>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScoreRequest {
    /// Raw answers; absent features count as unknown.
    #[serde(default)]
    pub(crate) inputs: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) model: String,
    pub(crate) evaluated_at: DateTime<Utc>,
    pub(crate) submission: FormSubmission,
    pub(crate) result: ScoreResult,
    pub(crate) report: CalculationReport,
    pub(crate) calculation: Vec<String>,
}

pub(crate) fn calculator_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/models", get(list_models_endpoint))
        .route("/api/v1/models/:model/form", get(form_endpoint))
        .route("/api/v1/models/:model/score", post(score_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
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

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn list_models_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<ModelListResponse> {
    Json(ModelListResponse {
        default_model: state.default_model.to_string(),
        models: state.registry.names().map(str::to_string).collect(),
    })
}

pub(crate) async fn form_endpoint(
    Extension(state): Extension<AppState>,
    Path(model): Path<String>,
) -> Result<Json<FormResponse>, AppError> {
    let assets = state.registry.get(&model)?;
    let engine = assets.form(&state.variant)?;

    Ok(Json(FormResponse {
        model: assets.name.clone(),
        outcome_label: state.variant.outcome_label.clone(),
        sentinel_mode: state.variant.sentinel_mode,
        intercept: engine.intercept_row(),
        fields: engine.fields()?,
    }))
}

pub(crate) async fn score_endpoint(
    Extension(state): Extension<AppState>,
    Path(model): Path<String>,
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let assets = state.registry.get(&model)?;
    let calculation = assets.calculate(&state.variant, &payload.inputs)?;
    let report = CalculationReport::build(&assets, &state.variant, &calculation)?;

    Ok(Json(ScoreResponse {
        model: assets.name.clone(),
        evaluated_at: Utc::now(),
        calculation: report.calculation_lines(),
        submission: calculation.submission,
        result: calculation.result,
        report,
    }))
}
