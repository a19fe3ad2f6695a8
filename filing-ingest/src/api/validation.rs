//! POST /validation/summary
//!
//! Summarizes a validation report for display: optional search and severity
//! filters, counts, and categories in display order.

use axum::{routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::ApiResult,
    models::{Severity, ValidationReport},
    validators::report::{filter_by_severity, ordered_categories, search, summarize},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub report: ValidationReport,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

pub async fn summarize_report(
    Json(request): Json<SummaryRequest>,
) -> ApiResult<Json<Value>> {
    let mut report = request.report;
    if let Some(query) = request.query.as_deref() {
        report = search(&report, query);
    }
    if let Some(severity) = request.severity {
        report = filter_by_severity(&report, severity);
    }

    let summary = summarize(&report);
    let categories = ordered_categories(&report);

    Ok(Json(json!({
        "summary": summary,
        "is_valid": report.is_valid,
        "validation_status": report.validation_status,
        "categories": categories,
    })))
}

pub fn validation_routes() -> Router<AppState> {
    Router::new().route("/validation/summary", post(summarize_report))
}
