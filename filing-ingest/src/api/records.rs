//! Record handlers
//!
//! The stored payload is Wire Format. The domain and tagged endpoints are
//! views derived on read; domain edits are converted back to Wire Format and
//! keep the stored cross references.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::{
    db::RecordStore,
    error::{ApiError, ApiResult},
    models::{Record, UpsertOutcome, UpsertRecordRequest, UpsertRecordResponse, ValidationReport},
    transform::{CrossReferences, DomainFiling, TaggedFiling},
    validators::check_aggregates,
    AppState,
};

async fn load_record(state: &AppState, session_id: &str) -> ApiResult<Record> {
    state
        .store
        .get_record(session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No record for session: {}", session_id)))
}

async fn store_payload(
    state: &AppState,
    session_id: &str,
    data: &Value,
) -> ApiResult<(StatusCode, Json<UpsertRecordResponse>)> {
    let (outcome, record) = state.store.upsert_record(session_id, data).await?;
    let status = match outcome {
        UpsertOutcome::Inserted => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };

    Ok((
        status,
        Json(UpsertRecordResponse {
            session_id: record.session_id,
            outcome,
            revision: record.revision,
            updated_at: record.updated_at,
        }),
    ))
}

/// GET /records/:session_id
pub async fn get_record(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(load_record(&state, &session_id).await?.data))
}

/// PUT /records/:session_id
pub async fn put_record(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<UpsertRecordRequest>,
) -> ApiResult<(StatusCode, Json<UpsertRecordResponse>)> {
    if !request.data.is_object() {
        return Err(ApiError::BadRequest("Record data must be a JSON object".to_string()));
    }
    store_payload(&state, &session_id, &request.data).await
}

/// GET /records/:session_id/domain
pub async fn get_domain(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<DomainFiling>> {
    let record = load_record(&state, &session_id).await?;
    Ok(Json(state.transformer.to_domain(&record.data)))
}

/// PUT /records/:session_id/domain
pub async fn put_domain(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(domain): Json<Value>,
) -> ApiResult<(StatusCode, Json<UpsertRecordResponse>)> {
    // A degraded conversion would overwrite the stored record with nulls
    if !domain.is_object() {
        return Err(ApiError::BadRequest("Domain filing must be a JSON object".to_string()));
    }

    let refs = match state.store.get_record(&session_id).await? {
        Some(existing) => CrossReferences::from_wire(&existing.data),
        None => CrossReferences::default(),
    };

    let wire = state
        .transformer
        .to_wire(&domain)
        .with_cross_references(&refs);

    tracing::debug!(
        session_id = %session_id,
        kept_cross_references = !refs.is_empty(),
        "Domain edit converted to wire format"
    );

    store_payload(&state, &session_id, wire.as_value()).await
}

/// GET /records/:session_id/tagged
pub async fn get_tagged(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<TaggedFiling>> {
    let record = load_record(&state, &session_id).await?;
    let domain = state.transformer.to_domain(&record.data);
    Ok(Json(state.transformer.to_tagged(&domain)))
}

/// GET /records/:session_id/consistency
pub async fn get_consistency(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<ValidationReport>> {
    let record = load_record(&state, &session_id).await?;
    let domain = state.transformer.to_domain(&record.data);
    Ok(Json(check_aggregates(&domain)))
}

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/records/:session_id", get(get_record).put(put_record))
        .route("/records/:session_id/domain", get(get_domain).put(put_domain))
        .route("/records/:session_id/tagged", get(get_tagged))
        .route("/records/:session_id/consistency", get(get_consistency))
}
