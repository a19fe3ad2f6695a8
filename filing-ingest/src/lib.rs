//! filing-ingest library interface
//!
//! Pipeline core for regulatory financial filings: schema transformation,
//! synthetic progress, job status polling with backoff, validation report
//! handling and the record store, plus the HTTP surface that serves them.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod transform;
pub mod utils;
pub mod validators;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use filing_common::config::ServiceConfig;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::db::RecordStore;
use crate::services::{ProgressEstimator, StatusService};
use crate::transform::Transformer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub status: StatusService,
    pub transformer: Arc<Transformer>,
    pub config: Arc<ServiceConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: ServiceConfig) -> Self {
        let estimator = ProgressEstimator::new(&config.progress);
        Self {
            status: StatusService::new(store.clone(), estimator),
            transformer: Arc::new(Transformer::new(&config.transform)),
            store,
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::session_routes())
        .merge(api::record_routes())
        .merge(api::validation_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
