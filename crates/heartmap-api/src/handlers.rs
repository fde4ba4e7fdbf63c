//! Route handler functions for all API endpoints.
//!
//! Every query parameter arrives as an optional string and is coerced here,
//! so a malformed value narrows the result instead of failing the request.

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::Json;
use serde::{Deserialize, Serialize};

use heartmap_core::types::{non_blank, normalize_param, FilterOptions, HealthRecord, RecordFilters};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Query parameter types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct MapDataParams {
    pub topic: Option<String>,
    pub indicator: Option<String>,
    pub year: Option<String>,
    pub demographic: Option<String>,
}

impl MapDataParams {
    /// Convert to store filters. `None` means no record can match
    /// (a year that is not an integer).
    pub fn to_filters(&self) -> Option<RecordFilters> {
        let year = match non_blank(self.year.as_deref()) {
            Some(raw) => Some(raw.trim().parse::<i64>().ok()?),
            None => None,
        };

        Some(RecordFilters {
            topic: non_blank(self.topic.as_deref()).map(str::to_string),
            indicator: non_blank(self.indicator.as_deref()).map(str::to_string),
            year,
            demographic: non_blank(self.demographic.as_deref()).map(str::to_string),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OptionsParams {
    pub topic: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub total_records: u64,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /map-data/ - records matching every supplied filter.
pub async fn map_data(
    State(state): State<AppState>,
    Query(params): Query<MapDataParams>,
) -> Result<Json<Vec<HealthRecord>>, ApiError> {
    let Some(filters) = params.to_filters() else {
        tracing::debug!(year = ?params.year, "Non-numeric year, returning no records");
        return Ok(Json(Vec::new()));
    };

    let records = state.query_service.list_records(&filters)?;
    tracing::debug!(count = records.len(), ?filters, "Map data served");
    Ok(Json(records))
}

/// GET /options/ - distinct filter values, optionally narrowed by topic.
pub async fn options(
    State(state): State<AppState>,
    Query(params): Query<OptionsParams>,
) -> Result<Json<FilterOptions>, ApiError> {
    let topic = normalize_param(params.topic.as_deref());
    let cascade = state.config.api.cascading_options;

    let options = state.query_service.filter_options(topic, cascade)?;
    Ok(Json(options))
}

/// GET /health - liveness plus the current record count.
///
/// Answers 503 with status "unavailable" when the store cannot be read.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, total_records) = match state.query_service.stats() {
        Ok(stats) => (StatusCode::OK, "healthy", stats.total_records),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read the store");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable", 0)
        }
    };

    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        total_records,
    };
    (code, Json(body))
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
