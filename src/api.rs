// Sales Explorer - REST API
// Read-only JSON endpoints over a shared session; criteria travel in the query string

use crate::aggregate::{aggregate_by, AggregateTable, KeyField};
use crate::dashboard::{Dashboard, Session};
use crate::export::{
    to_csv_bytes, CATEGORY_FILE, DATA_FILE, PIVOT_FILE, REGION_FILE, TIME_SERIES_FILE,
};
use crate::filter::{parse_selection, FilterCriteria};
use crate::pivot::{pivot_with, Measure, PivotAgg, PivotTable};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Error returned by handlers, rendered in the `ApiResponse` envelope
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, "{}", self.message);
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// Query parameters
// ============================================================================

/// Filter criteria as they arrive in the query string.
/// `regions`, `states` and `cities` are comma separated.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    from: Option<String>,
    to: Option<String>,
    regions: Option<String>,
    states: Option<String>,
    cities: Option<String>,
}

impl FilterQuery {
    fn parse_date(field: &str, value: &Option<String>) -> Result<Option<NaiveDate>, ApiError> {
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| {
                    ApiError::bad_request(format!(
                        "Invalid '{}' date '{}', expected YYYY-MM-DD",
                        field, text
                    ))
                }),
        }
    }

    fn into_criteria(self, session: &Session) -> Result<FilterCriteria, ApiError> {
        let from = Self::parse_date("from", &self.from)?;
        let to = Self::parse_date("to", &self.to)?;
        let selection = |v: &Option<String>| v.as_deref().map(parse_selection).unwrap_or_default();

        Ok(FilterCriteria::within(session.dataset(), from, to)
            .with_regions(selection(&self.regions))
            .with_states(selection(&self.states))
            .with_cities(selection(&self.cities)))
    }
}

/// Pivot layout; defaults to Sub-Category x Month summed sales.
#[derive(Debug, Default, Deserialize)]
pub struct PivotQuery {
    row: Option<String>,
    column: Option<String>,
    measure: Option<String>,
    agg: Option<String>,
}

fn parse_or<T>(value: &Option<String>, default: T) -> Result<T, ApiError>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    match value.as_deref() {
        None | Some("") => Ok(default),
        Some(text) => text.parse().map_err(|e: anyhow::Error| ApiError::bad_request(e.to_string())),
    }
}

fn dashboard_for(state: &AppState, query: FilterQuery) -> Result<Arc<Dashboard>, ApiError> {
    let mut session = state
        .session
        .lock()
        .map_err(|_| ApiError::internal("Session lock poisoned"))?;
    let criteria = query.into_criteria(&session)?;
    Ok(session.dashboard(&criteria))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard - Every output in one response
async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Dashboard> {
    let dashboard = dashboard_for(&state, query)?;
    Ok(Json(ApiResponse::ok(Dashboard::clone(&dashboard))))
}

/// GET /api/records - Filtered records
async fn get_records(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Vec<crate::record::SalesRecord>> {
    let dashboard = dashboard_for(&state, query)?;
    Ok(Json(ApiResponse::ok(dashboard.records.clone())))
}

/// GET /api/aggregates/:kind - category | region | segment | hierarchy
async fn get_aggregate(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<AggregateTable> {
    let dashboard = dashboard_for(&state, query)?;
    let table = match kind.as_str() {
        "category" => dashboard.by_category.clone(),
        "region" => dashboard.by_region.clone(),
        "segment" => dashboard.by_segment.clone(),
        "hierarchy" => dashboard.by_hierarchy.clone(),
        other => {
            // Any single key field is also accepted, e.g. /api/aggregates/state
            let field: KeyField = other
                .parse()
                .map_err(|_| ApiError::not_found(format!("Unknown aggregate '{}'", other)))?;
            aggregate_by(&dashboard.records, &[field])
        }
    };
    Ok(Json(ApiResponse::ok(table)))
}

/// GET /api/series/monthly - Chronological monthly sales
async fn get_monthly(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Vec<crate::series::MonthlyPoint>> {
    let dashboard = dashboard_for(&state, query)?;
    Ok(Json(ApiResponse::ok(dashboard.monthly.clone())))
}

/// GET /api/pivot - Cross-tabulation, Sub-Category x Month by default
async fn get_pivot(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
    Query(layout): Query<PivotQuery>,
) -> ApiResult<PivotTable> {
    let row = parse_or(&layout.row, KeyField::SubCategory)?;
    let column = parse_or(&layout.column, KeyField::Month)?;
    let measure = parse_or(&layout.measure, Measure::Sales)?;
    let agg = parse_or(&layout.agg, PivotAgg::Sum)?;

    let dashboard = dashboard_for(&state, query)?;
    let table = pivot_with(&dashboard.records, row, column, measure, agg);
    Ok(Json(ApiResponse::ok(table)))
}

/// GET /api/options - Cascading selector values
async fn get_options(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<crate::filter::FilterOptions> {
    let dashboard = dashboard_for(&state, query)?;
    Ok(Json(ApiResponse::ok(dashboard.options.clone())))
}

/// GET /api/export/:table - CSV download
async fn export_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, ApiError> {
    let dashboard = dashboard_for(&state, query)?;

    let (file_name, bytes) = match table.as_str() {
        "category" => (CATEGORY_FILE, to_csv_bytes(&dashboard.by_category)),
        "region" => (REGION_FILE, to_csv_bytes(&dashboard.by_region)),
        "timeseries" => (TIME_SERIES_FILE, to_csv_bytes(dashboard.monthly.as_slice())),
        "pivot" => (PIVOT_FILE, to_csv_bytes(&dashboard.sub_category_by_month)),
        "data" => (DATA_FILE, to_csv_bytes(dashboard.records.as_slice())),
        other => return Err(ApiError::not_found(format!("Unknown export '{}'", other))),
    };
    let bytes = bytes.map_err(|e| ApiError::internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

// ============================================================================
// Router
// ============================================================================

/// Build the application router
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/records", get(get_records))
        .route("/aggregates/:kind", get(get_aggregate))
        .route("/series/monthly", get(get_monthly))
        .route("/pivot", get(get_pivot))
        .route("/options", get(get_options))
        .route("/export/:table", get(export_table))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
