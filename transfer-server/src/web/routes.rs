//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::domain::{StationId, WayId};
use crate::feasibility::TransferAssessment;
use crate::graph::{GraphSummary, WayExplanation, explain_way};
use crate::planner::{AssembleError, JourneyRequest};
use crate::pool::PoolError;
use crate::schedule::{RealtimeFeed, ScheduleSource};
use crate::snapshot::StoreError;

use super::dto::*;
use super::state::AppState;

/// Queries shorter than this get no suggestions.
const MIN_AUTOCOMPLETE_CHARS: usize = 2;

/// Maximum number of suggestions returned.
const MAX_SUGGESTIONS: usize = 8;

/// Create the application router.
pub fn create_router<S, F>(state: AppState<S, F>) -> Router
where
    S: ScheduleSource + 'static,
    F: RealtimeFeed + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/autocomplete", get(autocomplete::<S, F>))
        .route("/api/journeys", get(journeys::<S, F>))
        .route("/api/transfer", get(transfer::<S, F>))
        .route("/api/stations/:id/graph", get(station_graph::<S, F>))
        .route("/api/stations/:id/ways/:way", get(explain::<S, F>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Station suggestions for a partial name.
async fn autocomplete<S, F>(
    State(state): State<AppState<S, F>>,
    Query(query): Query<AutocompleteQuery>,
) -> Json<Vec<StationResult>>
where
    S: ScheduleSource,
    F: RealtimeFeed,
{
    let q = query.q.trim();
    if q.chars().count() < MIN_AUTOCOMPLETE_CHARS {
        return Json(Vec::new());
    }
    let matches = state
        .assembler
        .stations()
        .autocomplete(q, MAX_SUGGESTIONS)
        .await;
    Json(matches.iter().map(StationResult::from_entry).collect())
}

/// Search transfer-checked journeys between two stations.
async fn journeys<S, F>(
    State(state): State<AppState<S, F>>,
    Query(query): Query<JourneyQuery>,
) -> Result<Json<JourneysResponse>, AppError>
where
    S: ScheduleSource,
    F: RealtimeFeed,
{
    let origin = query.origin.trim();
    let destination = query.destination.trim();
    if origin.is_empty() || destination.is_empty() {
        return Err(AppError::BadRequest {
            message: "origin and destination are required".to_string(),
        });
    }
    let departure = parse_departure(&query.time)?;

    let request = JourneyRequest {
        origin: origin.to_string(),
        destination: destination.to_string(),
        departure,
    };
    let result = state.assembler.assemble(&request).await?;
    Ok(Json(JourneysResponse::from_result(&result)))
}

/// Check one change at a station.
async fn transfer<S, F>(
    State(state): State<AppState<S, F>>,
    Query(query): Query<TransferCheckQuery>,
) -> Result<Json<TransferAssessment>, AppError>
where
    S: ScheduleSource,
    F: RealtimeFeed,
{
    let station = known_station(&state, query.station)?;
    let assessment = state
        .assembler
        .assess_transfer(
            station,
            query.arrival_platform.as_deref(),
            query.departure_platform.as_deref(),
            query.window_secs,
        )
        .await;
    Ok(Json(assessment))
}

/// Summary of a station's walkable graph.
async fn station_graph<S, F>(
    State(state): State<AppState<S, F>>,
    Path(id): Path<i64>,
) -> Result<Json<GraphSummary>, AppError>
where
    S: ScheduleSource,
    F: RealtimeFeed,
{
    let station = known_station(&state, id)?;
    let graph = state.assembler.graphs().get(station).await;
    Ok(Json(graph.summary()))
}

/// How the graph builder treats one way at a station.
async fn explain<S, F>(
    State(state): State<AppState<S, F>>,
    Path((id, way)): Path<(i64, i64)>,
) -> Result<Json<WayExplanation>, AppError>
where
    S: ScheduleSource,
    F: RealtimeFeed,
{
    let station = known_station(&state, id)?;
    let snapshot = state.snapshot();
    let config = state.assembler.graphs().graph_config().clone();
    let report = state
        .assembler
        .pool()
        .run(move || explain_way(snapshot.as_ref(), station, WayId(way), &config))
        .await??;
    Ok(Json(report))
}

fn known_station<S, F>(state: &AppState<S, F>, id: i64) -> Result<StationId, AppError> {
    let station = StationId(id);
    match state.snapshot().station(station)? {
        Some(_) => Ok(station),
        None => Err(AppError::NotFound {
            message: format!("station {id} is not in the snapshot"),
        }),
    }
}

/// Parse the requested departure time. Empty means now; a time without an
/// offset is taken as server-local time.
fn parse_departure(raw: &str) -> Result<DateTime<FixedOffset>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Local::now().fixed_offset());
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|t| t.fixed_offset())
        .ok_or_else(|| AppError::BadRequest {
            message: format!("Invalid time format: {raw:?}"),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    /// The schedule source failed
    Upstream { message: String },
    Internal { message: String },
}

impl From<AssembleError> for AppError {
    fn from(e: AssembleError) -> Self {
        match e {
            AssembleError::NotFound(_) => AppError::NotFound {
                message: e.to_string(),
            },
            AssembleError::Upstream(_) => AppError::Upstream {
                message: e.to_string(),
            },
            AssembleError::Station(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl From<PoolError> for AppError {
    fn from(e: PoolError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
