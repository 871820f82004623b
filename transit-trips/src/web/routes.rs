//! HTTP route handlers.

use std::collections::HashSet;

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::future::join_all;
use tracing::{debug, error, warn};

use crate::domain::{Location, Point, TemporalValue};
use crate::provider::{Provider, ProviderError};
use crate::query::{NearbyLocationsStatus, QueryDeparturesStatus};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<P: Provider + 'static>(state: AppState<P>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/locations/suggest", get(suggest_locations::<P>))
        .route("/locations/nearby", get(nearby_locations::<P>))
        .route("/departures", get(departures::<P>))
        .route("/trips", post(query_trips::<P>))
        .route("/trips/more", post(query_more_trips::<P>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Suggest locations matching free text.
async fn suggest_locations<P: Provider>(
    State(state): State<AppState<P>>,
    Query(req): Query<SuggestRequest>,
) -> Result<Json<LocationsResponse>, AppError> {
    let limit = req.limit.unwrap_or(10).min(50);
    let text = req.q.trim();
    if text.is_empty() {
        return Ok(Json(LocationsResponse { locations: vec![] }));
    }

    let result = state.provider.suggest_locations(text, &[], limit).await?;
    let locations = result.locations().cloned().collect();

    Ok(Json(LocationsResponse { locations }))
}

/// Locations around a coordinate, nearest first.
async fn nearby_locations<P: Provider>(
    State(state): State<AppState<P>>,
    Query(req): Query<NearbyRequest>,
) -> Result<Json<LocationsResponse>, AppError> {
    let point = Point::from_degrees(req.lat, req.lon).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    let limit = req.limit.unwrap_or(20).min(100);

    let result = state
        .provider
        .query_nearby_locations(&[], &Location::coord(point), req.max_distance.unwrap_or(0), limit)
        .await?;

    match result.status {
        NearbyLocationsStatus::Ok => Ok(Json(LocationsResponse {
            locations: result.locations,
        })),
        NearbyLocationsStatus::InvalidId => Err(AppError::BadRequest {
            message: format!("No locations known around {point}"),
        }),
        NearbyLocationsStatus::ServiceDown => Err(AppError::Upstream {
            message: "Backend service is down".to_string(),
        }),
    }
}

/// Departures from one or more stops, queried concurrently.
async fn departures<P: Provider>(
    State(state): State<AppState<P>>,
    Query(req): Query<DeparturesRequest>,
) -> Result<Json<DeparturesResponse>, AppError> {
    let stops: Vec<&str> = req
        .stop
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if stops.is_empty() {
        return Err(AppError::BadRequest {
            message: "No stop given".to_string(),
        });
    }

    let limit = req.limit.unwrap_or(10).min(100);
    let equivs = req.equivs.unwrap_or(false);
    let time = req.time.map(TemporalValue::system);

    let results = join_all(
        stops
            .iter()
            .map(|id| state.provider.query_departures(id, time, limit, equivs)),
    )
    .await;

    let mut seen = HashSet::new();
    let mut stations = Vec::new();
    let mut invalid_stops = Vec::new();

    for (id, result) in stops.iter().zip(results) {
        let result = result?;
        match result.status {
            QueryDeparturesStatus::Ok => stations.extend(
                result
                    .station_departures
                    .into_iter()
                    .filter(|s| seen.insert(s.location.identity())),
            ),
            QueryDeparturesStatus::InvalidStation => invalid_stops.push(id.to_string()),
            QueryDeparturesStatus::ServiceDown => {
                return Err(AppError::Upstream {
                    message: "Backend service is down".to_string(),
                });
            }
        }
    }

    if stations.is_empty() && invalid_stops.len() == stops.len() {
        return Err(AppError::NotFound {
            message: format!("Unknown stop: {}", req.stop),
        });
    }

    Ok(Json(DeparturesResponse {
        stations,
        invalid_stops,
    }))
}

/// Plan trips for a canonical query.
async fn query_trips<P: Provider>(
    State(state): State<AppState<P>>,
    body: Bytes,
) -> Result<Json<TripsResponse>, AppError> {
    // Parse JSON manually so we can log the body on failure
    let req: TripsRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(&body), "invalid trips request");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })?;

    let endpoints = [
        ("from", Some(&req.query.from)),
        ("via", req.query.via.as_ref()),
        ("to", Some(&req.query.to)),
    ];
    for (role, location) in endpoints {
        if location.is_some_and(|l| !l.is_identified() && !l.has_name()) {
            return Err(AppError::BadRequest {
                message: format!("Location '{role}' needs an id, a coordinate or a name"),
            });
        }
    }

    let result = state.provider.query_trips(&req.query, &req.options).await?;
    debug!(status = ?result.status, trips = result.trips.len(), "trips queried");

    let context = result.context.clone();
    Ok(Json(TripsResponse::from_result(result, context.as_ref())?))
}

/// Continue a previous trip query earlier or later.
async fn query_more_trips<P: Provider>(
    State(state): State<AppState<P>>,
    Json(req): Json<MoreTripsRequest>,
) -> Result<Json<TripsResponse>, AppError> {
    let mut context = decode_context(&req.context).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;

    let result = state
        .provider
        .query_more_trips(&mut context, req.later)
        .await?;

    Ok(Json(TripsResponse::from_result(result, Some(&context))?))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    NotImplemented { message: String },
    Upstream { message: String },
    Internal { message: String },
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        let message = e.to_string();
        match e {
            ProviderError::InvalidContext(_) => AppError::BadRequest { message },
            ProviderError::Unsupported(_) => AppError::NotImplemented { message },
            ProviderError::Io { .. } => AppError::Internal { message },
            _ => AppError::Upstream { message },
        }
    }
}

impl From<ContextTokenError> for AppError {
    fn from(e: ContextTokenError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::NotImplemented { message } => (StatusCode::NOT_IMPLEMENTED, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), %message, "request failed");
        } else {
            warn!(status = status.as_u16(), %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
