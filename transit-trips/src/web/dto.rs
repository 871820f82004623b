//! Data transfer objects for web requests and responses.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::domain::{
    IndividualKind, IndividualLeg, Leg, Location, PublicLeg, Stop, TemporalValue, Trip,
    encode_path,
};
use crate::query::{
    PaginationContext, QueryTripsResult, QueryTripsStatus, StationDepartures, TripOptions,
    TripQuery,
};

/// Request to suggest locations from free text.
#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    /// Search text
    pub q: String,

    /// Maximum results (default 10)
    pub limit: Option<usize>,
}

/// Request for locations around a coordinate.
#[derive(Debug, Deserialize)]
pub struct NearbyRequest {
    pub lat: f64,
    pub lon: f64,

    /// Radius in metres (default unlimited)
    pub max_distance: Option<u32>,

    /// Maximum results (default 20)
    pub limit: Option<usize>,
}

/// Request for departures from one or more stops.
#[derive(Debug, Deserialize)]
pub struct DeparturesRequest {
    /// Comma-separated stop ids
    pub stop: String,

    /// Departures per stop (default 10)
    pub limit: Option<usize>,

    /// Include stops sharing the same name and place
    pub equivs: Option<bool>,

    /// Earliest departure, epoch milliseconds
    pub time: Option<i64>,
}

/// Response listing locations.
#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub locations: Vec<Location>,
}

/// Departures grouped per stop.
#[derive(Debug, Serialize)]
pub struct DeparturesResponse {
    pub stations: Vec<StationDepartures>,

    /// Requested stop ids the backend did not recognize
    pub invalid_stops: Vec<String>,
}

/// Request to plan trips.
#[derive(Debug, Deserialize)]
pub struct TripsRequest {
    pub query: TripQuery,

    #[serde(default)]
    pub options: TripOptions,
}

/// Request for the page before or after a previous result.
#[derive(Debug, Deserialize)]
pub struct MoreTripsRequest {
    /// Context token from a previous response
    pub context: String,

    /// Later (true) or earlier (false) trips
    #[serde(default = "default_later")]
    pub later: bool,
}

fn default_later() -> bool {
    true
}

/// Response for trip planning and pagination.
#[derive(Debug, Serialize)]
pub struct TripsResponse {
    pub status: QueryTripsStatus,

    pub from: Option<Location>,
    pub via: Option<Location>,
    pub to: Option<Location>,

    pub trips: Vec<TripResult>,

    /// Opaque token for `/trips/more`
    pub context: Option<String>,

    pub can_query_earlier: bool,
    pub can_query_later: bool,
}

/// A trip in a response.
#[derive(Debug, Serialize)]
pub struct TripResult {
    pub id: String,

    /// Key for deduplicating across pages
    pub unique_id: String,

    pub departure: String,
    pub arrival: String,

    /// Total duration in minutes
    pub duration_mins: i64,

    /// First public departure to last public arrival, in minutes
    pub public_duration_mins: Option<i64>,

    /// `None` when the trip has no public legs
    pub num_changes: Option<u32>,

    /// Product codes used
    pub products: String,

    pub travelable: bool,

    pub legs: Vec<LegResult>,
}

/// A leg of a trip.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LegResult {
    Public(PublicLegResult),
    Individual(IndividualLegResult),
}

/// A ride on a line.
#[derive(Debug, Serialize)]
pub struct PublicLegResult {
    /// Line label ("S5")
    pub line: Option<String>,

    /// Product code, `?` when unknown
    pub product: char,

    pub destination: Option<String>,

    pub departure: StopInfo,
    pub arrival: StopInfo,

    /// Intermediate stops
    pub stops: Vec<StopInfo>,

    pub cancelled: bool,

    pub message: Option<String>,
}

/// A walk, cycle, drive or transfer.
#[derive(Debug, Serialize)]
pub struct IndividualLegResult {
    pub kind: IndividualKind,

    pub from: String,
    pub to: String,

    pub departure: String,
    pub arrival: String,

    pub duration_mins: i64,

    /// Distance in metres
    pub distance: u32,

    /// Encoded path geometry
    pub path: Option<String>,
}

/// A stop along a public leg.
#[derive(Debug, Serialize)]
pub struct StopInfo {
    pub id: Option<String>,
    pub name: String,

    /// Arrival or departure time at this stop
    pub time: Option<String>,

    /// Delay in minutes, when both planned and predicted times are known
    pub delay_mins: Option<i64>,

    pub position: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Failure to read a context token.
#[derive(Debug, thiserror::Error)]
pub enum ContextTokenError {
    #[error("context token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("context token does not hold a pagination context: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a pagination context as an opaque, URL-safe token.
pub fn encode_context(context: &PaginationContext) -> Result<String, ContextTokenError> {
    let json = serde_json::to_vec(context)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token produced by [`encode_context`].
pub fn decode_context(token: &str) -> Result<PaginationContext, ContextTokenError> {
    let json = URL_SAFE_NO_PAD.decode(token.trim())?;
    Ok(serde_json::from_slice(&json)?)
}

// Conversion implementations

impl TripsResponse {
    /// Build from a query result and the context to hand back, if any.
    pub fn from_result(
        result: QueryTripsResult,
        context: Option<&PaginationContext>,
    ) -> Result<Self, ContextTokenError> {
        let token = context.map(encode_context).transpose()?;
        Ok(Self {
            status: result.status,
            from: result.from,
            via: result.via,
            to: result.to,
            trips: result.trips.iter().map(TripResult::from_trip).collect(),
            context: token,
            can_query_earlier: context.is_some_and(PaginationContext::can_query_earlier),
            can_query_later: context.is_some_and(PaginationContext::can_query_later),
        })
    }
}

impl TripResult {
    /// Create from a domain Trip.
    pub fn from_trip(trip: &Trip) -> Self {
        Self {
            id: trip.id().to_string(),
            unique_id: trip.unique_id().to_string(),
            departure: trip.first_departure_time().to_string(),
            arrival: trip.last_arrival_time().to_string(),
            duration_mins: trip.duration().num_minutes(),
            public_duration_mins: trip.public_duration().map(|d| d.num_minutes()),
            num_changes: trip.num_changes(),
            products: trip.products().to_codes(),
            travelable: trip.is_travelable(),
            legs: trip.legs().iter().map(LegResult::from_leg).collect(),
        }
    }
}

impl LegResult {
    /// Create from a domain Leg.
    pub fn from_leg(leg: &Leg) -> Self {
        match leg {
            Leg::Public(public) => LegResult::Public(PublicLegResult::from_leg(public)),
            Leg::Individual(individual) => {
                LegResult::Individual(IndividualLegResult::from_leg(individual))
            }
        }
    }
}

impl PublicLegResult {
    pub fn from_leg(leg: &PublicLeg) -> Self {
        let departure = leg.departure_stop();
        let arrival = leg.arrival_stop();

        Self {
            line: leg.line().label.clone(),
            product: leg.line().product_code(),
            destination: leg.destination().map(Location::unique_short_name),
            departure: StopInfo {
                time: departure.resolve_departure(false).map(|t| t.to_string()),
                delay_mins: departure.departure_delay().map(|d| d.num_minutes()),
                position: departure
                    .resolve_departure_position(false)
                    .map(|p| p.to_string()),
                ..StopInfo::at(departure)
            },
            arrival: StopInfo {
                time: arrival.resolve_arrival(false).map(|t| t.to_string()),
                delay_mins: arrival.arrival_delay().map(|d| d.num_minutes()),
                position: arrival.resolve_arrival_position(false).map(|p| p.to_string()),
                ..StopInfo::at(arrival)
            },
            stops: leg
                .intermediate_stops()
                .iter()
                .map(|s| StopInfo {
                    time: s
                        .resolve_arrival(false)
                        .or_else(|| s.resolve_departure(false))
                        .map(|t| t.to_string()),
                    delay_mins: s
                        .arrival_delay()
                        .or_else(|| s.departure_delay())
                        .map(|d| d.num_minutes()),
                    ..StopInfo::at(s)
                })
                .collect(),
            cancelled: leg.is_cancelled(),
            message: leg.message().map(String::from),
        }
    }
}

impl IndividualLegResult {
    pub fn from_leg(leg: &IndividualLeg) -> Self {
        Self {
            kind: leg.kind(),
            from: leg.departure().unique_short_name(),
            to: leg.arrival().unique_short_name(),
            departure: format_time(leg.departure_time()),
            arrival: format_time(leg.arrival_time()),
            duration_mins: leg.min(),
            distance: leg.distance(),
            path: leg.path().map(|p| encode_path(Some(p))),
        }
    }
}

impl StopInfo {
    /// Identity of a stop with no time information.
    fn at(stop: &Stop) -> Self {
        Self {
            id: stop.location.id.clone(),
            name: stop.location.unique_short_name(),
            time: None,
            delay_mins: None,
            position: None,
        }
    }
}

fn format_time(time: TemporalValue) -> String {
    time.to_string()
}
