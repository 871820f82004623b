//! Results returned through the provider contract.
//!
//! Unknown and ambiguous locations are expected outcomes of planning, so
//! they are statuses here rather than errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PaginationContext;
use crate::domain::{
    DomainError, JourneyRef, Line, Location, NetworkId, Position, SeatCapacity, TemporalValue,
    Trip,
};

/// Metadata about the backend response a result was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultHeader {
    pub network: NetworkId,
    /// Backend software name/version, if reported
    #[serde(default)]
    pub server_product: Option<String>,
    /// Backend clock, if reported
    #[serde(default)]
    pub server_time: Option<TemporalValue>,
    pub created_at: DateTime<Utc>,
}

impl ResultHeader {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            server_product: None,
            server_time: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_server(mut self, product: impl Into<String>, time: Option<TemporalValue>) -> Self {
        self.server_product = Some(product.into());
        self.server_time = time;
        self
    }
}

/// Outcome of a trip query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryTripsStatus {
    Ok,
    NoTrips,
    /// One or more endpoints matched several locations
    Ambiguous {
        #[serde(default)]
        from: Vec<Location>,
        #[serde(default)]
        via: Vec<Location>,
        #[serde(default)]
        to: Vec<Location>,
    },
    UnknownFrom,
    UnknownVia,
    UnknownTo,
    InvalidDate,
    TooClose,
    ServiceDown,
}

/// Result of `query_trips` and `query_more_trips`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTripsResult {
    pub header: ResultHeader,
    pub status: QueryTripsStatus,
    /// Endpoints as the backend resolved them
    #[serde(default)]
    pub from: Option<Location>,
    #[serde(default)]
    pub via: Option<Location>,
    #[serde(default)]
    pub to: Option<Location>,
    /// Continuation state; only set by the initial query
    #[serde(default)]
    pub context: Option<PaginationContext>,
    #[serde(default)]
    pub trips: Vec<Trip>,
}

impl QueryTripsResult {
    /// A successful result.
    pub fn ok(
        header: ResultHeader,
        from: Location,
        via: Option<Location>,
        to: Location,
        context: Option<PaginationContext>,
        trips: Vec<Trip>,
    ) -> Self {
        Self {
            header,
            status: QueryTripsStatus::Ok,
            from: Some(from),
            via,
            to: Some(to),
            context,
            trips,
        }
    }

    /// A result carrying only a status.
    pub fn with_status(header: ResultHeader, status: QueryTripsStatus) -> Self {
        Self {
            header,
            status,
            from: None,
            via: None,
            to: None,
            context: None,
            trips: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == QueryTripsStatus::Ok
    }
}

/// A suggestion with the backend's ranking weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedLocation {
    pub location: Location,
    /// Higher is better
    #[serde(default)]
    pub priority: i32,
}

impl SuggestedLocation {
    pub fn new(location: Location, priority: i32) -> Self {
        Self { location, priority }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestStatus {
    Ok,
    ServiceDown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestLocationsResult {
    pub header: ResultHeader,
    pub status: SuggestStatus,
    /// Best first
    pub suggested: Vec<SuggestedLocation>,
}

impl SuggestLocationsResult {
    /// Build a result, ordering suggestions by descending priority.
    ///
    /// Ties keep backend order.
    pub fn new(header: ResultHeader, mut suggested: Vec<SuggestedLocation>) -> Self {
        suggested.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self {
            header,
            status: SuggestStatus::Ok,
            suggested,
        }
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.suggested.iter().map(|s| &s.location)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NearbyLocationsStatus {
    Ok,
    InvalidId,
    ServiceDown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyLocationsResult {
    pub header: ResultHeader,
    pub status: NearbyLocationsStatus,
    /// Nearest first
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryDeparturesStatus {
    Ok,
    InvalidStation,
    ServiceDown,
}

/// One departure from a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    #[serde(default)]
    pub planned_time: Option<TemporalValue>,
    #[serde(default)]
    pub predicted_time: Option<TemporalValue>,
    pub line: Line,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub destination: Option<Location>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub journey_ref: Option<JourneyRef>,
    #[serde(default)]
    pub capacity: Option<SeatCapacity>,
}

impl Departure {
    /// # Errors
    ///
    /// Returns `DomainError::MissingTime` if neither time is known.
    pub fn new(
        planned_time: Option<TemporalValue>,
        predicted_time: Option<TemporalValue>,
        line: Line,
        destination: Option<Location>,
    ) -> Result<Self, DomainError> {
        if planned_time.is_none() && predicted_time.is_none() {
            return Err(DomainError::MissingTime("departure time"));
        }
        Ok(Self {
            planned_time,
            predicted_time,
            line,
            position: None,
            destination,
            message: None,
            journey_ref: None,
            capacity: None,
        })
    }

    /// Predicted time if known, else planned.
    pub fn time(&self) -> Option<TemporalValue> {
        self.predicted_time.or(self.planned_time)
    }
}

/// A line serving a stop, with the destination it runs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDestination {
    pub line: Line,
    #[serde(default)]
    pub destination: Option<Location>,
}

/// Departures grouped under the stop they leave from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationDepartures {
    pub location: Location,
    /// Ordered by time
    pub departures: Vec<Departure>,
    #[serde(default)]
    pub lines: Option<Vec<LineDestination>>,
}

impl StationDepartures {
    /// Group departures under a stop, sorted by time.
    pub fn new(location: Location, mut departures: Vec<Departure>) -> Self {
        departures.sort_by_key(Departure::time);
        Self {
            location,
            departures,
            lines: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDeparturesResult {
    pub header: ResultHeader,
    pub status: QueryDeparturesStatus,
    pub station_departures: Vec<StationDepartures>,
}

impl QueryDeparturesResult {
    /// Departures for the stop with this id, if present.
    pub fn find_station_departures(&self, stop_id: &str) -> Option<&StationDepartures> {
        self.station_departures
            .iter()
            .find(|s| s.location.id.as_deref() == Some(stop_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;

    fn header() -> ResultHeader {
        ResultHeader::new(NetworkId::parse("VBB").unwrap())
    }

    fn at(minutes: i64) -> TemporalValue {
        TemporalValue::new(1_710_489_600_000 + minutes * 60_000, 60)
    }

    #[test]
    fn ambiguous_status_carries_candidates() {
        let status = QueryTripsStatus::Ambiguous {
            from: vec![
                Location::station("1", "Hauptbahnhof").with_place("Berlin"),
                Location::station("2", "Hauptbahnhof").with_place("Potsdam"),
            ],
            via: vec![],
            to: vec![],
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["code"], "AMBIGUOUS");
        assert_eq!(json["from"].as_array().map(Vec::len), Some(2));

        let json = serde_json::to_value(QueryTripsStatus::UnknownVia).unwrap();
        assert_eq!(json, serde_json::json!({ "code": "UNKNOWN_VIA" }));
    }

    #[test]
    fn status_only_result() {
        let result = QueryTripsResult::with_status(header(), QueryTripsStatus::TooClose);
        assert!(!result.is_ok());
        assert!(result.trips.is_empty());
        assert!(result.context.is_none());
    }

    #[test]
    fn suggestions_sorted_by_priority() {
        let result = SuggestLocationsResult::new(
            header(),
            vec![
                SuggestedLocation::new(Location::station("a", "A"), 1),
                SuggestedLocation::new(Location::station("b", "B"), 5),
                SuggestedLocation::new(Location::station("c", "C"), 1),
            ],
        );
        let ids: Vec<_> = result.locations().filter_map(|l| l.id.as_deref()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn departure_needs_a_time() {
        let line = Line::new(None, None, Some(Product::Bus), Some("M41".into()));
        assert_eq!(
            Departure::new(None, None, line.clone(), None),
            Err(DomainError::MissingTime("departure time"))
        );

        let dep = Departure::new(Some(at(0)), Some(at(2)), line, None).unwrap();
        assert_eq!(dep.time(), Some(at(2)));
    }

    #[test]
    fn station_departures_sorted() {
        let line = Line::new(None, None, Some(Product::Bus), Some("M41".into()));
        let later = Departure::new(Some(at(10)), None, line.clone(), None).unwrap();
        let sooner = Departure::new(Some(at(8)), Some(at(5)), line, None).unwrap();

        let station = StationDepartures::new(Location::station("s", "S"), vec![later, sooner]);
        assert_eq!(station.departures[0].time(), Some(at(5)));

        let result = QueryDeparturesResult {
            header: header(),
            status: QueryDeparturesStatus::Ok,
            station_departures: vec![station],
        };
        assert!(result.find_station_departures("s").is_some());
        assert!(result.find_station_departures("t").is_none());
    }
}
