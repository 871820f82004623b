//! Provider backed by canned backend data.
//!
//! Loads a JSON fixture (from disk or over HTTP) and answers every contract
//! operation from it, building trips with the same rules a live backend
//! integration uses. Handy for development and tests without credentials.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{
    Fare, Leg, Location, LocationType, NetworkId, SeatCapacity, TemporalValue, TransferDetails,
    Trip,
};
use crate::query::{
    Departure, LineDestination, NearbyLocationsResult, NearbyLocationsStatus, PaginationContext,
    QueryDeparturesResult, QueryDeparturesStatus, QueryTripsResult, QueryTripsStatus,
    ResultHeader, StationDepartures, SuggestLocationsResult, SuggestedLocation, TripOptions,
    TripQuery,
};

use super::http::HttpClient;
use super::{Capability, Provider, ProviderError};

const CURSOR_PREFIX: &str = "page:";

/// A trip as stored in a fixture, before the provider builds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureTrip {
    #[serde(default)]
    pub id: Option<String>,
    pub legs: Vec<Leg>,
    #[serde(default)]
    pub num_changes: Option<u32>,
    #[serde(default)]
    pub fares: Vec<Fare>,
    #[serde(default)]
    pub capacity: Option<SeatCapacity>,
}

/// One page of trip results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixturePage {
    pub trips: Vec<FixtureTrip>,
}

/// Canned data for one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub network: NetworkId,
    #[serde(default)]
    pub locations: Vec<Location>,
    /// Departures keyed by stop id
    #[serde(default)]
    pub departures: BTreeMap<String, Vec<Departure>>,
    /// Trip pages, earliest first
    #[serde(default)]
    pub pages: Vec<FixturePage>,
    /// Page returned by the initial query
    #[serde(default)]
    pub initial_page: usize,
    /// Transfer details keyed by trip id
    #[serde(default)]
    pub details: BTreeMap<String, Vec<TransferDetails>>,
}

impl Fixture {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            locations: Vec::new(),
            departures: BTreeMap::new(),
            pages: Vec::new(),
            initial_page: 0,
            details: BTreeMap::new(),
        }
    }
}

/// How a query endpoint resolved against the fixture's locations.
enum Resolution {
    Found(Location),
    Ambiguous(Vec<Location>),
    Unknown,
}

/// Provider serving a [`Fixture`].
///
/// The fixture is read-only after construction; clones share it.
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    fixture: Arc<Fixture>,
}

impl FixtureProvider {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture: Arc::new(fixture),
        }
    }

    /// Load a fixture from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fixture: Fixture = serde_json::from_str(&json)
            .map_err(|e| ProviderError::format(path.display().to_string(), e, Some(&json)))?;
        Ok(Self::new(fixture))
    }

    /// Fetch a fixture over HTTP.
    pub async fn fetch(client: &HttpClient, path: &str) -> Result<Self, ProviderError> {
        let fixture: Fixture = client.get_json("fixture", path, &[]).await?;
        Ok(Self::new(fixture))
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    fn header(&self) -> ResultHeader {
        ResultHeader::new(self.fixture.network.clone()).with_server("fixture", None)
    }

    fn location_by_id(&self, id: &str) -> Option<&Location> {
        self.fixture
            .locations
            .iter()
            .find(|l| l.id.as_deref() == Some(id))
    }

    fn resolve(&self, location: &Location) -> Resolution {
        if let Some(id) = location.id.as_deref().filter(|id| !id.is_empty()) {
            return match self.location_by_id(id) {
                Some(found) => Resolution::Found(found.clone()),
                None => Resolution::Unknown,
            };
        }
        if location.has_coord() {
            return Resolution::Found(location.clone());
        }
        let Some(name) = location.name.as_deref() else {
            return Resolution::Unknown;
        };

        let mut matches: Vec<Location> = self
            .fixture
            .locations
            .iter()
            .filter(|l| {
                l.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
                    && (location.place.is_none() || l.place == location.place)
            })
            .cloned()
            .collect();

        match matches.len() {
            0 => Resolution::Unknown,
            1 => Resolution::Found(matches.remove(0)),
            _ => Resolution::Ambiguous(matches),
        }
    }

    /// Build the trips of one page that serve the given endpoints.
    fn build_page(
        &self,
        page: &FixturePage,
        from: &Location,
        via: Option<&Location>,
        to: &Location,
        options: &TripOptions,
    ) -> Vec<Trip> {
        page.trips
            .iter()
            .filter_map(|raw| self.build_trip(raw, from, to))
            .filter(|trip| serves(trip, from, via, to))
            .filter(|trip| {
                trip.public_legs()
                    .all(|leg| options.allows(leg.line().product))
            })
            .filter(|trip| match (options.max_changes, trip.num_changes()) {
                (Some(max), Some(changes)) => changes <= max,
                _ => true,
            })
            .collect()
    }

    fn build_trip(&self, raw: &FixtureTrip, from: &Location, to: &Location) -> Option<Trip> {
        let mut trip = match Trip::new(raw.id.clone(), from.clone(), to.clone(), raw.legs.clone()) {
            Ok(trip) => trip,
            Err(e) => {
                warn!(network = %self.fixture.network, error = %e, "skipping malformed fixture trip");
                return None;
            }
        };
        if let Some(changes) = raw.num_changes {
            trip = trip.with_num_changes(changes);
        }
        if let Some(capacity) = raw.capacity {
            trip = trip.with_capacity(capacity);
        }
        trip = trip.with_fares(raw.fares.clone());
        trip.repair_individual_overlaps();
        Some(trip)
    }

    /// Whether any page holds a trip between the endpoints. Works on the
    /// raw legs, so nothing is built or repaired.
    fn has_any_trip(&self, from: &Location, via: Option<&Location>, to: &Location) -> bool {
        self.fixture
            .pages
            .iter()
            .flat_map(|page| &page.trips)
            .any(|raw| legs_serve(&raw.legs, from, via, to))
    }

    fn cursor_for(&self, page: usize, later: bool) -> Option<String> {
        let next = if later {
            page.checked_add(1).filter(|n| *n < self.fixture.pages.len())
        } else {
            page.checked_sub(1)
        };
        next.map(|n| format!("{CURSOR_PREFIX}{n}"))
    }

    fn parse_cursor(&self, cursor: &str) -> Result<usize, ProviderError> {
        let page = cursor
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| ProviderError::InvalidContext(format!("unrecognized cursor {cursor:?}")))?;
        if page >= self.fixture.pages.len() {
            return Err(ProviderError::InvalidContext(format!(
                "cursor {cursor:?} past last page"
            )));
        }
        Ok(page)
    }

    fn station_departures(
        &self,
        location: &Location,
        time: Option<TemporalValue>,
        limit: usize,
    ) -> Option<StationDepartures> {
        let id = location.id.as_deref()?;
        let departures: Vec<Departure> = self
            .fixture
            .departures
            .get(id)?
            .iter()
            .filter(|d| match (time, d.time()) {
                (Some(after), Some(at)) => at >= after,
                _ => true,
            })
            .cloned()
            .collect();

        let mut station = StationDepartures::new(location.clone(), departures);
        station.departures.truncate(limit);

        let mut lines: Vec<LineDestination> = Vec::new();
        for departure in &station.departures {
            let entry = LineDestination {
                line: departure.line.clone(),
                destination: departure.destination.clone(),
            };
            if !lines.contains(&entry) {
                lines.push(entry);
            }
        }
        station.lines = Some(lines);
        Some(station)
    }
}

/// Whether a built trip runs between the endpoints (and through `via`).
fn serves(trip: &Trip, from: &Location, via: Option<&Location>, to: &Location) -> bool {
    legs_serve(trip.legs(), from, via, to)
}

fn legs_serve(legs: &[Leg], from: &Location, via: Option<&Location>, to: &Location) -> bool {
    let same = |a: &Location, b: &Location| a.identity() == b.identity();
    let (Some(first), Some(last)) = (legs.first(), legs.last()) else {
        return false;
    };
    if !same(first.departure_location(), from) || !same(last.arrival_location(), to) {
        return false;
    }
    match via {
        Some(via) => legs
            .iter()
            .any(|leg| same(leg.arrival_location(), via) || same(leg.departure_location(), via)),
        None => true,
    }
}

fn type_allowed(types: &[LocationType], kind: LocationType) -> bool {
    types.is_empty() || types.contains(&LocationType::Any) || types.contains(&kind)
}

impl Provider for FixtureProvider {
    fn network(&self) -> &NetworkId {
        &self.fixture.network
    }

    fn has_capability(&self, capability: Capability) -> bool {
        matches!(
            capability,
            Capability::Suggest
                | Capability::Trips
                | Capability::TripDetails
                | Capability::Departures
                | Capability::Nearby
        )
    }

    async fn suggest_locations(
        &self,
        text: &str,
        types: &[LocationType],
        limit: usize,
    ) -> Result<SuggestLocationsResult, ProviderError> {
        let needle = text.trim().to_lowercase();
        let suggested = self
            .fixture
            .locations
            .iter()
            .filter(|l| type_allowed(types, l.kind))
            .filter_map(|l| {
                let name = l.name.as_deref().unwrap_or_default().to_lowercase();
                let place = l.place.as_deref().unwrap_or_default().to_lowercase();
                let priority = if name == needle {
                    3
                } else if name.starts_with(&needle) {
                    2
                } else if name.contains(&needle) || place.contains(&needle) {
                    1
                } else {
                    return None;
                };
                Some(SuggestedLocation::new(l.clone(), priority))
            })
            .collect();

        let mut result = SuggestLocationsResult::new(self.header(), suggested);
        result.suggested.truncate(limit);
        debug!(network = %self.fixture.network, text, found = result.suggested.len(), "suggested locations");
        Ok(result)
    }

    async fn query_trips(
        &self,
        query: &TripQuery,
        options: &TripOptions,
    ) -> Result<QueryTripsResult, ProviderError> {
        let header = self.header();

        let from = self.resolve(&query.from);
        let via = query.via.as_ref().map(|v| self.resolve(v));
        let to = self.resolve(&query.to);

        let candidates = |r: &Resolution| match r {
            Resolution::Ambiguous(c) => c.clone(),
            _ => Vec::new(),
        };
        let any_ambiguous = matches!(from, Resolution::Ambiguous(_))
            || matches!(via, Some(Resolution::Ambiguous(_)))
            || matches!(to, Resolution::Ambiguous(_));
        if any_ambiguous {
            let status = QueryTripsStatus::Ambiguous {
                from: candidates(&from),
                via: via.as_ref().map(candidates).unwrap_or_default(),
                to: candidates(&to),
            };
            return Ok(QueryTripsResult::with_status(header, status));
        }

        let Resolution::Found(from) = from else {
            return Ok(QueryTripsResult::with_status(header, QueryTripsStatus::UnknownFrom));
        };
        let via = match via {
            Some(Resolution::Found(via)) => Some(via),
            Some(_) => {
                return Ok(QueryTripsResult::with_status(header, QueryTripsStatus::UnknownVia));
            }
            None => None,
        };
        let Resolution::Found(to) = to else {
            return Ok(QueryTripsResult::with_status(header, QueryTripsStatus::UnknownTo));
        };

        if from.identity() == to.identity() {
            return Ok(QueryTripsResult::with_status(header, QueryTripsStatus::TooClose));
        }

        if !self.has_any_trip(&from, via.as_ref(), &to) {
            let mut result = QueryTripsResult::with_status(header, QueryTripsStatus::NoTrips);
            result.from = Some(from);
            result.via = via;
            result.to = Some(to);
            return Ok(result);
        }

        let page_index = self
            .fixture
            .initial_page
            .min(self.fixture.pages.len().saturating_sub(1));
        let trips = self.build_page(
            &self.fixture.pages[page_index],
            &from,
            via.as_ref(),
            &to,
            options,
        );

        let resolved_query = TripQuery {
            from: from.clone(),
            via: via.clone(),
            to: to.clone(),
            time: query.time,
            direction: query.direction,
        };
        let context = PaginationContext::new(
            resolved_query,
            options.clone(),
            self.cursor_for(page_index, false),
            self.cursor_for(page_index, true),
        );

        debug!(
            network = %self.fixture.network,
            page = page_index,
            trips = trips.len(),
            "queried trips"
        );
        Ok(QueryTripsResult::ok(header, from, via, to, Some(context), trips))
    }

    async fn query_more_trips(
        &self,
        context: &mut PaginationContext,
        later: bool,
    ) -> Result<QueryTripsResult, ProviderError> {
        let header = self.header();
        let query = context.query().clone();

        let Some(cursor) = context.cursor(later) else {
            debug!(network = %self.fixture.network, later, "no cursor; direction exhausted");
            let mut result = QueryTripsResult::with_status(header, QueryTripsStatus::NoTrips);
            result.from = Some(query.from);
            result.via = query.via;
            result.to = Some(query.to);
            return Ok(result);
        };
        let page_index = self.parse_cursor(cursor)?;

        let trips = self.build_page(
            &self.fixture.pages[page_index],
            &query.from,
            query.via.as_ref(),
            &query.to,
            context.options(),
        );

        let next = self.cursor_for(page_index, later);
        debug!(
            network = %self.fixture.network,
            page = page_index,
            later,
            next = next.as_deref().unwrap_or("-"),
            trips = trips.len(),
            "advanced pagination context"
        );
        context.advance(later, next);

        Ok(QueryTripsResult::ok(
            header, query.from, query.via, query.to, None, trips,
        ))
    }

    async fn query_departures(
        &self,
        stop_id: &str,
        time: Option<TemporalValue>,
        limit: usize,
        equivalent_stops: bool,
    ) -> Result<QueryDeparturesResult, ProviderError> {
        let header = self.header();
        let Some(stop) = self.location_by_id(stop_id) else {
            return Ok(QueryDeparturesResult {
                header,
                status: QueryDeparturesStatus::InvalidStation,
                station_departures: Vec::new(),
            });
        };

        let mut stops = vec![stop];
        if equivalent_stops {
            stops.extend(
                self.fixture
                    .locations
                    .iter()
                    .filter(|l| !l.same_id(stop) && l.same_name_and_place(stop)),
            );
        }

        let mut seen = HashSet::new();
        let station_departures = stops
            .into_iter()
            .filter(|l| seen.insert(l.identity()))
            .filter_map(|l| self.station_departures(l, time, limit))
            .collect();

        Ok(QueryDeparturesResult {
            header,
            status: QueryDeparturesStatus::Ok,
            station_departures,
        })
    }

    async fn query_nearby_locations(
        &self,
        types: &[LocationType],
        location: &Location,
        max_distance: u32,
        limit: usize,
    ) -> Result<NearbyLocationsResult, ProviderError> {
        let header = self.header();
        let reference = match (location.coord, location.id.as_deref()) {
            (Some(coord), _) => Some(coord),
            (None, Some(id)) => self.location_by_id(id).and_then(|l| l.coord),
            (None, None) => None,
        };
        let Some(reference) = reference else {
            return Ok(NearbyLocationsResult {
                header,
                status: NearbyLocationsStatus::InvalidId,
                locations: Vec::new(),
            });
        };

        let mut nearby: Vec<(f64, &Location)> = self
            .fixture
            .locations
            .iter()
            .filter(|l| type_allowed(types, l.kind))
            .filter_map(|l| Some((reference.distance_to(&l.coord?), l)))
            .filter(|(distance, _)| max_distance == 0 || *distance <= f64::from(max_distance))
            .collect();
        nearby.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(NearbyLocationsResult {
            header,
            status: NearbyLocationsStatus::Ok,
            locations: nearby
                .into_iter()
                .take(limit)
                .map(|(_, l)| l.clone())
                .collect(),
        })
    }

    async fn load_trip_details(&self, trip: &mut Trip) -> Result<(), ProviderError> {
        let details = self
            .fixture
            .details
            .get(trip.id())
            .cloned()
            .unwrap_or_default();
        debug!(trip = %trip.id(), transfers = details.len(), "loaded trip details");
        trip.apply_details(details);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Sample fixture shared by provider and web tests.

    use super::*;
    use crate::domain::{IndividualKind, IndividualLeg, Line, Point, Product, PublicLeg, Stop};
    use crate::query::Direction;

    /// 2024-03-15 08:00 UTC
    pub(crate) const BASE: i64 = 1_710_489_600_000;

    pub(crate) fn at(minutes: i64) -> TemporalValue {
        TemporalValue::new(BASE + minutes * 60_000, 60)
    }

    pub(crate) fn station(id: &str, name: &str, lat_e6: i32, lon_e6: i32) -> Location {
        Location::station(id, name)
            .with_place("Berlin")
            .with_coord(Point::from_e6(lat_e6, lon_e6))
    }

    pub(crate) fn hbf() -> Location {
        station("hbf", "Hauptbahnhof", 52_525_592, 13_369_545)
    }

    pub(crate) fn alex() -> Location {
        station("alex", "Alexanderplatz", 52_521_508, 13_411_267)
    }

    pub(crate) fn zoo() -> Location {
        station("zoo", "Zoologischer Garten", 52_506_921, 13_332_707)
    }

    pub(crate) fn ride(
        product: Product,
        label: &str,
        from: Location,
        dep: i64,
        to: Location,
        arr: i64,
    ) -> Leg {
        let line = Line::new(None, Some("VBB".into()), Some(product), Some(label.into()));
        let d = Stop::new(from).with_departure(Some(at(dep)), None);
        let a = Stop::new(to).with_arrival(Some(at(arr)), None);
        PublicLeg::new(line, None, d, a).unwrap().into()
    }

    pub(crate) fn hbf_to_alex(dep: i64) -> FixtureTrip {
        FixtureTrip {
            id: None,
            legs: vec![ride(Product::SuburbanTrain, "S5", hbf(), dep, alex(), dep + 8)],
            num_changes: None,
            fares: vec![],
            capacity: None,
        }
    }

    pub(crate) fn bus_via_zoo(dep: i64) -> FixtureTrip {
        FixtureTrip {
            id: Some(format!("bus-{dep}")),
            legs: vec![
                ride(Product::Bus, "100", hbf(), dep, zoo(), dep + 10),
                // Transfer walk reported as starting before the bus arrives
                IndividualLeg::new(
                    IndividualKind::Transfer,
                    zoo(),
                    at(dep + 8),
                    zoo(),
                    at(dep + 11),
                    50,
                )
                .into(),
                ride(Product::Bus, "200", zoo(), dep + 15, alex(), dep + 35),
            ],
            num_changes: None,
            fares: vec![],
            capacity: None,
        }
    }

    pub(crate) fn fixture() -> Fixture {
        let mut fixture = Fixture::new(NetworkId::parse("VBB").unwrap());
        fixture.locations = vec![
            hbf(),
            alex(),
            zoo(),
            // Same name, different place
            station("alex-ffo", "Alexanderplatz", 52_340_000, 14_550_000).with_place("Frankfurt (Oder)"),
            // Second platform area of the same station
            station("alex-u", "Alexanderplatz", 52_521_000, 13_412_000),
        ];
        fixture.pages = vec![
            FixturePage {
                trips: vec![hbf_to_alex(0)],
            },
            FixturePage {
                trips: vec![hbf_to_alex(20), bus_via_zoo(22)],
            },
            FixturePage {
                trips: vec![hbf_to_alex(40), FixtureTrip { legs: vec![], ..hbf_to_alex(41) }],
            },
        ];
        fixture.initial_page = 1;

        let line = Line::new(None, Some("VBB".into()), Some(Product::Subway), Some("U2".into()));
        fixture.departures.insert(
            "alex".into(),
            vec![
                Departure::new(Some(at(10)), None, line.clone(), Some(zoo())).unwrap(),
                Departure::new(Some(at(5)), Some(at(6)), line.clone(), Some(zoo())).unwrap(),
            ],
        );
        fixture.departures.insert(
            "alex-u".into(),
            vec![Departure::new(Some(at(7)), None, line, None).unwrap()],
        );
        fixture
            .details
            .insert("bus-22".into(), vec![TransferDetails::new(0.9)]);
        fixture
    }

    pub(crate) fn provider() -> FixtureProvider {
        FixtureProvider::new(fixture())
    }

    pub(crate) fn query(from: Location, to: Location) -> TripQuery {
        TripQuery::new(from, to, at(0), Direction::DepartAfter)
    }

    pub(crate) fn by_id(id: &str) -> Location {
        Location::new(LocationType::Station, Some(id.into()))
    }

    pub(crate) fn by_name(name: &str) -> Location {
        Location::new(LocationType::Any, None).with_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::domain::{Point, Product, ProductSet};

    // Suggest tests

    #[tokio::test]
    async fn suggest_ranks_exact_matches_first() {
        let result = provider()
            .suggest_locations("alexanderplatz", &[], 10)
            .await
            .unwrap();
        assert_eq!(result.suggested.len(), 3);
        assert!(result.suggested.iter().all(|s| s.priority == 3));

        let result = provider().suggest_locations("zoo", &[], 10).await.unwrap();
        let ids: Vec<_> = result.locations().filter_map(|l| l.id.as_deref()).collect();
        assert_eq!(ids, vec!["zoo"]);
    }

    #[tokio::test]
    async fn suggest_matches_place_and_limits() {
        let result = provider().suggest_locations("frankfurt", &[], 10).await.unwrap();
        assert_eq!(result.suggested.len(), 1);

        let result = provider().suggest_locations("berlin", &[], 2).await.unwrap();
        assert_eq!(result.suggested.len(), 2);

        let result = provider()
            .suggest_locations("berlin", &[LocationType::Poi], 10)
            .await
            .unwrap();
        assert!(result.suggested.is_empty());
    }

    // Trip query tests

    #[tokio::test]
    async fn query_returns_initial_page_with_context() {
        let result = provider()
            .query_trips(&query(by_id("hbf"), by_id("alex")), &TripOptions::default())
            .await
            .unwrap();

        assert_eq!(result.status, QueryTripsStatus::Ok);
        assert_eq!(result.trips.len(), 2);
        assert_eq!(result.from.as_ref().and_then(|l| l.name.as_deref()), Some("Hauptbahnhof"));

        let context = result.context.unwrap();
        assert_eq!(context.earlier_cursor(), Some("page:0"));
        assert_eq!(context.later_cursor(), Some("page:2"));
    }

    #[tokio::test]
    async fn query_repairs_overlaps() {
        let result = provider()
            .query_trips(&query(by_id("hbf"), by_id("alex")), &TripOptions::default())
            .await
            .unwrap();

        let bus = result.trips.iter().find(|t| t.id() == "bus-22").unwrap();
        assert!(bus.is_travelable());
        let transfer = bus.legs()[1].as_individual().unwrap();
        assert_eq!(transfer.departure_time(), at(32));
        assert_eq!(transfer.arrival_time(), at(35));
        assert_eq!(bus.num_changes(), Some(1));
    }

    #[tokio::test]
    async fn query_filters_products_and_changes() {
        let only_bus = TripOptions::new().with_products(ProductSet::EMPTY.with(Product::Bus));
        let result = provider()
            .query_trips(&query(by_id("hbf"), by_id("alex")), &only_bus)
            .await
            .unwrap();
        assert_eq!(result.trips.len(), 1);
        assert_eq!(result.trips[0].id(), "bus-22");

        let direct = TripOptions::new().with_max_changes(0);
        let result = provider()
            .query_trips(&query(by_id("hbf"), by_id("alex")), &direct)
            .await
            .unwrap();
        assert_eq!(result.trips.len(), 1);
        assert_eq!(result.trips[0].num_changes(), Some(0));
    }

    #[tokio::test]
    async fn query_via() {
        let q = query(by_id("hbf"), by_id("alex")).with_via(by_id("zoo"));
        let result = provider().query_trips(&q, &TripOptions::default()).await.unwrap();
        assert_eq!(result.trips.len(), 1);
        assert_eq!(result.via.as_ref().and_then(|l| l.id.as_deref()), Some("zoo"));
    }

    #[tokio::test]
    async fn ambiguous_name_returns_candidates() {
        let result = provider()
            .query_trips(&query(by_id("hbf"), by_name("Alexanderplatz")), &TripOptions::default())
            .await
            .unwrap();

        match result.status {
            QueryTripsStatus::Ambiguous { from, via, to } => {
                assert!(from.is_empty());
                assert!(via.is_empty());
                assert_eq!(to.len(), 3);
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
        assert!(result.context.is_none());
    }

    #[tokio::test]
    async fn name_with_place_resolves() {
        let to = by_name("alexanderplatz").with_place("Frankfurt (Oder)");
        let result = provider()
            .query_trips(&query(by_id("hbf"), to), &TripOptions::default())
            .await
            .unwrap();
        // Resolved, but the fixture has no trips there
        assert_eq!(result.status, QueryTripsStatus::NoTrips);
        assert_eq!(result.to.and_then(|l| l.id), Some("alex-ffo".to_string()));
    }

    #[test]
    fn existence_check_skips_malformed_trips() {
        let p = provider();
        assert!(!legs_serve(&[], &hbf(), None, &alex()));

        assert!(p.has_any_trip(&hbf(), None, &alex()));
        assert!(p.has_any_trip(&hbf(), Some(&zoo()), &alex()));
        assert!(!p.has_any_trip(&hbf(), None, &zoo()));
        assert!(!p.has_any_trip(&alex(), None, &hbf()));

        // Only the empty-leg trip is left
        let mut fixture = fixture();
        fixture.pages = vec![FixturePage {
            trips: vec![FixtureTrip { legs: vec![], ..hbf_to_alex(0) }],
        }];
        assert!(!FixtureProvider::new(fixture).has_any_trip(&hbf(), None, &alex()));
    }

    #[tokio::test]
    async fn unknown_and_too_close() {
        let p = provider();
        let options = TripOptions::default();

        let result = p.query_trips(&query(by_id("nope"), by_id("alex")), &options).await.unwrap();
        assert_eq!(result.status, QueryTripsStatus::UnknownFrom);

        let result = p.query_trips(&query(by_id("hbf"), by_name("Nowhere")), &options).await.unwrap();
        assert_eq!(result.status, QueryTripsStatus::UnknownTo);

        let q = query(by_id("hbf"), by_id("alex")).with_via(by_id("nope"));
        let result = p.query_trips(&q, &options).await.unwrap();
        assert_eq!(result.status, QueryTripsStatus::UnknownVia);

        let result = p.query_trips(&query(by_id("hbf"), by_id("hbf")), &options).await.unwrap();
        assert_eq!(result.status, QueryTripsStatus::TooClose);
    }

    // Pagination tests

    #[tokio::test]
    async fn more_trips_advances_context_in_place() {
        let p = provider();
        let result = p
            .query_trips(&query(by_id("hbf"), by_id("alex")), &TripOptions::default())
            .await
            .unwrap();
        let mut context = result.context.unwrap();

        let later = p.query_more_trips(&mut context, true).await.unwrap();
        assert!(later.context.is_none());
        // The malformed trip on the last page is skipped
        assert_eq!(later.trips.len(), 1);
        assert!(!context.can_query_later());
        assert_eq!(context.earlier_cursor(), Some("page:0"));

        let earlier = p.query_more_trips(&mut context, false).await.unwrap();
        assert_eq!(earlier.trips.len(), 1);
        assert!(!context.can_query_earlier());

        // Exhausted directions are not rejected
        let exhausted = p.query_more_trips(&mut context, true).await.unwrap();
        assert_eq!(exhausted.status, QueryTripsStatus::NoTrips);
    }

    #[tokio::test]
    async fn pages_merge_without_duplicates() {
        let p = provider();
        let result = p
            .query_trips(&query(by_id("hbf"), by_id("alex")), &TripOptions::default())
            .await
            .unwrap();
        let mut context = result.context.unwrap();
        let mut all = result.trips;

        let later = p.query_more_trips(&mut context, true).await.unwrap();
        crate::domain::merge_pages(&mut all, later.trips.clone());
        assert_eq!(all.len(), 3);
        assert_eq!(crate::domain::merge_pages(&mut all, later.trips), 0);
    }

    #[tokio::test]
    async fn bad_cursor_is_invalid_context() {
        let p = provider();
        let q = query(by_id("hbf"), by_id("alex"));

        let mut context =
            PaginationContext::new(q.clone(), TripOptions::default(), None, Some("next".into()));
        let err = p.query_more_trips(&mut context, true).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidContext(_)));

        let mut context = PaginationContext::new(q, TripOptions::default(), None, Some("page:9".into()));
        let err = p.query_more_trips(&mut context, true).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidContext(_)));
        assert_eq!(context.later_cursor(), Some("page:9"));
    }

    // Departure tests

    #[tokio::test]
    async fn departures_sorted_and_limited() {
        let result = provider().query_departures("alex", None, 10, false).await.unwrap();
        assert_eq!(result.status, QueryDeparturesStatus::Ok);
        assert_eq!(result.station_departures.len(), 1);

        let station = &result.station_departures[0];
        assert_eq!(station.departures[0].time(), Some(at(6)));
        assert_eq!(station.lines.as_ref().map(Vec::len), Some(1));

        let result = provider().query_departures("alex", Some(at(7)), 10, false).await.unwrap();
        assert_eq!(result.station_departures[0].departures.len(), 1);

        let result = provider().query_departures("alex", None, 1, false).await.unwrap();
        assert_eq!(result.station_departures[0].departures.len(), 1);
    }

    #[tokio::test]
    async fn departures_include_equivalent_stops() {
        let result = provider().query_departures("alex", None, 10, true).await.unwrap();
        let ids: Vec<_> = result
            .station_departures
            .iter()
            .filter_map(|s| s.location.id.as_deref())
            .collect();
        assert_eq!(ids, vec!["alex", "alex-u"]);
        assert!(result.find_station_departures("alex-ffo").is_none());
    }

    #[tokio::test]
    async fn departures_unknown_stop() {
        let result = provider().query_departures("nope", None, 10, false).await.unwrap();
        assert_eq!(result.status, QueryDeparturesStatus::InvalidStation);
    }

    // Nearby tests

    #[tokio::test]
    async fn nearby_sorted_by_distance() {
        let result = provider()
            .query_nearby_locations(&[LocationType::Station], &by_id("alex"), 5_000, 10)
            .await
            .unwrap();

        let ids: Vec<_> = result.locations.iter().filter_map(|l| l.id.as_deref()).collect();
        assert_eq!(ids, vec!["alex", "alex-u", "hbf"]);
    }

    #[tokio::test]
    async fn nearby_needs_a_position() {
        let result = provider()
            .query_nearby_locations(&[], &by_name("Alexanderplatz"), 0, 10)
            .await
            .unwrap();
        assert_eq!(result.status, NearbyLocationsStatus::InvalidId);

        let result = provider()
            .query_nearby_locations(&[], &Location::coord(Point::from_e6(52_525_592, 13_369_545)), 0, 2)
            .await
            .unwrap();
        assert_eq!(result.locations.len(), 2);
        assert_eq!(result.locations[0].id.as_deref(), Some("hbf"));
    }

    // Details tests

    #[tokio::test]
    async fn load_trip_details_applies_transfers() {
        let p = provider();
        let result = p
            .query_trips(&query(by_id("hbf"), by_id("alex")), &TripOptions::default())
            .await
            .unwrap();
        let mut bus = result.trips.into_iter().find(|t| t.id() == "bus-22").unwrap();

        p.load_trip_details(&mut bus).await.unwrap();
        assert!(bus.is_details_loaded());
        assert_eq!(bus.transfer_details().len(), 1);
        assert!(p.has_capability(Capability::TripDetails));
    }

    // Loading tests

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vbb.json");
        std::fs::write(&path, serde_json::to_string(&fixture()).unwrap()).unwrap();

        let p = FixtureProvider::load(&path).unwrap();
        assert_eq!(p.network().as_str(), "VBB");
        assert_eq!(p.fixture().pages.len(), 3);
        assert_eq!(p.fixture().locations.len(), 5);
    }

    #[test]
    fn load_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"network": "vbb"}"#).unwrap();

        let err = FixtureProvider::load(&path).unwrap_err();
        assert!(matches!(err, ProviderError::Format { .. }));

        let err = FixtureProvider::load(dir.path().join("missing.json")).unwrap_err();
        match err {
            ProviderError::Io { path, source } => {
                assert!(path.ends_with("missing.json"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
