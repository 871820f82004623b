//! Leg types.
//!
//! A `Leg` is one movement segment of a trip: either an unscheduled
//! [`IndividualLeg`] (walking, cycling, a transfer) or a scheduled
//! [`PublicLeg`] on a line. Both are immutable once built, apart from a path
//! that may be attached later.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::path::serde_path;
use super::{DomainError, Line, Location, Point, Stop, TemporalValue};

/// Kind of unscheduled movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndividualKind {
    Walk,
    Bike,
    Car,
    Transfer,
    CheckIn,
    CheckOut,
}

/// An unscheduled movement with explicit times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualLeg {
    kind: IndividualKind,
    departure: Location,
    departure_time: TemporalValue,
    arrival: Location,
    arrival_time: TemporalValue,
    /// Metres
    #[serde(default)]
    distance: u32,
    #[serde(default, with = "serde_path")]
    path: Option<Vec<Point>>,
}

impl IndividualLeg {
    pub fn new(
        kind: IndividualKind,
        departure: Location,
        departure_time: TemporalValue,
        arrival: Location,
        arrival_time: TemporalValue,
        distance: u32,
    ) -> Self {
        Self {
            kind,
            departure,
            departure_time,
            arrival,
            arrival_time,
            distance,
            path: None,
        }
    }

    pub fn with_path(mut self, path: Vec<Point>) -> Self {
        self.path = Some(path);
        self
    }

    pub fn kind(&self) -> IndividualKind {
        self.kind
    }

    pub fn departure(&self) -> &Location {
        &self.departure
    }

    pub fn arrival(&self) -> &Location {
        &self.arrival
    }

    pub fn departure_time(&self) -> TemporalValue {
        self.departure_time
    }

    pub fn arrival_time(&self) -> TemporalValue {
        self.arrival_time
    }

    /// Distance in metres.
    pub fn distance(&self) -> u32 {
        self.distance
    }

    pub fn path(&self) -> Option<&[Point]> {
        self.path.as_deref()
    }

    pub fn duration(&self) -> Duration {
        self.arrival_time - self.departure_time
    }

    /// Duration in whole minutes, truncated.
    pub fn min(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// A copy of this leg moved to depart at `departure_time`.
    ///
    /// Duration, distance and path are kept exactly.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_trips::domain::{IndividualKind, IndividualLeg, Location, TemporalValue};
    ///
    /// let t = |min: i64| TemporalValue::new(1_710_489_600_000 + min * 60_000, 0);
    /// let walk = IndividualLeg::new(
    ///     IndividualKind::Walk,
    ///     Location::station("1", "A"),
    ///     t(35),
    ///     Location::station("2", "B"),
    ///     t(45),
    ///     600,
    /// );
    ///
    /// let shifted = walk.departing_at(t(40));
    /// assert_eq!(shifted.departure_time(), t(40));
    /// assert_eq!(shifted.arrival_time(), t(50));
    /// assert_eq!(shifted.min(), 10);
    /// assert_eq!(shifted.distance(), 600);
    /// ```
    pub fn departing_at(&self, departure_time: TemporalValue) -> Self {
        let shift = departure_time - self.departure_time;
        Self {
            departure_time,
            arrival_time: self.arrival_time + shift,
            ..self.clone()
        }
    }
}

/// Opaque backend reference to a vehicle journey.
///
/// Only compared and hashed; never interpreted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JourneyRef(String);

impl JourneyRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JourneyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JourneyRef({})", self.0)
    }
}

/// A scheduled movement on a line.
///
/// Departure and arrival times are validated at construction so the leg's
/// time accessors never fail.
///
/// # Invariants
///
/// - The departure stop has a planned or predicted departure
/// - The arrival stop has a planned or predicted arrival
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PublicLegRecord")]
pub struct PublicLeg {
    line: Line,
    destination: Option<Location>,
    departure_stop: Stop,
    arrival_stop: Stop,
    intermediate_stops: Vec<Stop>,
    message: Option<String>,
    journey_ref: Option<JourneyRef>,
    entry_location: Option<Location>,
    exit_location: Option<Location>,
    #[serde(with = "serde_path")]
    path: Option<Vec<Point>>,
    // Cached validated times
    #[serde(skip_serializing)]
    departure: TemporalValue,
    #[serde(skip_serializing)]
    arrival: TemporalValue,
}

#[derive(Deserialize)]
struct PublicLegRecord {
    line: Line,
    #[serde(default)]
    destination: Option<Location>,
    departure_stop: Stop,
    arrival_stop: Stop,
    #[serde(default)]
    intermediate_stops: Vec<Stop>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    journey_ref: Option<JourneyRef>,
    #[serde(default)]
    entry_location: Option<Location>,
    #[serde(default)]
    exit_location: Option<Location>,
    #[serde(default, with = "serde_path")]
    path: Option<Vec<Point>>,
}

impl TryFrom<PublicLegRecord> for PublicLeg {
    type Error = DomainError;

    fn try_from(r: PublicLegRecord) -> Result<Self, Self::Error> {
        let mut leg = PublicLeg::new(r.line, r.destination, r.departure_stop, r.arrival_stop)?;
        leg.intermediate_stops = r.intermediate_stops;
        leg.message = r.message;
        leg.journey_ref = r.journey_ref;
        leg.entry_location = r.entry_location;
        leg.exit_location = r.exit_location;
        leg.path = r.path;
        Ok(leg)
    }
}

impl PublicLeg {
    /// Construct a leg, validating that the boundary stops carry times.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MissingTime` if the departure stop has no
    /// departure time or the arrival stop has no arrival time.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_trips::domain::{Line, Location, Product, PublicLeg, Stop, TemporalValue};
    ///
    /// let t = |min: i64| TemporalValue::new(1_710_489_600_000 + min * 60_000, 60);
    /// let line = Line::new(None, Some("BVG".into()), Some(Product::Subway), Some("U2".into()));
    ///
    /// let dep = Stop::new(Location::station("1", "Alexanderplatz")).with_departure(Some(t(0)), None);
    /// let arr = Stop::new(Location::station("2", "Potsdamer Platz")).with_arrival(Some(t(9)), Some(t(11)));
    ///
    /// let leg = PublicLeg::new(line.clone(), None, dep, arr).unwrap();
    /// assert_eq!(leg.arrival_time(false), t(11));
    /// assert_eq!(leg.arrival_time(true), t(9));
    ///
    /// let no_time = Stop::new(Location::station("1", "Alexanderplatz"));
    /// let arr = Stop::new(Location::station("2", "Potsdamer Platz")).with_arrival(Some(t(9)), None);
    /// assert!(PublicLeg::new(line, None, no_time, arr).is_err());
    /// ```
    pub fn new(
        line: Line,
        destination: Option<Location>,
        departure_stop: Stop,
        arrival_stop: Stop,
    ) -> Result<Self, DomainError> {
        let departure = departure_stop
            .resolve_departure(false)
            .ok_or(DomainError::MissingTime("departure stop departure"))?;
        let arrival = arrival_stop
            .resolve_arrival(false)
            .ok_or(DomainError::MissingTime("arrival stop arrival"))?;

        Ok(Self {
            line,
            destination,
            departure_stop,
            arrival_stop,
            intermediate_stops: Vec::new(),
            message: None,
            journey_ref: None,
            entry_location: None,
            exit_location: None,
            path: None,
            departure,
            arrival,
        })
    }

    pub fn with_intermediate_stops(mut self, stops: Vec<Stop>) -> Self {
        self.intermediate_stops = stops;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_journey_ref(mut self, journey_ref: JourneyRef) -> Self {
        self.journey_ref = Some(journey_ref);
        self
    }

    pub fn with_path(mut self, path: Vec<Point>) -> Self {
        self.path = Some(path);
        self
    }

    /// Attach entry/exit locations reported by the backend, reconciled
    /// against this leg's own stops.
    ///
    /// The entry is matched against the departure stop and intermediates.
    /// When no exit is given and the entry did not match there, it is
    /// matched against the arrival stop as well.
    pub fn with_boarding(mut self, entry: Option<Location>, exit: Option<Location>) -> Self {
        self.entry_location = entry.map(|candidate| {
            if let Some(found) = self.match_boarding(&candidate, &self.departure_stop.location) {
                return found.clone();
            }
            if exit.is_none() {
                if let Some(found) = self.match_boarding(&candidate, &self.arrival_stop.location) {
                    return found.clone();
                }
            }
            candidate
        });
        self.exit_location = exit.map(|candidate| {
            self.reconcile_boarding_location(candidate, &self.arrival_stop.location)
        });
        self
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn destination(&self) -> Option<&Location> {
        self.destination.as_ref()
    }

    pub fn departure_stop(&self) -> &Stop {
        &self.departure_stop
    }

    pub fn arrival_stop(&self) -> &Stop {
        &self.arrival_stop
    }

    pub fn intermediate_stops(&self) -> &[Stop] {
        &self.intermediate_stops
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn journey_ref(&self) -> Option<&JourneyRef> {
        self.journey_ref.as_ref()
    }

    pub fn entry_location(&self) -> Option<&Location> {
        self.entry_location.as_ref()
    }

    pub fn exit_location(&self) -> Option<&Location> {
        self.exit_location.as_ref()
    }

    pub fn path(&self) -> Option<&[Point]> {
        self.path.as_deref()
    }

    /// Departure time, choosing between planned and predicted.
    pub fn departure_time(&self, prefer_planned: bool) -> TemporalValue {
        self.departure_stop
            .resolve_departure(prefer_planned)
            .unwrap_or(self.departure)
    }

    /// Arrival time, choosing between planned and predicted.
    pub fn arrival_time(&self, prefer_planned: bool) -> TemporalValue {
        self.arrival_stop
            .resolve_arrival(prefer_planned)
            .unwrap_or(self.arrival)
    }

    /// Planned departure, if the backend supplied one.
    pub fn planned_departure(&self) -> Option<TemporalValue> {
        self.departure_stop.planned_departure
    }

    /// Planned arrival, if the backend supplied one.
    pub fn planned_arrival(&self) -> Option<TemporalValue> {
        self.arrival_stop.planned_arrival
    }

    pub fn departure_delay(&self) -> Option<Duration> {
        self.departure_stop.departure_delay()
    }

    pub fn arrival_delay(&self) -> Option<Duration> {
        self.arrival_stop.arrival_delay()
    }

    /// Returns true if boarding or alighting is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.departure_stop.departure_cancelled || self.arrival_stop.arrival_cancelled
    }

    /// All stops in travel order.
    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        std::iter::once(&self.departure_stop)
            .chain(&self.intermediate_stops)
            .chain(std::iter::once(&self.arrival_stop))
    }

    /// Finds the stop whose location id equals `location`'s id.
    ///
    /// No name fallback; a location without an id matches nothing.
    pub fn find_stop_by_location(&self, location: &Location) -> Option<&Stop> {
        self.stops().find(|stop| stop.location.same_id(location))
    }

    /// Whether `stop` comes strictly after `other` on this leg.
    ///
    /// Decided in a single pass over the intermediates: whichever of the two
    /// is seen first fixes the order. A stop not found on the leg is never
    /// "after" anything.
    pub fn is_stop_after_other(&self, stop: &Stop, other: &Stop) -> bool {
        if stop.location.same_id(&other.location) {
            return false;
        }
        if stop.location.same_id(&self.departure_stop.location) {
            return false;
        }
        if other.location.same_id(&self.departure_stop.location) {
            return true;
        }

        let mut other_seen = false;
        for intermediate in &self.intermediate_stops {
            if intermediate.location.same_id(&other.location) {
                other_seen = true;
            } else if intermediate.location.same_id(&stop.location) {
                return other_seen;
            }
        }
        false
    }

    /// Map a backend-reported boarding location onto this leg's own stop
    /// records.
    ///
    /// Tries `stop_location` then each intermediate by id, then the same
    /// candidates by name and place. Returns `candidate` unchanged if
    /// nothing matches.
    pub fn reconcile_boarding_location(
        &self,
        candidate: Location,
        stop_location: &Location,
    ) -> Location {
        match self.match_boarding(&candidate, stop_location) {
            Some(found) => found.clone(),
            None => candidate,
        }
    }

    fn match_boarding<'a>(
        &'a self,
        candidate: &Location,
        stop_location: &'a Location,
    ) -> Option<&'a Location> {
        let candidates = || {
            std::iter::once(stop_location).chain(self.intermediate_stops.iter().map(|s| &s.location))
        };
        candidates()
            .find(|loc| loc.same_id(candidate))
            .or_else(|| candidates().find(|loc| loc.same_name_and_place(candidate)))
    }
}

/// One movement segment of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "leg", rename_all = "snake_case")]
pub enum Leg {
    Individual(IndividualLeg),
    Public(PublicLeg),
}

impl Leg {
    pub fn is_public(&self) -> bool {
        matches!(self, Leg::Public(_))
    }

    pub fn as_public(&self) -> Option<&PublicLeg> {
        match self {
            Leg::Public(leg) => Some(leg),
            Leg::Individual(_) => None,
        }
    }

    pub fn as_individual(&self) -> Option<&IndividualLeg> {
        match self {
            Leg::Individual(leg) => Some(leg),
            Leg::Public(_) => None,
        }
    }

    pub fn departure_location(&self) -> &Location {
        match self {
            Leg::Individual(leg) => &leg.departure,
            Leg::Public(leg) => &leg.departure_stop.location,
        }
    }

    pub fn arrival_location(&self) -> &Location {
        match self {
            Leg::Individual(leg) => &leg.arrival,
            Leg::Public(leg) => &leg.arrival_stop.location,
        }
    }

    /// Departure time, predicted where available.
    pub fn departure_time(&self) -> TemporalValue {
        match self {
            Leg::Individual(leg) => leg.departure_time,
            Leg::Public(leg) => leg.departure_time(false),
        }
    }

    /// Arrival time, predicted where available.
    pub fn arrival_time(&self) -> TemporalValue {
        match self {
            Leg::Individual(leg) => leg.arrival_time,
            Leg::Public(leg) => leg.arrival_time(false),
        }
    }

    /// Earliest plausible departure.
    pub fn min_time(&self) -> TemporalValue {
        match self {
            Leg::Individual(leg) => leg.departure_time,
            Leg::Public(leg) => leg.departure_stop.min_time().unwrap_or(leg.departure),
        }
    }

    /// Latest plausible arrival.
    pub fn max_time(&self) -> TemporalValue {
        match self {
            Leg::Individual(leg) => leg.arrival_time,
            Leg::Public(leg) => leg.arrival_stop.max_time().unwrap_or(leg.arrival),
        }
    }

    pub fn path(&self) -> Option<&[Point]> {
        match self {
            Leg::Individual(leg) => leg.path(),
            Leg::Public(leg) => leg.path(),
        }
    }

    /// Attach a lazily computed path.
    pub fn set_path(&mut self, path: Vec<Point>) {
        match self {
            Leg::Individual(leg) => leg.path = Some(path),
            Leg::Public(leg) => leg.path = Some(path),
        }
    }
}

impl From<IndividualLeg> for Leg {
    fn from(leg: IndividualLeg) -> Self {
        Leg::Individual(leg)
    }
}

impl From<PublicLeg> for Leg {
    fn from(leg: PublicLeg) -> Self {
        Leg::Public(leg)
    }
}
