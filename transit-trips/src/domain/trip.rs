//! Trip type.
//!
//! A `Trip` is an ordered, non-empty sequence of legs from origin to
//! destination, plus identities and metrics derived from those legs.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    DomainError, Fare, Leg, Location, Point, ProductSet, PublicLeg, SeatCapacity, TemporalValue,
};

/// Feasibility of one changeover between consecutive public legs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferDetails {
    /// Chance of making the connection, 0.0 to 1.0
    probability: f64,
    /// Minimum transfer time the backend assumes
    #[serde(default)]
    min_transfer_minutes: Option<u32>,
}

impl TransferDetails {
    /// Probability is clamped to `0.0..=1.0`; NaN reads as 0.
    pub fn new(probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self {
            probability,
            min_transfer_minutes: None,
        }
    }

    pub fn with_min_transfer_minutes(mut self, minutes: u32) -> Self {
        self.min_transfer_minutes = Some(minutes);
        self
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn min_transfer_minutes(&self) -> Option<u32> {
        self.min_transfer_minutes
    }
}

/// A complete itinerary.
///
/// Identity is the explicit id from the backend if there is one, otherwise a
/// substitute derived from the legs. Both the id and the cross-page
/// [`Trip::unique_id`] are computed once and cached.
///
/// Two trips are equal iff their ids are equal.
///
/// # Invariants
///
/// - At least one leg
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TripRecord")]
pub struct Trip {
    #[serde(rename = "id")]
    explicit_id: Option<String>,
    from: Location,
    to: Location,
    legs: Vec<Leg>,
    #[serde(rename = "num_changes")]
    explicit_num_changes: Option<u32>,
    fares: Vec<Fare>,
    capacity: Option<SeatCapacity>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    details_loaded: bool,
    transfer_details: Vec<TransferDetails>,
    #[serde(skip_serializing)]
    id_cache: OnceLock<String>,
    #[serde(skip_serializing)]
    unique_id_cache: OnceLock<String>,
}

#[derive(Deserialize)]
struct TripRecord {
    #[serde(default)]
    id: Option<String>,
    from: Location,
    to: Location,
    legs: Vec<Leg>,
    #[serde(default)]
    num_changes: Option<u32>,
    #[serde(default)]
    fares: Vec<Fare>,
    #[serde(default)]
    capacity: Option<SeatCapacity>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    details_loaded: bool,
    #[serde(default)]
    transfer_details: Vec<TransferDetails>,
}

impl TryFrom<TripRecord> for Trip {
    type Error = DomainError;

    fn try_from(r: TripRecord) -> Result<Self, Self::Error> {
        let mut trip = Trip::new(r.id, r.from, r.to, r.legs)?;
        trip.explicit_num_changes = r.num_changes;
        trip.fares = r.fares;
        trip.capacity = r.capacity;
        if let Some(created_at) = r.created_at {
            trip.created_at = created_at;
            trip.updated_at = created_at;
        }
        if let Some(updated_at) = r.updated_at {
            trip.updated_at = updated_at;
        }
        trip.details_loaded = r.details_loaded;
        trip.transfer_details = r.transfer_details;
        Ok(trip)
    }
}

impl Trip {
    /// Construct a trip.
    ///
    /// `explicit_id` is the backend's own id, if it supplies one.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyTrip` if `legs` is empty.
    pub fn new(
        explicit_id: Option<String>,
        from: Location,
        to: Location,
        legs: Vec<Leg>,
    ) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyTrip);
        }
        let now = Utc::now();
        Ok(Self {
            explicit_id,
            from,
            to,
            legs,
            explicit_num_changes: None,
            fares: Vec::new(),
            capacity: None,
            created_at: now,
            updated_at: now,
            details_loaded: false,
            transfer_details: Vec::new(),
            id_cache: OnceLock::new(),
            unique_id_cache: OnceLock::new(),
        })
    }

    pub fn with_num_changes(mut self, num_changes: u32) -> Self {
        self.explicit_num_changes = Some(num_changes);
        self
    }

    pub fn with_fares(mut self, fares: Vec<Fare>) -> Self {
        self.fares = fares;
        self
    }

    pub fn with_capacity(mut self, capacity: SeatCapacity) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    pub fn from(&self) -> &Location {
        &self.from
    }

    pub fn to(&self) -> &Location {
        &self.to
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn fares(&self) -> &[Fare] {
        &self.fares
    }

    pub fn capacity(&self) -> Option<&SeatCapacity> {
        self.capacity.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_details_loaded(&self) -> bool {
        self.details_loaded
    }

    pub fn transfer_details(&self) -> &[TransferDetails] {
        &self.transfer_details
    }

    /// Record fuller details fetched for a previously summarized trip.
    pub fn apply_details(&mut self, transfer_details: Vec<TransferDetails>) {
        self.transfer_details = transfer_details;
        self.details_loaded = true;
        self.updated_at = Utc::now();
    }

    /// Attach a lazily computed path to one leg.
    pub fn attach_leg_path(&mut self, index: usize, path: Vec<Point>) -> Result<(), DomainError> {
        self.legs
            .get_mut(index)
            .ok_or(DomainError::LegIndexOutOfBounds(index))?
            .set_path(path);
        Ok(())
    }

    /// The backend's id, if it supplied one.
    pub fn explicit_id(&self) -> Option<&str> {
        self.explicit_id.as_deref()
    }

    /// The trip's identity: the explicit id, or a substitute derived from
    /// the legs.
    ///
    /// Substitute ids are stable across repeated queries to one backend but
    /// not unique across backends.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_trips::domain::{IndividualKind, IndividualLeg, Location, TemporalValue, Trip};
    ///
    /// let t = |min: i64| TemporalValue::new(1_710_489_600_000 + min * 60_000, 60);
    /// let a = Location::station("A1", "A");
    /// let b = Location::station("B1", "B");
    ///
    /// let walk = IndividualLeg::new(IndividualKind::Walk, a.clone(), t(0), b.clone(), t(5), 400);
    /// let trip = Trip::new(None, a.clone(), b.clone(), vec![walk.clone().into()]).unwrap();
    /// assert_eq!(trip.id(), "A1-B1-individual");
    ///
    /// let trip = Trip::new(Some("backend-7".into()), a, b, vec![walk.into()]).unwrap();
    /// assert_eq!(trip.id(), "backend-7");
    /// ```
    pub fn id(&self) -> &str {
        if let Some(id) = &self.explicit_id {
            return id;
        }
        self.id_cache.get_or_init(|| substitute_id(&self.legs))
    }

    /// Key for deduplicating the same physical journey across result pages.
    ///
    /// Built from the public legs only. A trip without public legs falls
    /// back to [`Trip::id`].
    pub fn unique_id(&self) -> &str {
        self.unique_id_cache.get_or_init(|| {
            let keys: Vec<String> = self.public_legs().map(unique_leg_key).collect();
            if keys.is_empty() {
                self.id().to_string()
            } else {
                keys.join("/")
            }
        })
    }

    /// Number of changes between public legs.
    ///
    /// `None` for a trip with no public legs, which is distinct from zero.
    pub fn num_changes(&self) -> Option<u32> {
        if self.explicit_num_changes.is_some() {
            return self.explicit_num_changes;
        }
        let mut changes: Option<u32> = None;
        for _ in self.public_legs() {
            changes = Some(changes.map_or(0, |n| n + 1));
        }
        changes
    }

    pub fn public_legs(&self) -> impl Iterator<Item = &PublicLeg> {
        self.legs.iter().filter_map(Leg::as_public)
    }

    pub fn first_public_leg(&self) -> Option<&PublicLeg> {
        self.public_legs().next()
    }

    pub fn last_public_leg(&self) -> Option<&PublicLeg> {
        self.public_legs().last()
    }

    fn first_leg(&self) -> &Leg {
        // Safe: non-empty validated at construction
        &self.legs[0]
    }

    fn last_leg(&self) -> &Leg {
        // Safe: non-empty validated at construction
        &self.legs[self.legs.len() - 1]
    }

    pub fn first_departure_time(&self) -> TemporalValue {
        self.first_leg().departure_time()
    }

    pub fn last_arrival_time(&self) -> TemporalValue {
        self.last_leg().arrival_time()
    }

    pub fn first_departure_location(&self) -> &Location {
        self.first_leg().departure_location()
    }

    pub fn last_arrival_location(&self) -> &Location {
        self.last_leg().arrival_location()
    }

    /// Earliest plausible time over all legs.
    pub fn min_time(&self) -> TemporalValue {
        self.legs
            .iter()
            .map(Leg::min_time)
            .min()
            .unwrap_or_else(|| self.first_departure_time())
    }

    /// Latest plausible time over all legs.
    pub fn max_time(&self) -> TemporalValue {
        self.legs
            .iter()
            .map(Leg::max_time)
            .max()
            .unwrap_or_else(|| self.last_arrival_time())
    }

    /// Last leg's arrival minus first leg's departure.
    pub fn duration(&self) -> Duration {
        self.last_arrival_time() - self.first_departure_time()
    }

    /// Time from boarding the first public leg to leaving the last one.
    pub fn public_duration(&self) -> Option<Duration> {
        let first = self.first_public_leg()?;
        let last = self.last_public_leg()?;
        Some(last.arrival_time(false) - first.departure_time(false))
    }

    /// Products used by the public legs.
    pub fn products(&self) -> ProductSet {
        self.public_legs().filter_map(|leg| leg.line().product).collect()
    }

    /// Whether the trip can actually be taken.
    ///
    /// False if any public leg's boarding or alighting is cancelled, or if
    /// any leg's departure or arrival runs earlier than a time already
    /// passed.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_trips::domain::{Line, Location, Product, PublicLeg, Stop, TemporalValue, Trip};
    ///
    /// let t = |min: i64| TemporalValue::new(1_710_489_600_000 + min * 60_000, 60);
    /// let leg = |from: &str, dep: i64, to: &str, arr: i64| {
    ///     let line = Line::new(None, None, Some(Product::RegionalTrain), Some("RE1".into()));
    ///     let d = Stop::new(Location::station(from, from)).with_departure(Some(t(dep)), None);
    ///     let a = Stop::new(Location::station(to, to)).with_arrival(Some(t(arr)), None);
    ///     PublicLeg::new(line, None, d, a).unwrap().into()
    /// };
    ///
    /// let from = Location::station("A", "A");
    /// let to = Location::station("C", "C");
    ///
    /// let ok = Trip::new(None, from.clone(), to.clone(), vec![leg("A", 0, "B", 30), leg("B", 35, "C", 50)]).unwrap();
    /// assert!(ok.is_travelable());
    ///
    /// let overlap = Trip::new(None, from, to, vec![leg("A", 0, "B", 30), leg("B", 20, "C", 50)]).unwrap();
    /// assert!(!overlap.is_travelable());
    /// ```
    pub fn is_travelable(&self) -> bool {
        let mut marker: Option<TemporalValue> = None;
        for leg in &self.legs {
            if let Leg::Public(public) = leg {
                if public.is_cancelled() {
                    return false;
                }
            }
            for time in [leg.departure_time(), leg.arrival_time()] {
                if marker.is_some_and(|m| time < m) {
                    return false;
                }
                marker = Some(time);
            }
        }
        true
    }

    /// Shift individual legs that start before the previous leg ends.
    ///
    /// Returns the number of legs moved. Identities are unaffected.
    pub fn repair_individual_overlaps(&mut self) -> usize {
        let repaired = repair_individual_overlaps(&mut self.legs);
        if repaired > 0 {
            debug!(trip = %self.id(), repaired, "repaired overlapping individual legs");
        }
        repaired
    }
}

/// Forward pass over adjacent leg pairs: an individual leg departing before
/// its predecessor arrives is moved to depart at that arrival, keeping its
/// duration. Public legs are never moved.
///
/// Returns the number of legs moved.
pub fn repair_individual_overlaps(legs: &mut [Leg]) -> usize {
    let mut repaired = 0;
    for i in 1..legs.len() {
        let previous_arrival = legs[i - 1].arrival_time();
        if let Leg::Individual(leg) = &legs[i] {
            if leg.departure_time() < previous_arrival {
                legs[i] = Leg::Individual(leg.departing_at(previous_arrival));
                repaired += 1;
            }
        }
    }
    repaired
}

/// Append trips from `page` whose unique id is not already in `existing`.
///
/// Returns the number of trips added.
pub fn merge_pages(existing: &mut Vec<Trip>, page: Vec<Trip>) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(|t| t.unique_id().to_string()).collect();
    let before = existing.len();
    for trip in page {
        if seen.insert(trip.unique_id().to_string()) {
            existing.push(trip);
        }
    }
    existing.len() - before
}

fn substitute_id(legs: &[Leg]) -> String {
    let parts: Vec<String> = legs
        .iter()
        .map(|leg| {
            let mut part = format!(
                "{}-{}-",
                leg.departure_location().identity(),
                leg.arrival_location().identity()
            );
            match leg {
                Leg::Individual(_) => part.push_str("individual"),
                Leg::Public(public) => {
                    if let Some(planned) = public.planned_departure() {
                        part.push_str(&format!("{}-", planned.instant_millis()));
                    }
                    if let Some(planned) = public.planned_arrival() {
                        part.push_str(&format!("{}-", planned.instant_millis()));
                    }
                    part.push(public.line().product_code());
                    if let Some(label) = &public.line().label {
                        part.push_str(label);
                    }
                }
            }
            part
        })
        .collect();
    parts.join("|")
}

fn unique_leg_key(leg: &PublicLeg) -> String {
    let departure = leg
        .planned_departure()
        .unwrap_or_else(|| leg.departure_time(true));
    let arrival = leg
        .planned_arrival()
        .unwrap_or_else(|| leg.arrival_time(true));

    let journey = match leg.journey_ref() {
        Some(journey_ref) => {
            let mut hasher = twox_hash::xxhash3_64::Hasher::new();
            hasher.write(journey_ref.as_str().as_bytes());
            format!("{:016x}", hasher.finish())
        }
        None => {
            let line = leg.line();
            let line_key = line
                .id
                .as_deref()
                .or(line.label.as_deref())
                .unwrap_or_default();
            format!("{line_key}~{}", departure.epoch_minute())
        }
    };

    format!(
        "{journey}@{},{},{},{}",
        leg.departure_stop().location.identity(),
        departure.epoch_minute(),
        leg.arrival_stop().location.identity(),
        arrival.epoch_minute()
    )
}

impl PartialEq for Trip {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Trip {}

impl Hash for Trip {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}
