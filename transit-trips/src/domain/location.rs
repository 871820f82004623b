//! Locations and coordinates.

use std::fmt;

use geo::{Distance, Haversine};
use serde::{Deserialize, Serialize};

use super::{DomainError, ProductSet};

/// Fixed-point scale for coordinates (micro-degrees).
const SCALE: f64 = 1e6;

/// A WGS84 coordinate stored as fixed-point micro-degrees.
///
/// Integer storage keeps coordinates hashable and makes textual identities
/// derived from them stable across repeated queries.
///
/// # Examples
///
/// ```
/// use transit_trips::domain::Point;
///
/// let p = Point::from_degrees(52.525592, 13.369545).unwrap();
/// assert_eq!(p.lat_e6(), 52_525_592);
/// assert_eq!(p.to_string(), "52.525592,13.369545");
///
/// assert!(Point::from_degrees(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    lat_e6: i32,
    lon_e6: i32,
}

impl Point {
    /// Create a point from micro-degrees.
    pub fn from_e6(lat_e6: i32, lon_e6: i32) -> Self {
        Self { lat_e6, lon_e6 }
    }

    /// Create a point from degrees, rounding to the fixed-point grid.
    pub fn from_degrees(lat: f64, lon: f64) -> Result<Self, DomainError> {
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(DomainError::InvalidCoordinate { lat, lon });
        }
        Ok(Self {
            lat_e6: (lat * SCALE).round() as i32,
            lon_e6: (lon * SCALE).round() as i32,
        })
    }

    pub fn lat_e6(&self) -> i32 {
        self.lat_e6
    }

    pub fn lon_e6(&self) -> i32 {
        self.lon_e6
    }

    pub fn lat(&self) -> f64 {
        self.lat_e6 as f64 / SCALE
    }

    pub fn lon(&self) -> f64 {
        self.lon_e6 as f64 / SCALE
    }

    /// Great-circle distance in metres.
    pub fn distance_to(&self, other: &Point) -> f64 {
        Haversine.distance(
            geo::Point::new(self.lon(), self.lat()),
            geo::Point::new(other.lon(), other.lat()),
        )
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat(), self.lon())
    }
}

/// What kind of place a location is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LocationType {
    /// Unspecified; only valid as a query input or filter
    Any,
    /// A stop or station
    Station,
    /// A point of interest
    Poi,
    /// A street address
    Address,
    /// A bare coordinate
    Coord,
}

/// A place as reported by a backend.
///
/// Backends identify the same physical stop inconsistently, so most fields are
/// optional. A location is usable as a trip endpoint if it has an id or a
/// coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Kind of place
    #[serde(rename = "type")]
    pub kind: LocationType,
    /// Backend identifier, unique within one network
    #[serde(default)]
    pub id: Option<String>,
    /// Coordinate
    #[serde(default)]
    pub coord: Option<Point>,
    /// Town or district
    #[serde(default)]
    pub place: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Products serving this location, if known
    #[serde(default)]
    pub products: Option<ProductSet>,
}

impl Location {
    /// Create a location of the given kind with an optional id.
    pub fn new(kind: LocationType, id: Option<String>) -> Self {
        Self {
            kind,
            id,
            coord: None,
            place: None,
            name: None,
            products: None,
        }
    }

    /// Create a station with an id and a name.
    pub fn station(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(LocationType::Station, Some(id.into())).with_name(name)
    }

    /// Create a bare coordinate location.
    pub fn coord(point: Point) -> Self {
        Self::new(LocationType::Coord, None).with_coord(point)
    }

    pub fn with_coord(mut self, point: Point) -> Self {
        self.coord = Some(point);
        self
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_products(mut self, products: ProductSet) -> Self {
        self.products = Some(products);
        self
    }

    pub fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn has_coord(&self) -> bool {
        self.coord.is_some()
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// Whether this location can be sent to a backend as a query endpoint.
    pub fn is_identified(&self) -> bool {
        self.has_id() || self.has_coord()
    }

    /// Text identifying this location within a derived trip id.
    ///
    /// The id if present, else the coordinate text, else an empty string.
    pub fn identity(&self) -> String {
        match (&self.id, &self.coord) {
            (Some(id), _) if !id.is_empty() => id.clone(),
            (_, Some(coord)) => coord.to_string(),
            _ => String::new(),
        }
    }

    /// Whether both locations carry the same name and the same place.
    ///
    /// Locations without a name never match.
    pub fn same_name_and_place(&self, other: &Location) -> bool {
        self.name.is_some() && self.name == other.name && self.place == other.place
    }

    /// Whether both locations carry the same non-empty id.
    pub fn same_id(&self, other: &Location) -> bool {
        self.has_id() && self.id == other.id
    }

    /// Name qualified by place, for display where names alone are ambiguous.
    pub fn unique_short_name(&self) -> String {
        match (&self.name, &self.place) {
            (Some(name), Some(place)) => format!("{name}, {place}"),
            (Some(name), None) => name.clone(),
            (None, _) => self
                .id
                .clone()
                .or_else(|| self.coord.map(|c| c.to_string()))
                .unwrap_or_else(|| format!("{:?}", self.kind)),
        }
    }

    /// Distance in metres, if both locations have coordinates.
    pub fn distance_to(&self, other: &Location) -> Option<f64> {
        Some(self.coord?.distance_to(&other.coord?))
    }
}
