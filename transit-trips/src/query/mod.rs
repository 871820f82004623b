//! Canonical query input, pagination state and results.

mod context;
mod options;
mod result;

pub use context::PaginationContext;
pub use options::{Accessibility, Direction, Optimize, TripOptions, TripQuery, WalkSpeed};
pub use result::{
    Departure, LineDestination, NearbyLocationsResult, NearbyLocationsStatus,
    QueryDeparturesResult, QueryDeparturesStatus, QueryTripsResult, QueryTripsStatus,
    ResultHeader, StationDepartures, SuggestLocationsResult, SuggestStatus, SuggestedLocation,
};
