//! Canonical itinerary model.
//!
//! Every backend integration produces these types. Constructors that can
//! violate an invariant return `Result`, so code that receives a `Trip` or
//! `PublicLeg` can trust it.

mod error;
mod fare;
mod leg;
mod line;
mod location;
mod network;
pub mod path;
mod position;
mod product;
mod reference;
mod stop;
mod time;
mod trip;

pub use error::DomainError;
pub use fare::{Fare, FareType, Occupancy, SeatCapacity};
pub use leg::{IndividualKind, IndividualLeg, JourneyRef, Leg, PublicLeg};
pub use line::{Line, Shape, Style, StyleTable};
pub use location::{Location, LocationType, Point};
pub use network::NetworkId;
pub use path::{PathEncodingError, decode_path, encode_path};
pub use position::Position;
pub use product::{Product, ProductSet, UNKNOWN_PRODUCT_CODE};
pub use reference::TripReference;
pub use stop::Stop;
pub use time::{
    NETWORK_OFFSET, OffsetTag, SYSTEM_OFFSET, TemporalValue, UNKNOWN_LOCATION_SPECIFIC_OFFSET,
};
pub use trip::{TransferDetails, Trip, merge_pages, repair_individual_overlaps};
