//! Domain error types.
//!
//! These errors represent precondition violations when constructing the
//! canonical trip model. They are distinct from adapter/IO errors, and from
//! the *expected* outcomes of trip planning (unknown or ambiguous locations),
//! which are modelled as result statuses instead.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// A trip was constructed without any legs
    #[error("trip must have at least one leg")]
    EmptyTrip,

    /// A stop is missing a time required by the leg it bounds
    #[error("missing required time data: {0}")]
    MissingTime(&'static str),

    /// A compact product string contained an unknown code
    #[error("invalid product code: {0:?}")]
    InvalidProductCode(char),

    /// A platform/track position was empty or malformed
    #[error("invalid position: {0:?}")]
    InvalidPosition(String),

    /// A network identifier was empty or contained invalid characters
    #[error("invalid network id: {0:?}")]
    InvalidNetworkId(String),

    /// Latitude or longitude out of range
    #[error("invalid coordinate: {lat}, {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// A leg index did not refer to a leg of the trip
    #[error("leg index {0} out of bounds")]
    LegIndexOutOfBounds(usize),
}
