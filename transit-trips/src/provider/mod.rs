//! The contract every backend integration implements.
//!
//! A provider turns one backend's wire data into the canonical model in
//! [`crate::domain`]. Providers hold only read-only configuration after
//! construction, so one instance can serve concurrent queries; the only
//! per-query mutable state is the caller's [`PaginationContext`].
//!
//! Providers never cache and never retry: a transport failure comes back as
//! [`ProviderError::Transport`] straight away.

mod error;
mod fixture;
mod http;

use std::future::Future;

use serde::{Deserialize, Serialize};

pub use error::ProviderError;
pub use fixture::{Fixture, FixturePage, FixtureProvider, FixtureTrip};
#[cfg(test)]
pub(crate) use fixture::testing;
pub use http::{HttpClient, HttpConfig};

use crate::domain::{Location, LocationType, NetworkId, TemporalValue, Trip};
use crate::query::{
    NearbyLocationsResult, PaginationContext, QueryDeparturesResult, QueryTripsResult,
    SuggestLocationsResult, TripOptions, TripQuery,
};

/// An operation a provider may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Suggest,
    Trips,
    TripDetails,
    Departures,
    Nearby,
}

/// A backend integration.
///
/// All methods return `Send` futures so providers can be driven from a
/// multi-threaded runtime.
pub trait Provider: Send + Sync {
    /// The network this provider serves.
    fn network(&self) -> &NetworkId;

    fn has_capability(&self, capability: Capability) -> bool;

    /// Locations matching free text, best first.
    fn suggest_locations(
        &self,
        text: &str,
        types: &[LocationType],
        limit: usize,
    ) -> impl Future<Output = Result<SuggestLocationsResult, ProviderError>> + Send;

    /// Plan trips. On success the result carries a fresh pagination context.
    fn query_trips(
        &self,
        query: &TripQuery,
        options: &TripOptions,
    ) -> impl Future<Output = Result<QueryTripsResult, ProviderError>> + Send;

    /// Fetch the page before (`later == false`) or after the pages seen so
    /// far.
    ///
    /// `context` is updated in place with the refreshed cursor; the returned
    /// result has no context of its own.
    fn query_more_trips(
        &self,
        context: &mut PaginationContext,
        later: bool,
    ) -> impl Future<Output = Result<QueryTripsResult, ProviderError>> + Send;

    /// Departures from a stop, grouped by stop.
    fn query_departures(
        &self,
        stop_id: &str,
        time: Option<TemporalValue>,
        limit: usize,
        equivalent_stops: bool,
    ) -> impl Future<Output = Result<QueryDeparturesResult, ProviderError>> + Send;

    /// Locations around `location`, nearest first.
    ///
    /// `max_distance` is in metres; 0 means no limit.
    fn query_nearby_locations(
        &self,
        types: &[LocationType],
        location: &Location,
        max_distance: u32,
        limit: usize,
    ) -> impl Future<Output = Result<NearbyLocationsResult, ProviderError>> + Send;

    /// Fill in details for a trip returned in summary form.
    fn load_trip_details(
        &self,
        trip: &mut Trip,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send {
        let _ = trip;
        async { Err(ProviderError::Unsupported(Capability::TripDetails)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IndividualKind, IndividualLeg};
    use crate::query::ResultHeader;

    /// Minimal provider that only knows its network.
    struct NullProvider {
        network: NetworkId,
    }

    impl Provider for NullProvider {
        fn network(&self) -> &NetworkId {
            &self.network
        }

        fn has_capability(&self, capability: Capability) -> bool {
            capability == Capability::Suggest
        }

        async fn suggest_locations(
            &self,
            _text: &str,
            _types: &[LocationType],
            _limit: usize,
        ) -> Result<SuggestLocationsResult, ProviderError> {
            Ok(SuggestLocationsResult::new(
                ResultHeader::new(self.network.clone()),
                vec![],
            ))
        }

        async fn query_trips(
            &self,
            _query: &TripQuery,
            _options: &TripOptions,
        ) -> Result<QueryTripsResult, ProviderError> {
            Err(ProviderError::Unsupported(Capability::Trips))
        }

        async fn query_more_trips(
            &self,
            _context: &mut PaginationContext,
            _later: bool,
        ) -> Result<QueryTripsResult, ProviderError> {
            Err(ProviderError::Unsupported(Capability::Trips))
        }

        async fn query_departures(
            &self,
            _stop_id: &str,
            _time: Option<TemporalValue>,
            _limit: usize,
            _equivalent_stops: bool,
        ) -> Result<QueryDeparturesResult, ProviderError> {
            Err(ProviderError::Unsupported(Capability::Departures))
        }

        async fn query_nearby_locations(
            &self,
            _types: &[LocationType],
            _location: &Location,
            _max_distance: u32,
            _limit: usize,
        ) -> Result<NearbyLocationsResult, ProviderError> {
            Err(ProviderError::Unsupported(Capability::Nearby))
        }
    }

    #[tokio::test]
    async fn load_trip_details_defaults_to_unsupported() {
        let provider = NullProvider {
            network: NetworkId::parse("TEST").unwrap(),
        };
        let walk = IndividualLeg::new(
            IndividualKind::Walk,
            Location::station("a", "A"),
            TemporalValue::new(0, 0),
            Location::station("b", "B"),
            TemporalValue::new(60_000, 0),
            80,
        );
        let mut trip = Trip::new(
            None,
            Location::station("a", "A"),
            Location::station("b", "B"),
            vec![walk.into()],
        )
        .unwrap();

        let result = provider.load_trip_details(&mut trip).await;
        assert!(matches!(
            result,
            Err(ProviderError::Unsupported(Capability::TripDetails))
        ));
        assert!(!trip.is_details_loaded());
    }

    #[tokio::test]
    async fn capabilities_reported() {
        let provider = NullProvider {
            network: NetworkId::parse("TEST").unwrap(),
        };
        assert!(provider.has_capability(Capability::Suggest));
        assert!(!provider.has_capability(Capability::Trips));
        assert!(provider.suggest_locations("x", &[], 5).await.is_ok());
    }
}
