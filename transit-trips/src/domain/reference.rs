//! Pointers back to the query a trip came from.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{Location, NetworkId};

/// Identifies a network plus the endpoints of the query that produced a trip.
///
/// Equality and hashing look at the network only: two references to
/// different journeys on the same network compare equal. Use
/// [`TripReference::same_endpoints`] when the endpoints matter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripReference {
    pub network: NetworkId,
    pub from: Location,
    #[serde(default)]
    pub via: Option<Location>,
    pub to: Location,
}

impl TripReference {
    pub fn new(network: NetworkId, from: Location, via: Option<Location>, to: Location) -> Self {
        Self {
            network,
            from,
            via,
            to,
        }
    }

    /// Whether both references point at the same from/via/to.
    pub fn same_endpoints(&self, other: &TripReference) -> bool {
        self.from == other.from && self.via == other.via && self.to == other.to
    }
}

// TODO: confirm whether network-only equality is intended; `same_endpoints`
// covers callers that need the stricter comparison until then.
impl PartialEq for TripReference {
    fn eq(&self, other: &Self) -> bool {
        self.network == other.network
    }
}

impl Eq for TripReference {}

impl Hash for TripReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.network.hash(state);
    }
}
