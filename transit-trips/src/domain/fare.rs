//! Fares and seat capacity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Passenger category a fare applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FareType {
    Adult,
    Child,
    Youth,
    Student,
    Military,
    Senior,
    Disabled,
    Bike,
}

/// A price for a trip, as quoted by one network.
///
/// Amounts are kept in minor units (cents) to avoid float rounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fare {
    pub network: String,
    #[serde(rename = "type")]
    pub fare_type: FareType,
    /// ISO 4217 code
    pub currency: String,
    /// Minor units
    pub amount: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Name of the zones/units the fare is counted in, e.g. "Zones"
    #[serde(default)]
    pub units_name: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
}

impl Fare {
    pub fn new(
        network: impl Into<String>,
        fare_type: FareType,
        currency: impl Into<String>,
        amount: i64,
    ) -> Self {
        Self {
            network: network.into(),
            fare_type,
            currency: currency.into(),
            amount,
            name: None,
            units_name: None,
            units: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_units(mut self, units_name: impl Into<String>, units: impl Into<String>) -> Self {
        self.units_name = Some(units_name.into());
        self.units = Some(units.into());
        self
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(f, "{sign}{}.{:02} {}", abs / 100, abs % 100, self.currency)
    }
}

/// How full a vehicle is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Occupancy {
    Low,
    Medium,
    High,
    Full,
}

/// Expected occupancy per travel class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeatCapacity {
    #[serde(default)]
    pub first_class: Option<Occupancy>,
    #[serde(default)]
    pub second_class: Option<Occupancy>,
}

impl SeatCapacity {
    pub fn new(first_class: Option<Occupancy>, second_class: Option<Occupancy>) -> Self {
        Self {
            first_class,
            second_class,
        }
    }

    /// The fuller of the two classes.
    pub fn worst(&self) -> Option<Occupancy> {
        self.first_class.max(self.second_class)
    }
}
