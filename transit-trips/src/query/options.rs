//! Canonical trip query input.

use serde::{Deserialize, Serialize};

use crate::domain::{Location, Product, ProductSet, TemporalValue};

/// Whether the query time is a departure or an arrival bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Depart at or after the time
    #[default]
    DepartAfter,
    /// Arrive at or before the time
    ArriveBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

/// What the backend should optimize itineraries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Optimize {
    #[default]
    LeastDuration,
    LeastChanges,
    LeastWalking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    #[default]
    Neutral,
    Limited,
    BarrierFree,
}

/// Options recognized by every backend.
///
/// Backends that cannot honor an option ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TripOptions {
    /// Allowed products; `None` allows every product
    #[serde(default)]
    pub products: Option<ProductSet>,
    #[serde(default)]
    pub walk_speed: WalkSpeed,
    #[serde(default)]
    pub optimize: Optimize,
    /// Cap on changes between public legs
    #[serde(default)]
    pub max_changes: Option<u32>,
    #[serde(default)]
    pub accessibility: Accessibility,
}

impl TripOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(mut self, products: ProductSet) -> Self {
        self.products = Some(products);
        self
    }

    pub fn with_walk_speed(mut self, walk_speed: WalkSpeed) -> Self {
        self.walk_speed = walk_speed;
        self
    }

    pub fn with_optimize(mut self, optimize: Optimize) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_max_changes(mut self, max_changes: u32) -> Self {
        self.max_changes = Some(max_changes);
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    /// Whether a line of this product may be used.
    ///
    /// Lines of unknown product are allowed unless the filter is empty.
    pub fn allows(&self, product: Option<Product>) -> bool {
        match (self.products, product) {
            (None, _) => true,
            (Some(set), Some(product)) => set.contains(product),
            (Some(set), None) => !set.is_empty(),
        }
    }
}

/// A trip planning request: endpoints, time and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripQuery {
    pub from: Location,
    #[serde(default)]
    pub via: Option<Location>,
    pub to: Location,
    pub time: TemporalValue,
    #[serde(default)]
    pub direction: Direction,
}

impl TripQuery {
    pub fn new(from: Location, to: Location, time: TemporalValue, direction: Direction) -> Self {
        Self {
            from,
            via: None,
            to,
            time,
            direction,
        }
    }

    pub fn with_via(mut self, via: Location) -> Self {
        self.via = Some(via);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = TripOptions::default();
        assert_eq!(options.products, None);
        assert_eq!(options.walk_speed, WalkSpeed::Normal);
        assert_eq!(options.optimize, Optimize::LeastDuration);
        assert_eq!(options.max_changes, None);
        assert!(options.allows(Some(Product::Ferry)));
        assert!(options.allows(None));
    }

    #[test]
    fn product_filter() {
        let options = TripOptions::new().with_products(ProductSet::from_codes("SU").unwrap());
        assert!(options.allows(Some(Product::Subway)));
        assert!(!options.allows(Some(Product::Bus)));
        assert!(options.allows(None));

        let nothing = TripOptions::new().with_products(ProductSet::EMPTY);
        assert!(!nothing.allows(None));
    }

    #[test]
    fn options_serde_defaults() {
        let options: TripOptions =
            serde_json::from_str(r#"{"products":"RB","optimize":"least_changes"}"#).unwrap();
        assert_eq!(
            options,
            TripOptions::new()
                .with_products(ProductSet::from_codes("RB").unwrap())
                .with_optimize(Optimize::LeastChanges)
        );
    }

    #[test]
    fn query_direction_defaults_to_depart_after() {
        let json = serde_json::json!({
            "from": { "type": "STATION", "id": "A" },
            "to": { "type": "STATION", "id": "B" },
            "time": { "instant": 1_710_489_600_000i64, "offset": 60 },
        });
        let query: TripQuery = serde_json::from_value(json).unwrap();
        assert_eq!(query.direction, Direction::DepartAfter);
        assert_eq!(query.via, None);
    }
}
