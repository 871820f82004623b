//! Transport modes and their compact wire encoding.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::DomainError;

/// Code used for a line whose product is not known.
pub const UNKNOWN_PRODUCT_CODE: char = '?';

/// A transport mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Product {
    HighSpeedTrain,
    RegionalTrain,
    SuburbanTrain,
    Subway,
    Tram,
    Bus,
    Ferry,
    Cablecar,
    OnDemand,
    ReplacementService,
}

impl Product {
    /// Every product, in code order.
    pub const VALUES: [Product; 10] = [
        Product::HighSpeedTrain,
        Product::RegionalTrain,
        Product::SuburbanTrain,
        Product::Subway,
        Product::Tram,
        Product::Bus,
        Product::Ferry,
        Product::Cablecar,
        Product::OnDemand,
        Product::ReplacementService,
    ];

    /// The single-character code for this product.
    pub fn code(self) -> char {
        match self {
            Product::HighSpeedTrain => 'I',
            Product::RegionalTrain => 'R',
            Product::SuburbanTrain => 'S',
            Product::Subway => 'U',
            Product::Tram => 'T',
            Product::Bus => 'B',
            Product::Ferry => 'F',
            Product::Cablecar => 'C',
            Product::OnDemand => 'P',
            Product::ReplacementService => 'E',
        }
    }

    /// Look up a product by its code.
    pub fn from_code(code: char) -> Result<Self, DomainError> {
        Self::VALUES
            .into_iter()
            .find(|p| p.code() == code)
            .ok_or(DomainError::InvalidProductCode(code))
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// A set of transport modes.
///
/// Crosses process and wire boundaries as a string of product codes, in the
/// fixed order of [`Product::VALUES`].
///
/// # Examples
///
/// ```
/// use transit_trips::domain::{Product, ProductSet};
///
/// let set: ProductSet = [Product::Bus, Product::Tram].into_iter().collect();
/// assert_eq!(set.to_codes(), "TB");
///
/// let parsed = ProductSet::from_codes("BT").unwrap();
/// assert_eq!(parsed, set);
///
/// assert!(ProductSet::from_codes("BX").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProductSet(u16);

impl ProductSet {
    /// No products.
    pub const EMPTY: ProductSet = ProductSet(0);

    /// Every product.
    pub const ALL: ProductSet = ProductSet(0b11_1111_1111);

    /// Every product, high-speed trains explicitly included. Same membership
    /// as [`ProductSet::ALL`]; kept as a distinct name for callers that ask
    /// for it.
    pub const ALL_INCLUDING_HIGH_SPEED: ProductSet = ProductSet(0b11_1111_1111);

    pub fn contains(&self, product: Product) -> bool {
        self.0 & product.bit() != 0
    }

    pub fn insert(&mut self, product: Product) {
        self.0 |= product.bit();
    }

    pub fn remove(&mut self, product: Product) {
        self.0 &= !product.bit();
    }

    pub fn with(mut self, product: Product) -> Self {
        self.insert(product);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: ProductSet) -> ProductSet {
        ProductSet(self.0 | other.0)
    }

    /// Whether every product in `self` is also in `other`.
    pub fn is_subset(&self, other: &ProductSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Product> + '_ {
        Product::VALUES.into_iter().filter(|p| self.contains(*p))
    }

    /// Encode as a compact code string.
    pub fn to_codes(&self) -> String {
        self.iter().map(Product::code).collect()
    }

    /// Decode a compact code string. Order and repetition do not matter.
    pub fn from_codes(codes: &str) -> Result<Self, DomainError> {
        codes
            .chars()
            .map(Product::from_code)
            .collect::<Result<ProductSet, _>>()
    }
}

impl FromIterator<Product> for ProductSet {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        let mut set = ProductSet::EMPTY;
        for product in iter {
            set.insert(product);
        }
        set
    }
}

impl fmt::Debug for ProductSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductSet({})", self.to_codes())
    }
}

impl fmt::Display for ProductSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_codes())
    }
}

impl Serialize for ProductSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_codes())
    }
}

impl<'de> Deserialize<'de> for ProductSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let codes = String::deserialize(deserializer)?;
        ProductSet::from_codes(&codes).map_err(serde::de::Error::custom)
    }
}
