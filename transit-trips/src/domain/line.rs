//! Lines and their display styles.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{Product, UNKNOWN_PRODUCT_CODE};

/// Shape of a line badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    #[default]
    Rect,
    Rounded,
    Circle,
}

/// Colours and shape used to render a line badge.
///
/// Colours are `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub shape: Shape,
    pub background_color: u32,
    pub foreground_color: u32,
    #[serde(default)]
    pub border_color: Option<u32>,
}

impl Style {
    pub fn new(shape: Shape, background_color: u32, foreground_color: u32) -> Self {
        Self {
            shape,
            background_color,
            foreground_color,
            border_color: None,
        }
    }

    /// Parse `#RRGGBB` or `#AARRGGBB` into `0xAARRGGBB` (opaque if no alpha).
    pub fn parse_color(text: &str) -> Option<u32> {
        let hex = text.strip_prefix('#')?;
        let value = u32::from_str_radix(hex, 16).ok()?;
        match hex.len() {
            6 => Some(0xFF00_0000 | value),
            8 => Some(value),
            _ => None,
        }
    }
}

/// Immutable lookup table from lines to styles.
///
/// Built once from configuration and passed by reference to whatever needs
/// to style lines. Lookups fall back from network+product+label, to
/// network+product, to product alone.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    entries: HashMap<String, Style>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a style for one labelled line.
    pub fn with_line(
        mut self,
        network: Option<&str>,
        product: Option<Product>,
        label: &str,
        style: Style,
    ) -> Self {
        self.entries
            .insert(Self::key(network, product, Some(label)), style);
        self
    }

    /// Add a style for every line of a product, optionally within one network.
    pub fn with_product(mut self, network: Option<&str>, product: Product, style: Style) -> Self {
        self.entries
            .insert(Self::key(network, Some(product), None), style);
        self
    }

    pub fn lookup(
        &self,
        network: Option<&str>,
        product: Option<Product>,
        label: Option<&str>,
    ) -> Option<&Style> {
        if label.is_some() {
            if let Some(style) = self.entries.get(&Self::key(network, product, label)) {
                return Some(style);
            }
        }
        if network.is_some() {
            if let Some(style) = self.entries.get(&Self::key(network, product, None)) {
                return Some(style);
            }
        }
        self.entries.get(&Self::key(None, product, None))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(network: Option<&str>, product: Option<Product>, label: Option<&str>) -> String {
        let code = product.map(Product::code).unwrap_or(UNKNOWN_PRODUCT_CODE);
        let network = network.unwrap_or("");
        match label {
            Some(label) => format!("{network}|{code}|{label}"),
            None => format!("{network}|{code}"),
        }
    }
}

/// A transit line.
///
/// Two lines are the same line if network, product and label agree; ids,
/// names, styles and messages are ignored for equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Line {
    /// Backend line identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Network or operator the line belongs to
    #[serde(default)]
    pub network: Option<String>,
    /// Transport mode
    #[serde(default)]
    pub product: Option<Product>,
    /// Short rider-facing label ("S5", "U2", "ICE 1005")
    #[serde(default)]
    pub label: Option<String>,
    /// Longer name
    #[serde(default)]
    pub name: Option<String>,
    /// Badge style
    #[serde(default)]
    pub style: Option<Style>,
    /// Line-level notice
    #[serde(default)]
    pub message: Option<String>,
}

impl Line {
    pub fn new(
        id: Option<String>,
        network: Option<String>,
        product: Option<Product>,
        label: Option<String>,
    ) -> Self {
        Self {
            id,
            network,
            product,
            label,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Fill in the style from `table`, unless the backend already supplied one.
    pub fn styled(mut self, table: &StyleTable) -> Self {
        if self.style.is_none() {
            self.style = table
                .lookup(
                    self.network.as_deref(),
                    self.product,
                    self.label.as_deref(),
                )
                .copied();
        }
        self
    }

    /// Product code, or `?` when the product is unknown.
    pub fn product_code(&self) -> char {
        self.product
            .map(Product::code)
            .unwrap_or(UNKNOWN_PRODUCT_CODE)
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.network == other.network && self.product == other.product && self.label == other.label
    }
}

impl Eq for Line {}

impl Hash for Line {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.network.hash(state);
        self.product.hash(state);
        self.label.hash(state);
    }
}
