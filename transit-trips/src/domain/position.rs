//! Platform/track positions.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// A platform or track, optionally narrowed to a section.
///
/// # Examples
///
/// ```
/// use transit_trips::domain::Position;
///
/// let p = Position::parse("5 A-C").unwrap();
/// assert_eq!(p.name(), "5");
/// assert_eq!(p.section(), Some("A-C"));
/// assert_eq!(p.to_string(), "5 A-C");
///
/// assert!(Position::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    name: String,
    #[serde(default)]
    section: Option<String>,
}

impl Position {
    /// Create a position from a bare platform name.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidPosition(name));
        }
        Ok(Self {
            name: trimmed.to_string(),
            section: None,
        })
    }

    /// Parse backend text such as `"12"`, `"3a"` or `"5 A-C"`.
    ///
    /// Anything after the first run of whitespace is the section.
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let trimmed = text.trim();
        match trimmed.split_once(char::is_whitespace) {
            Some((name, section)) => {
                let mut position = Self::new(name)?;
                let section = section.trim();
                if !section.is_empty() {
                    position.section = Some(section.to_string());
                }
                Ok(position)
            }
            None => Self::new(trimmed),
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.section {
            Some(section) => write!(f, "{} {}", self.name, section),
            None => f.write_str(&self.name),
        }
    }
}
