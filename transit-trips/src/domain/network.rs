//! Network identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Maximum length of a network identifier.
const MAX_LEN: usize = 32;

/// Identifier of a transit network (one backend's id namespace).
///
/// Always 1 to 32 characters of uppercase ASCII letters, digits and `_`.
/// Ids derived from backend data are only meaningful within one network.
///
/// # Examples
///
/// ```
/// use transit_trips::domain::NetworkId;
///
/// let vbb = NetworkId::parse("VBB").unwrap();
/// assert_eq!(vbb.as_str(), "VBB");
///
/// // Lowercase is rejected by `parse`, accepted by `parse_normalized`
/// assert!(NetworkId::parse("vbb").is_err());
/// assert_eq!(NetworkId::parse_normalized(" vbb ").unwrap(), vbb);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkId(String);

impl NetworkId {
    /// Parse a network id. The input must already be in canonical form.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        if s.is_empty() || s.len() > MAX_LEN {
            return Err(DomainError::InvalidNetworkId(s.to_string()));
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
        {
            return Err(DomainError::InvalidNetworkId(s.to_string()));
        }
        Ok(NetworkId(s.to_string()))
    }

    /// Parse after trimming and upper-casing user input.
    pub fn parse_normalized(s: &str) -> Result<Self, DomainError> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NetworkId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NetworkId> for String {
    fn from(value: NetworkId) -> Self {
        value.0
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkId({})", self.0)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid() {
        assert!(NetworkId::parse("DB").is_ok());
        assert!(NetworkId::parse("RT").is_ok());
        assert!(NetworkId::parse("VRR_2").is_ok());
    }

    #[test]
    fn reject_invalid() {
        assert!(NetworkId::parse("").is_err());
        assert!(NetworkId::parse("db").is_err());
        assert!(NetworkId::parse("D-B").is_err());
        assert!(NetworkId::parse(&"A".repeat(33)).is_err());
    }

    #[test]
    fn serde_validates() {
        let id: NetworkId = serde_json::from_str(r#""BVG""#).unwrap();
        assert_eq!(id.as_str(), "BVG");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""BVG""#);

        assert!(serde_json::from_str::<NetworkId>(r#""bvg""#).is_err());
    }
}
