//! Server configuration read from the environment.

use std::net::SocketAddr;

use crate::domain::{DomainError, NetworkId};
use crate::provider::HttpConfig;

/// Default listen address.
const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TRANSIT_FIXTURES is not set")]
    MissingFixtures,

    #[error("invalid TRANSIT_BIND address {0:?}")]
    InvalidBind(String),

    #[error("invalid TRANSIT_NETWORK: {0}")]
    InvalidNetwork(#[source] DomainError),
}

/// Where fixture data is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureSource {
    File(String),
    Url(String),
}

/// Configuration for the server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub bind: SocketAddr,
    /// Fixture file path or URL
    pub fixtures: FixtureSource,
    /// Network the fixture must belong to, if pinned
    pub network: Option<NetworkId>,
    /// API key sent when fetching remote fixtures
    pub api_key: Option<String>,
}

impl ServerConfig {
    pub fn new(fixtures: FixtureSource) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            fixtures,
            network: None,
            api_key: None,
        }
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_network(mut self, network: NetworkId) -> Self {
        self.network = Some(network);
        self
    }

    /// Read `TRANSIT_BIND`, `TRANSIT_FIXTURES`, `TRANSIT_NETWORK` and
    /// `TRANSIT_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let fixtures = lookup("TRANSIT_FIXTURES")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingFixtures)?;
        let fixtures = if fixtures.starts_with("http://") || fixtures.starts_with("https://") {
            FixtureSource::Url(fixtures)
        } else {
            FixtureSource::File(fixtures)
        };

        let bind = lookup("TRANSIT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind.parse().map_err(|_| ConfigError::InvalidBind(bind))?;

        let network = lookup("TRANSIT_NETWORK")
            .map(|n| NetworkId::parse_normalized(&n))
            .transpose()
            .map_err(ConfigError::InvalidNetwork)?;

        Ok(Self {
            bind,
            fixtures,
            network,
            api_key: lookup("TRANSIT_API_KEY"),
        })
    }

    /// HTTP settings for a remote fixture source.
    pub fn http_config(&self) -> Option<HttpConfig> {
        let FixtureSource::Url(url) = &self.fixtures else {
            return None;
        };
        let config = HttpConfig::new(url.clone());
        Some(match &self.api_key {
            Some(key) => config.with_api_key(key.clone()),
            None => config,
        })
    }
}
