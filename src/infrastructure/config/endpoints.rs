//! Operation-to-endpoint map for metric labels.
//!
//! ```toml
//! [exchanges.binance.get_balance]
//! method = "GET"
//! path = "/api/v3/account"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::EndpointRoute;
use crate::error::{ConfigError, Result};
use crate::port::RouteSource;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteEntry {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
}

/// Routes keyed by lower-cased exchange, then lower-cased operation name.
#[derive(Debug, Clone, Default)]
pub struct EndpointMap {
    pub exchanges: HashMap<String, HashMap<String, RouteEntry>>,
}

/// File layout before names are folded to lower case.
#[derive(Debug, Deserialize)]
struct EndpointFile {
    #[serde(default)]
    exchanges: BTreeMap<String, BTreeMap<String, RouteEntry>>,
}

impl EndpointMap {
    /// Parse TOML content.
    ///
    /// Exchange and operation names are case-insensitive. When two entries
    /// fold to the same name, the one whose name sorts last as written wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let raw: EndpointFile = toml::from_str(content).map_err(ConfigError::Parse)?;
        let mut map = Self::default();
        for (name, routes) in raw.exchanges {
            let merged = map.exchanges.entry(name.to_lowercase()).or_default();
            for (operation, entry) in routes {
                merged.insert(operation.to_lowercase(), entry);
            }
        }
        Ok(map)
    }

    /// Load from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load from a file, substituting an empty map on any error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(map) => {
                debug!(path = %path.display(), exchanges = map.exchanges.len(), "Loaded endpoint map");
                map
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Endpoint map unavailable, using operation names");
                Self::default()
            }
        }
    }

    /// Route for an operation. Entries missing a method or path count as absent.
    #[must_use]
    pub fn resolve(&self, exchange: &str, operation: &str) -> Option<EndpointRoute> {
        let entry = self
            .exchanges
            .get(&exchange.to_lowercase())?
            .get(&operation.to_lowercase())?;
        if entry.method.is_empty() || entry.path.is_empty() {
            return None;
        }
        Some(EndpointRoute {
            method: entry.method.to_uppercase(),
            path: entry.path.clone(),
        })
    }
}

impl RouteSource for EndpointMap {
    fn route(&self, exchange: &str, operation: &str) -> Option<EndpointRoute> {
        self.resolve(exchange, operation)
    }
}
