//! Static endpoint configuration
//!
//! The endpoint set is fixed when the registry is built. It comes either
//! from [`DeviceConfig::default`] or from a JSON document:
//!
//! ```
//! use pseudodev::{DeviceConfig, Policy};
//!
//! let config = DeviceConfig::from_json(
//!     r#"{ "endpoints": [ { "capacity": 64, "policy": "read_write" } ] }"#,
//! )
//! .unwrap();
//! assert_eq!(config.endpoints[0].policy, Policy::ReadWrite);
//! ```

use serde::{Deserialize, Serialize};

use crate::endpoint::Policy;

/// Errors that can occur while loading a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid device configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("device configuration declares no endpoints")]
    Empty,
}

/// Capacity and policy of one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub capacity: usize,
    pub policy: Policy,
}

/// Ordered endpoint list; position in the list is the minor index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub endpoints: Vec<EndpointConfig>,
}

impl DeviceConfig {
    /// Single read-write endpoint of `capacity` bytes
    #[must_use]
    pub fn single(capacity: usize) -> Self {
        Self {
            endpoints: vec![EndpointConfig {
                capacity,
                policy: Policy::ReadWrite,
            }],
        }
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// `Parse` on malformed JSON or unknown policy names, `Empty` when no
    /// endpoint is declared.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// `Empty` when no endpoint is declared.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::Empty);
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let endpoint = |capacity, policy| EndpointConfig { capacity, policy };
        Self {
            endpoints: vec![
                endpoint(1024, Policy::ReadOnly),
                endpoint(512, Policy::WriteOnly),
                endpoint(256, Policy::ReadWrite),
                endpoint(128, Policy::ReadWrite),
            ],
        }
    }
}
