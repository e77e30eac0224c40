//! Endpoint registry
//!
//! Owns the endpoint set in a single vector. The position of an endpoint in
//! the vector is its minor index. Nothing is added or removed after
//! construction, so resolving needs no synchronisation.

use tracing::info;

use crate::config::DeviceConfig;
use crate::endpoint::Endpoint;
use crate::error::{DeviceError, Result};

pub struct Registry {
    endpoints: Vec<Endpoint>,
}

impl Registry {
    /// Build every endpoint declared by `config`, in order.
    #[must_use]
    pub fn new(config: &DeviceConfig) -> Self {
        let endpoints: Vec<Endpoint> = config
            .endpoints
            .iter()
            .enumerate()
            .map(|(minor, e)| Endpoint::new(minor, e.capacity, e.policy))
            .collect();
        info!(count = endpoints.len(), "endpoint registry created");
        Self { endpoints }
    }

    /// Look up the endpoint with the given minor index.
    ///
    /// # Errors
    /// `NoSuchEndpoint` when `minor` is not below [`Registry::len`].
    pub fn resolve(&self, minor: usize) -> Result<&Endpoint> {
        self.endpoints
            .get(minor)
            .ok_or(DeviceError::NoSuchEndpoint(minor))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(&DeviceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Policy;

    #[test]
    fn test_resolve_in_order() {
        let registry = Registry::default();
        assert_eq!(registry.len(), 4);

        let endpoint = registry.resolve(1).unwrap();
        assert_eq!(endpoint.minor(), 1);
        assert_eq!(endpoint.capacity(), 512);
        assert_eq!(endpoint.policy(), Policy::WriteOnly);
    }

    #[test]
    fn test_resolve_out_of_range() {
        let registry = Registry::default();
        match registry.resolve(4) {
            Err(DeviceError::NoSuchEndpoint(minor)) => assert_eq!(minor, 4),
            other => panic!("Expected NoSuchEndpoint, got {other:?}"),
        }
    }

    #[test]
    fn test_iter_matches_minor() {
        let registry = Registry::new(&DeviceConfig::single(32));
        let minors: Vec<usize> = registry.iter().map(Endpoint::minor).collect();
        assert_eq!(minors, vec![0]);
        assert!(!registry.is_empty());
    }
}
