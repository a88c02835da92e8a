//! Geolocation with a fallback chain and a failure policy.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GeoConfig;
use crate::geo::provider::{GeoError, GeoProvider, HttpGeoProvider};
use crate::geo::GeoResult;
use crate::observability::metrics;

/// Resolves client addresses to a `GeoResult`; never fails.
pub struct GeoResolver {
    enabled: bool,
    primary: Arc<dyn GeoProvider>,
    secondary: Option<Arc<dyn GeoProvider>>,
    timeout: Duration,
    skip_user_agents: Vec<String>,
    skip_addresses: HashSet<IpAddr>,
}

impl GeoResolver {
    /// Build a resolver from configuration with HTTP providers.
    pub fn from_config(config: &GeoConfig, client: reqwest::Client) -> Self {
        let primary: Arc<dyn GeoProvider> =
            Arc::new(HttpGeoProvider::new(&config.primary, client.clone()));
        let secondary = config
            .secondary
            .as_ref()
            .map(|p| Arc::new(HttpGeoProvider::new(p, client.clone())) as Arc<dyn GeoProvider>);
        Self::new(config, primary, secondary)
    }

    /// Build a resolver around explicit providers.
    pub fn new(
        config: &GeoConfig,
        primary: Arc<dyn GeoProvider>,
        secondary: Option<Arc<dyn GeoProvider>>,
    ) -> Self {
        let skip_addresses = config
            .skip_addresses
            .iter()
            .filter_map(|a| match a.trim().parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(address = %a, "Ignoring unparsable geo skip address");
                    None
                }
            })
            .collect();

        Self {
            enabled: config.enabled,
            primary,
            secondary,
            timeout: Duration::from_millis(config.timeout_ms),
            skip_user_agents: config
                .skip_user_agents
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            skip_addresses,
        }
    }

    /// True when this request is exempt from lookup entirely.
    pub fn is_exempt(&self, address: IpAddr, user_agent: &str) -> bool {
        if self.skip_addresses.contains(&address) {
            return true;
        }
        let ua = user_agent.to_lowercase();
        self.skip_user_agents.iter().any(|t| ua.contains(t.as_str()))
    }

    /// Resolve an address: primary, then secondary, then empty.
    pub async fn resolve(&self, address: Option<IpAddr>, user_agent: &str) -> GeoResult {
        if !self.enabled {
            return GeoResult::empty();
        }
        let Some(address) = address else {
            return GeoResult::empty();
        };
        if self.is_exempt(address, user_agent) {
            tracing::debug!(address = %address, "Geo lookup skipped");
            return GeoResult::empty();
        }

        let providers = std::iter::once(&self.primary).chain(self.secondary.as_ref());
        for provider in providers {
            match self.lookup_one(provider.as_ref(), address).await {
                Ok(result) => return result,
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        address = %address,
                        error = %e,
                        "Geo lookup failed"
                    );
                    metrics::record_geo_failure(provider.name());
                }
            }
        }
        GeoResult::empty()
    }

    async fn lookup_one(&self, provider: &dyn GeoProvider, address: IpAddr) -> Result<GeoResult, GeoError> {
        match tokio::time::timeout(self.timeout, provider.lookup(address)).await {
            Ok(result) => result,
            Err(_) => Err(GeoError::Timeout(self.timeout)),
        }
    }
}
