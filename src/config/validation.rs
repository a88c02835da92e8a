//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Destinations must be absolute http(s) URLs
//! - Validate value ranges (timeouts > 0, delay window ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::{PolicyShape, RouterConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("destination `{name}` is not an absolute http(s) URL: {value:?}")]
    Destination { name: &'static str, value: String },

    #[error("`{0}` must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("decision delay window is inverted ({min}ms > {max}ms)")]
    DelayWindow { min: u64, max: u64 },

    #[error("allow-list policy needs at least one allowed country")]
    NoAllowedCountries,

    #[error("invalid country code {0:?}")]
    CountryCode(String),

    #[error("geo provider URL {0:?} has no {{ip}} placeholder")]
    GeoTemplate(String),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for (name, value) in [
        ("primary", &config.destinations.primary),
        ("decoy", &config.destinations.decoy),
    ] {
        if !is_absolute_http_url(value) {
            errors.push(ValidationError::Destination {
                name,
                value: value.clone(),
            });
        }
    }

    if config.classifier.dns_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("classifier.dns_timeout_ms"));
    }
    if config.geo.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("geo.timeout_ms"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.connect_timeout_secs"));
    }

    if config.policy.delay_min_ms > config.policy.delay_max_ms {
        errors.push(ValidationError::DelayWindow {
            min: config.policy.delay_min_ms,
            max: config.policy.delay_max_ms,
        });
    }

    if config.policy.shape == PolicyShape::AllowList && config.policy.allowed_countries.is_empty() {
        errors.push(ValidationError::NoAllowedCountries);
    }
    for code in &config.policy.allowed_countries {
        if crate::geo::normalize_country_code(code).is_none() {
            errors.push(ValidationError::CountryCode(code.clone()));
        }
    }

    let providers = std::iter::once(&config.geo.primary).chain(config.geo.secondary.as_ref());
    for provider in providers {
        if !provider.url.contains("{ip}") {
            errors.push(ValidationError::GeoTemplate(provider.url.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_absolute_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
