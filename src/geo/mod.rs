//! Geolocation subsystem.
//!
//! # Data Flow
//! ```text
//! client address + user-agent
//!     → resolver.rs (skip monitoring agents / exempt addresses)
//!     → provider.rs primary lookup (bounded timeout)
//!     → on failure: provider.rs secondary lookup
//!     → on failure: empty GeoResult
//! ```
//!
//! # Design Decisions
//! - Lookup failure is a valid result, never an error for the caller
//! - Providers are trait objects so tests run without network access
//! - Country and ASN values are normalized at the provider boundary

pub mod provider;
pub mod resolver;

use serde::Serialize;

pub use provider::{GeoError, GeoProvider, HttpGeoProvider};
pub use resolver::GeoResolver;

/// Outcome of a geolocation lookup. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeoResult {
    /// ISO 3166-1 alpha-2, uppercase.
    pub country_code: Option<String>,
    /// Autonomous system, normalized to `AS<digits>`.
    pub asn: Option<String>,
    /// Network operator name as reported.
    pub organization: Option<String>,
}

impl GeoResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.country_code.is_none() && self.asn.is_none() && self.organization.is_none()
    }
}

/// Normalize a country code to two-letter uppercase form.
pub fn normalize_country_code(value: &str) -> Option<String> {
    let value = value.trim();
    if value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(value.to_ascii_uppercase())
    } else {
        None
    }
}

/// Normalize an ASN token: uppercase, bare numbers gain an `AS` prefix.
pub fn normalize_asn(value: &str) -> Option<String> {
    let value = value.trim().to_ascii_uppercase();
    if value.is_empty() {
        return None;
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("AS{}", value));
    }
    Some(value)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
