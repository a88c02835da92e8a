//! Reverse-DNS lookups for search engine provenance.
//!
//! # Responsibilities
//! - Resolve PTR records for a client address
//! - Bound every lookup with a timeout
//! - Match resolved hostnames against crawler-owned domain suffixes
//!
//! # Design Decisions
//! - Lookup behind a trait so the classifier can be tested without DNS
//! - Failures (timeout, NXDOMAIN, resolver errors) are errors here and
//!   become "not a search engine" in the classifier

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Reverse lookup failure.
#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    #[error("reverse lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("reverse lookup failed: {0}")]
    Resolve(String),
}

/// Resolves an address to its PTR hostnames.
#[async_trait]
pub trait ReverseLookup: Send + Sync {
    async fn reverse(&self, ip: IpAddr) -> Result<Vec<String>, DnsError>;
}

/// System-configured resolver.
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
}

impl SystemResolver {
    /// Build a resolver from `/etc/resolv.conf`, falling back to the
    /// library defaults when the system configuration cannot be read.
    pub fn new(timeout: Duration) -> Self {
        let (config, mut opts) = match trust_dns_resolver::system_conf::read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read system resolver config, using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        opts.timeout = timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

#[async_trait]
impl ReverseLookup for SystemResolver {
    async fn reverse(&self, ip: IpAddr) -> Result<Vec<String>, DnsError> {
        let lookup = self
            .resolver
            .reverse_lookup(ip)
            .await
            .map_err(|e| DnsError::Resolve(e.to_string()))?;
        Ok(lookup.iter().map(|name| name.to_string()).collect())
    }
}

/// Run a reverse lookup with a hard deadline.
pub async fn reverse_with_timeout(
    lookup: &dyn ReverseLookup,
    ip: IpAddr,
    timeout: Duration,
) -> Result<Vec<String>, DnsError> {
    match tokio::time::timeout(timeout, lookup.reverse(ip)).await {
        Ok(result) => result,
        Err(_) => Err(DnsError::Timeout(timeout)),
    }
}

/// Hostname suffixes owned by search engine operators.
#[derive(Debug, Clone)]
pub struct SearchEngineDomains {
    suffixes: Vec<String>,
}

impl SearchEngineDomains {
    pub fn new(suffixes: &[String]) -> Self {
        Self {
            suffixes: suffixes
                .iter()
                .map(|s| s.trim().trim_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// The suffix `hostname` falls under, if any.
    ///
    /// PTR names usually carry a trailing dot; comparison ignores it and
    /// case. A hostname matches when it equals a suffix or ends with
    /// `.suffix`, so `notgoogle.com` does not match `google.com`.
    pub fn matching_suffix(&self, hostname: &str) -> Option<&str> {
        let host = hostname.trim_end_matches('.').to_lowercase();
        self.suffixes
            .iter()
            .find(|suffix| {
                host == **suffix
                    || (host.len() > suffix.len()
                        && host.ends_with(suffix.as_str())
                        && host.as_bytes()[host.len() - suffix.len() - 1] == b'.')
            })
            .map(String::as_str)
    }
}
