//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the decoy router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The two upstream destinations.
    pub destinations: DestinationConfig,

    /// Bot/human classifier rule set.
    pub classifier: ClassifierConfig,

    /// Geolocation lookup settings.
    pub geo: GeoConfig,

    /// ASN / organization reputation dataset.
    pub reputation: ReputationConfig,

    /// Routing policy shape and decision delay.
    pub policy: PolicyConfig,

    /// Client address derivation.
    pub client_ip: ClientIpConfig,

    /// Upstream connection settings.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Replace the port of the bind address, keeping the host part.
    pub fn set_port(&mut self, port: u16) {
        let host = match self.bind_address.rsplit_once(':') {
            Some((host, _)) if !host.is_empty() => host.to_string(),
            _ => "0.0.0.0".to_string(),
        };
        self.bind_address = format!("{}:{}", host, port);
    }
}

/// Primary and decoy upstreams, as absolute URLs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Upstream served to traffic that passes the policy.
    pub primary: String,

    /// Upstream served to everything else.
    pub decoy: String,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            primary: "http://127.0.0.1:8081".to_string(),
            decoy: "http://127.0.0.1:8082".to_string(),
        }
    }
}

/// Classifier rule set selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Require a referrer header for a `likely-human` verdict.
    pub require_referrer: bool,

    /// Require a cookie header for a `likely-human` verdict.
    pub require_cookie: bool,

    /// Run the reverse-DNS search engine check.
    pub verify_search_engine_dns: bool,

    /// Reverse-DNS lookup timeout in milliseconds.
    pub dns_timeout_ms: u64,

    /// Additional user-agent keywords that mark a request as a bot.
    pub extra_bot_keywords: Vec<String>,

    /// Additional user-agent markers of browser automation.
    pub extra_automation_markers: Vec<String>,

    /// Hostname suffixes owned by search engine crawlers.
    pub search_engine_suffixes: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            require_referrer: true,
            require_cookie: false,
            verify_search_engine_dns: true,
            dns_timeout_ms: 1500,
            extra_bot_keywords: Vec::new(),
            extra_automation_markers: Vec::new(),
            search_engine_suffixes: [
                "googlebot.com",
                "google.com",
                "googleusercontent.com",
                "search.msn.com",
                "crawl.yahoo.net",
                "yandex.ru",
                "yandex.net",
                "yandex.com",
                "baidu.com",
                "baidu.jp",
                "applebot.apple.com",
                "duckduckgo.com",
                "petalsearch.com",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Which JSON contract a geolocation endpoint speaks.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GeoProviderKind {
    /// `{status, countryCode, as, org}`
    IpApi,
    /// `{success, country_code, connection: {asn, org}}`
    IpwhoIs,
}

/// A single geolocation endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoProviderConfig {
    /// Response contract.
    pub kind: GeoProviderKind,

    /// URL template; `{ip}` is replaced by the address.
    pub url: String,
}

/// Geolocation lookup settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Enable geolocation lookups. Disabled means every result is empty.
    pub enabled: bool,

    /// Per-provider lookup timeout in milliseconds.
    pub timeout_ms: u64,

    /// First endpoint to query.
    pub primary: GeoProviderConfig,

    /// Endpoint queried when the primary fails.
    pub secondary: Option<GeoProviderConfig>,

    /// User-agent tokens of monitoring agents that skip the lookup.
    pub skip_user_agents: Vec<String>,

    /// Addresses that never get looked up.
    pub skip_addresses: Vec<String>,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 2000,
            primary: GeoProviderConfig {
                kind: GeoProviderKind::IpApi,
                url: "http://ip-api.com/json/{ip}?fields=status,countryCode,as,org".to_string(),
            },
            secondary: Some(GeoProviderConfig {
                kind: GeoProviderKind::IpwhoIs,
                url: "https://ipwho.is/{ip}".to_string(),
            }),
            skip_user_agents: [
                "uptimerobot",
                "pingdom",
                "statuscake",
                "site24x7",
                "betteruptime",
                "healthcheck",
                "kube-probe",
                "elb-healthchecker",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            skip_addresses: vec!["127.0.0.1".to_string(), "::1".to_string()],
        }
    }
}

/// Reputation dataset settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReputationConfig {
    /// Consult the reputation store at all.
    pub enabled: bool,

    /// Path to the `asn,organization[,category]` dataset.
    pub path: Option<PathBuf>,

    /// Reload the dataset when the file changes.
    pub watch: bool,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            watch: false,
        }
    }
}

/// Routing policy shape.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyShape {
    /// Primary only for allowed-country humans with clean reputation.
    AllowList,
    /// Decoy only for bots and suspicious referrers.
    DenyList,
}

/// Routing policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Which policy shape this deployment runs.
    pub shape: PolicyShape,

    /// ISO country codes admitted by the allow-list shape.
    pub allowed_countries: Vec<String>,

    /// Referrer tokens that mark a request as suspicious.
    pub suspicious_referrers: Vec<String>,

    /// Treat a missing referrer as suspicious.
    pub decoy_on_missing_referrer: bool,

    /// Lower bound of the decision delay in milliseconds.
    pub delay_min_ms: u64,

    /// Upper bound of the decision delay in milliseconds.
    pub delay_max_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            shape: PolicyShape::AllowList,
            allowed_countries: vec!["AE".to_string()],
            suspicious_referrers: [
                "googleadservices",
                "doubleclick",
                "adsbot",
                "transparencyreport",
                "ads.google",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            decoy_on_missing_referrer: false,
            delay_min_ms: 100,
            delay_max_ms: 1000,
        }
    }
}

/// Client address derivation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Trust the first entry of the forwarded-for chain. Off by default:
    /// enable it only behind a load balancer that overwrites the header,
    /// otherwise clients choose their own address.
    pub trust_forwarded_for: bool,

    /// Header carrying the forwarded-for chain.
    pub forwarded_for_header: String,
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_for: false,
            forwarded_for_header: "x-forwarded-for".to_string(),
        }
    }
}

/// Upstream connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
