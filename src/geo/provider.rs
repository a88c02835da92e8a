//! HTTP geolocation providers.

use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

use crate::config::{GeoProviderConfig, GeoProviderKind};
use crate::geo::{non_empty, normalize_asn, normalize_country_code, GeoResult};

/// Why a single provider lookup produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("non-success status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("provider reported failure: {0}")]
    Rejected(String),

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// A single geolocation lookup service.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Short name used in logs and metric labels.
    fn name(&self) -> &str;

    async fn lookup(&self, ip: IpAddr) -> Result<GeoResult, GeoError>;
}

/// Geolocation over plain JSON HTTP APIs.
pub struct HttpGeoProvider {
    name: String,
    kind: GeoProviderKind,
    url_template: String,
    client: reqwest::Client,
}

impl HttpGeoProvider {
    pub fn new(config: &GeoProviderConfig, client: reqwest::Client) -> Self {
        let name = match config.kind {
            GeoProviderKind::IpApi => "ip_api",
            GeoProviderKind::IpwhoIs => "ipwho_is",
        };
        Self {
            name: name.to_string(),
            kind: config.kind,
            url_template: config.url.clone(),
            client,
        }
    }

    fn url_for(&self, ip: IpAddr) -> String {
        self.url_template.replace("{ip}", &ip.to_string())
    }
}

#[async_trait]
impl GeoProvider for HttpGeoProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, ip: IpAddr) -> Result<GeoResult, GeoError> {
        let response = self.client.get(self.url_for(ip)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Status(status));
        }
        let body = response.bytes().await?;
        parse_response(self.kind, &body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    country_code: Option<String>,
    #[serde(rename = "as")]
    autonomous_system: Option<String>,
    org: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpwhoIsResponse {
    success: bool,
    message: Option<String>,
    country_code: Option<String>,
    connection: Option<IpwhoIsConnection>,
}

#[derive(Debug, Deserialize)]
struct IpwhoIsConnection {
    asn: Option<u64>,
    org: Option<String>,
    isp: Option<String>,
}

/// Decode a provider's JSON body into a `GeoResult`.
pub fn parse_response(kind: GeoProviderKind, body: &[u8]) -> Result<GeoResult, GeoError> {
    match kind {
        GeoProviderKind::IpApi => {
            let parsed: IpApiResponse = serde_json::from_slice(body)?;
            if parsed.status != "success" {
                return Err(GeoError::Rejected(
                    parsed.message.unwrap_or(parsed.status),
                ));
            }
            // "as" looks like "AS15169 Google LLC"
            let (asn, as_name) = match parsed.autonomous_system.as_deref().map(str::trim) {
                Some(value) if !value.is_empty() => match value.split_once(' ') {
                    Some((asn, name)) => (normalize_asn(asn), non_empty(Some(name.to_string()))),
                    None => (normalize_asn(value), None),
                },
                _ => (None, None),
            };
            Ok(GeoResult {
                country_code: parsed.country_code.as_deref().and_then(normalize_country_code),
                asn,
                organization: non_empty(parsed.org).or(as_name),
            })
        }
        GeoProviderKind::IpwhoIs => {
            let parsed: IpwhoIsResponse = serde_json::from_slice(body)?;
            if !parsed.success {
                return Err(GeoError::Rejected(
                    parsed.message.unwrap_or_else(|| "success=false".to_string()),
                ));
            }
            let (asn, organization) = match parsed.connection {
                Some(conn) => (
                    conn.asn.map(|n| format!("AS{}", n)),
                    non_empty(conn.org).or(non_empty(conn.isp)),
                ),
                None => (None, None),
            };
            Ok(GeoResult {
                country_code: parsed.country_code.as_deref().and_then(normalize_country_code),
                asn,
                organization,
            })
        }
    }
}
