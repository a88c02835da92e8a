//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) when the client sent none
//! - Derive the client address (forwarded-for chain or transport peer)
//! - Capture the request metadata the decision pipeline reads
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - `IncomingRequest` never holds the body; the body is streamed to the
//!   upstream separately so classification cannot buffer it
//! - Metadata is immutable once captured

use axum::http::{request::Parts, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use std::net::{IpAddr, SocketAddr};
use std::time::Instant;
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::config::ClientIpConfig;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request ids for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Metadata of one inbound request, as seen by the decision pipeline.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    source: Option<IpAddr>,
    request_id: String,
    received_at: Instant,
}

impl IncomingRequest {
    /// Capture request metadata from the head of an inbound request.
    pub fn from_parts(parts: &Parts, peer: Option<SocketAddr>, client_ip: &ClientIpConfig) -> Self {
        let source = client_address(&parts.headers, peer, client_ip);
        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            source,
            request_id,
            received_at: Instant::now(),
        }
    }

    /// Build request metadata directly; used by tests and embedders.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, source: Option<IpAddr>) -> Self {
        Self {
            method,
            uri,
            headers,
            source,
            request_id: "unknown".to_string(),
            received_at: Instant::now(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path plus query, as it should be appended to the destination.
    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header as text; non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// User-agent header, or the empty string when missing.
    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or("")
    }

    /// Referrer header (`referer`, the spelling HTTP uses).
    pub fn referrer(&self) -> Option<&str> {
        self.header("referer")
    }

    pub fn source(&self) -> Option<IpAddr> {
        self.source
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn received_at(&self) -> Instant {
        self.received_at
    }
}

/// Derive the client address.
///
/// Behind a load balancer the first entry of the forwarded-for chain is the
/// original client; otherwise, or when that entry does not parse, the
/// transport peer is used.
pub fn client_address(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    config: &ClientIpConfig,
) -> Option<IpAddr> {
    if config.trust_forwarded_for {
        let forwarded = HeaderName::from_bytes(config.forwarded_for_header.as_bytes())
            .ok()
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .and_then(first_forwarded_entry);
        if forwarded.is_some() {
            return forwarded;
        }
    }
    peer.map(|addr| addr.ip())
}

fn first_forwarded_entry(chain: &str) -> Option<IpAddr> {
    let first = chain.split(',').next()?.trim();
    if let Ok(ip) = first.parse::<IpAddr>() {
        return Some(ip);
    }
    // Some balancers append the port.
    first.parse::<SocketAddr>().ok().map(|addr| addr.ip())
}
