//! Streaming upstream forwarding.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::response::Response;
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::config::UpstreamConfig;
use crate::http::request::{IncomingRequest, X_REQUEST_ID};
use crate::proxy::headers::copy_end_to_end;

/// Failure to obtain a response from the destination.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid upstream url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to build client response: {0}")]
    Response(#[from] axum::http::Error),
}

/// HTTP client for the primary and decoy destinations.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Redirects are never followed; the connect timeout bounds connection
    /// setup only, never the streamed body.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Build the outbound URL: destination base plus the original path and query.
    pub fn target_url(base: &str, path_and_query: &str) -> Result<reqwest::Url, ProxyError> {
        let joined = format!("{}{}", base.trim_end_matches('/'), path_and_query);
        reqwest::Url::parse(&joined).map_err(|e| ProxyError::InvalidUrl {
            url: joined,
            reason: e.to_string(),
        })
    }

    /// Forward a request and return a response whose body streams from the
    /// upstream. Dropping the response aborts the upstream transfer.
    pub async fn forward(
        &self,
        base: &str,
        request: &IncomingRequest,
        body: Body,
    ) -> Result<Response, ProxyError> {
        let url = Self::target_url(base, request.path_and_query())?;

        let mut headers = copy_end_to_end(request.headers());
        if let Ok(value) = HeaderValue::from_str(request.request_id()) {
            headers.insert(X_REQUEST_ID, value);
        }

        // A length with no body attached would stall the upstream read.
        let with_body = carries_body(request.method(), request.headers());
        if !with_body {
            headers.remove(header::CONTENT_LENGTH);
        }

        let mut outbound = self
            .client
            .request(request.method().clone(), url)
            .headers(headers);
        if with_body {
            outbound = outbound.body(stream_body(body));
        }

        let upstream = outbound.send().await?;
        let status = upstream.status();

        let mut response = Response::builder().status(status);
        if let Some(out) = response.headers_mut() {
            *out = copy_end_to_end(upstream.headers());
        }

        Ok(response.body(Body::from_stream(upstream.bytes_stream()))?)
    }
}

// The client body is not Sync, so chunks are pumped through a channel. A
// dropped upstream request closes the channel and ends the pump.
fn stream_body(body: Body) -> reqwest::Body {
    let (tx, mut rx) = mpsc::channel::<Result<Bytes, axum::Error>>(8);
    tokio::spawn(async move {
        let mut chunks = body.into_data_stream();
        while let Some(chunk) = chunks.next().await {
            if tx.send(chunk).await.is_err() {
                break;
            }
        }
    });
    reqwest::Body::wrap_stream(futures_util::stream::poll_fn(move |cx| rx.poll_recv(cx)))
}

/// Whether the inbound body is forwarded upstream: always for POST, PUT and
/// PATCH, and for any other method that declares a non-empty body.
pub fn carries_body(method: &Method, headers: &HeaderMap) -> bool {
    if matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return true;
    }
    if headers.contains_key(header::TRANSFER_ENCODING) {
        return true;
    }
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .is_some_and(|len| len > 0)
}
