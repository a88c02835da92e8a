//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use decoy_router::classify::{DnsError, ReverseLookup};
use decoy_router::config::RouterConfig;
use decoy_router::geo::{GeoError, GeoProvider, GeoResolver, GeoResult};
use decoy_router::reputation::{parse_dataset, ReputationHandle};
use decoy_router::{DecisionEngine, HttpServer, Shutdown};

pub const CHROME_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const GOOGLEBOT_UA: &str = "Googlebot/2.1 (+http://www.google.com/bot.html)";
pub const CLIENT_ADDR: &str = "203.0.113.45";

/// Start an echo upstream. The body is `label method path?query` followed
/// by the request body, and a few request headers are reflected back.
///
/// Special paths: `/redirect` answers 302, `/status/{code}` answers `code`,
/// `/large` answers a 1 MiB body.
pub async fn start_echo_upstream(label: &'static str) -> SocketAddr {
    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| async move {
            echo(label, method, uri, headers, body)
        },
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn echo(label: &str, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> axum::response::Response {
    let path = uri.path();

    if path == "/redirect" {
        return (StatusCode::FOUND, [("location", "/landing")], "moved").into_response();
    }
    if path == "/large" {
        return (StatusCode::OK, [("x-upstream", label.to_string())], vec![b'x'; 1024 * 1024]).into_response();
    }
    let status = path
        .strip_prefix("/status/")
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    let reflect = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };
    let text = format!(
        "{} {} {}\n{}",
        label,
        method,
        uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/"),
        String::from_utf8_lossy(&body)
    );

    (
        status,
        [
            ("x-upstream", label.to_string()),
            ("x-echo-accept-language", reflect("accept-language")),
            ("x-echo-request-id", reflect("x-request-id")),
            ("x-echo-proxy-authorization", reflect("proxy-authorization")),
        ],
        text,
    )
        .into_response()
}

/// Start an upstream that writes a fixed raw HTTP response after reading the
/// request head.
pub async fn start_raw_upstream(response: String) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = Arc::new(response);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let response = response.clone();
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Start an upstream that answers with a chunked body that never ends. The
/// receiver yields once a chunk write fails, i.e. once the proxy has dropped
/// the upstream connection.
pub async fn start_endless_upstream() -> (SocketAddr, tokio::sync::mpsc::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed_rx) = tokio::sync::mpsc::channel(1);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let closed_tx = closed_tx.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let preamble = "HTTP/1.1 200 OK\r\n\
                                Content-Type: text/plain\r\n\
                                Transfer-Encoding: chunked\r\n\
                                X-Upstream: endless\r\n\
                                \r\n";
                if socket.write_all(preamble.as_bytes()).await.is_err() {
                    let _ = closed_tx.send(()).await;
                    return;
                }
                let chunk = format!("{:x}\r\n{}\r\n", 1024, "y".repeat(1024));
                loop {
                    if socket.write_all(chunk.as_bytes()).await.is_err() {
                        let _ = closed_tx.send(()).await;
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            });
        }
    });
    (addr, closed_rx)
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Geo provider with a fixed answer.
pub struct StaticGeo(pub GeoResult);

impl StaticGeo {
    pub fn country(code: &str) -> Arc<Self> {
        Arc::new(Self(GeoResult {
            country_code: Some(code.to_string()),
            asn: Some("AS5384".to_string()),
            organization: Some("Emirates Telecommunications".to_string()),
        }))
    }

    pub fn network(code: &str, asn: &str, org: &str) -> Arc<Self> {
        Arc::new(Self(GeoResult {
            country_code: Some(code.to_string()),
            asn: Some(asn.to_string()),
            organization: Some(org.to_string()),
        }))
    }
}

#[async_trait]
impl GeoProvider for StaticGeo {
    fn name(&self) -> &str {
        "static"
    }

    async fn lookup(&self, _ip: IpAddr) -> Result<GeoResult, GeoError> {
        Ok(self.0.clone())
    }
}

/// Geo provider that never answers in time.
pub struct HangingGeo;

#[async_trait]
impl GeoProvider for HangingGeo {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn lookup(&self, _ip: IpAddr) -> Result<GeoResult, GeoError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(GeoResult::empty())
    }
}

/// Reverse DNS with fixed hostnames.
pub struct StaticDns(pub Vec<String>);

impl StaticDns {
    pub fn residential() -> Arc<Self> {
        Arc::new(Self(vec!["cpe-203-0-113-45.example-isp.net".to_string()]))
    }

    pub fn googlebot() -> Arc<Self> {
        Arc::new(Self(vec!["crawl-66-249-66-1.googlebot.com.".to_string()]))
    }
}

#[async_trait]
impl ReverseLookup for StaticDns {
    async fn reverse(&self, _ip: IpAddr) -> Result<Vec<String>, DnsError> {
        Ok(self.0.clone())
    }
}

/// Config pointing at the given upstreams with no decision delay. The test
/// client stands in for a load balancer, so forwarded-for is trusted.
pub fn test_config(primary: SocketAddr, decoy: SocketAddr) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.destinations.primary = format!("http://{}", primary);
    config.destinations.decoy = format!("http://{}", decoy);
    config.policy.delay_min_ms = 0;
    config.policy.delay_max_ms = 0;
    config.geo.timeout_ms = 100;
    config.upstream.connect_timeout_secs = 2;
    config.client_ip.trust_forwarded_for = true;
    config
}

/// A running proxy instance.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a proxy wired to stub evidence collaborators.
pub async fn spawn_proxy(
    config: RouterConfig,
    geo: Arc<dyn GeoProvider>,
    dns: Arc<dyn ReverseLookup>,
    dataset: &str,
) -> TestProxy {
    let resolver = GeoResolver::new(&config.geo, geo, None);
    let reputation = ReputationHandle::new(parse_dataset(dataset));
    let engine = DecisionEngine::new(&config, dns, resolver, reputation);
    let server = HttpServer::new(&config, engine).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, signal).await.unwrap();
    });

    TestProxy { addr, shutdown }
}

/// Client that surfaces redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// A request that looks like a real browser coming from outside.
pub fn browser_request(client: &reqwest::Client, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
    client
        .request(method, url)
        .header("user-agent", CHROME_UA)
        .header("accept", "text/html,application/xhtml+xml")
        .header("accept-language", "en-US,en;q=0.9")
        .header("accept-encoding", "identity")
        .header("referer", "https://www.google.com/")
        .header("x-forwarded-for", CLIENT_ADDR)
}
