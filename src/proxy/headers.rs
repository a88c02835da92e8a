//! Hop-by-hop header filtering.
//!
//! Applied in both directions: inbound headers copied onto the upstream
//! request, and upstream response headers copied back to the client.

use axum::http::{HeaderMap, HeaderName};

/// Headers that describe a single transport hop and never cross the proxy.
pub const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Copy every end-to-end header, preserving repeated values and their order.
pub fn copy_end_to_end(source: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(source.len());
    for (name, value) in source.iter() {
        if !is_hop_by_hop(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_strips_all_hop_by_hop() {
        let mut headers = HeaderMap::new();
        for name in HOP_BY_HOP {
            headers.insert(name, HeaderValue::from_static("x"));
        }
        headers.insert("content-type", HeaderValue::from_static("text/html"));

        let out = copy_end_to_end(&headers);
        assert_eq!(out.len(), 1);
        assert_eq!(out["content-type"], "text/html");
    }

    #[test]
    fn test_repeated_headers_keep_order() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.append("Connection", HeaderValue::from_static("close"));

        let out = copy_end_to_end(&headers);
        let cookies: Vec<_> = out.get_all("set-cookie").iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert!(!out.contains_key("connection"));
    }
}
