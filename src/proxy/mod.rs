//! Streaming proxy subsystem.
//!
//! # Data Flow
//! ```text
//! RoutingDecision → destination base URL
//!     → upstream.rs (rebuild request: method, path+query, end-to-end headers, body)
//!     → send without following redirects
//!     → headers.rs (strip hop-by-hop from the response)
//!     → stream status, headers and body back to the client
//! ```
//!
//! # Design Decisions
//! - Bodies are streamed in both directions, never buffered
//! - No retries: one failed fetch is one client-visible error
//! - Client disconnect drops the body stream and aborts the upstream fetch

pub mod headers;
pub mod upstream;

pub use headers::{copy_end_to_end, is_hop_by_hop, HOP_BY_HOP};
pub use upstream::{carries_body, ProxyError, UpstreamClient};
