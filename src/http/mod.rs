//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace span)
//!     → request.rs (capture metadata, derive client address)
//!     → [routing::DecisionEngine decides Primary or Decoy]
//!     → [proxy::UpstreamClient streams the destination's response]
//!     → response.rs (generic error when the destination is unreachable)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{IncomingRequest, MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
