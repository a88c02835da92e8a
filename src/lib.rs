//! Classifying reverse proxy library.
//!
//! Every request is classified (bot, human or indeterminate), geolocated and
//! checked against a network reputation set, then streamed to either the
//! primary or the decoy destination.

pub mod classify;
pub mod config;
pub mod geo;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod reputation;
pub mod routing;

pub use config::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::DecisionEngine;
