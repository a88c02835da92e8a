//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! IncomingRequest
//!     → engine.rs, concurrently:
//!         - classify (headers, reverse DNS)
//!         - geolocate → reputation lookup on ASN/org
//!         - referrer heuristic
//!         - delay.rs (random sleep)
//!     → policy.rs (allow-list or deny-list shape)
//!     → Return: RoutingDecision (Primary | Decoy, plus evidence)
//! ```
//!
//! # Design Decisions
//! - Policy is built once at startup, immutable at runtime
//! - One policy shape per deployment
//! - Deterministic: same evidence always yields the same destination
//! - Every decision is logged with its full evidence

pub mod delay;
pub mod engine;
pub mod policy;

pub use delay::DelayWindow;
pub use engine::DecisionEngine;
pub use policy::{
    AllowListPolicy, DenyListPolicy, Destination, Evidence, RoutingDecision, RoutingPolicy,
};
