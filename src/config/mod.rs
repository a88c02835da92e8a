//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → env / CLI overrides (PORT, PRIMARY_URL, DECOY_URL, REPUTATION_PATH)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Invalid destinations fail startup; the reputation dataset never does

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, Overrides};
pub use schema::{
    ClassifierConfig, ClientIpConfig, DestinationConfig, GeoConfig, GeoProviderConfig,
    GeoProviderKind, ListenerConfig, LogFormat, ObservabilityConfig, PolicyConfig, PolicyShape,
    ReputationConfig, RouterConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
