//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (CAMERA_URL, REQUEST_URL, PORT, ... overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → passed by value to the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A missing camera address or path is fatal before anything binds

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ConfigError};
pub use schema::GatewayConfig;
pub use schema::{ListenerConfig, LogFormat, ObservabilityConfig, TimeoutConfig, UpstreamConfig};
pub use validation::ValidationError;
