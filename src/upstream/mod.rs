//! Upstream (camera) subsystem.
//!
//! # Data Flow
//! ```text
//! UpstreamConfig
//!     → endpoint.rs (host, port, request path, credentials)
//!     → headers.rs (Host, Accept, keep-alive, Authorization)
//!     → client.rs (one GET per fetch over the shared connection)
//!     → outcome.rs (body bytes or classified failure)
//! ```

pub mod client;
pub mod endpoint;
pub mod headers;
pub mod outcome;

pub use client::{ImageSource, UpstreamClient};
pub use endpoint::{Credentials, EndpointError, UpstreamEndpoint};
pub use outcome::{FailureKind, FetchFailure, FetchOutcome};
