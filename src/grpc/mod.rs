//! gRPC subsystem.
//!
//! # Data Flow
//! ```text
//! gRPC client
//!     → server.rs (tonic server, request id, trace layer, reflection)
//!     → handler.rs (CallHandler::handle)
//!     → upstream::UpstreamClient::fetch
//!     → handler.rs (status_for: failure → UNAVAILABLE / CANCELLED)
//!     → Image or Status back to the client
//! ```

pub mod handler;
pub mod server;

pub use handler::{status_for, CallHandler};
pub use server::{GrpcServer, ServerError};
