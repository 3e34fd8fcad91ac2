//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! CallHandler outcome:
//!     → events.rs (CallEvents: one event per call)
//!         → logging.rs subscriber (structured log line)
//!         → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Call outcomes are reported through an injected `CallEvents` so the
//!   handler can be tested without a global subscriber
//! - The request ID of each gRPC call is attached to its span
//! - Metrics are cheap no-ops until an exporter is installed

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{CallEvents, TracingEvents};
