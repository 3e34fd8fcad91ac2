//! gRPC gateway serving snapshots from an HTTP camera.
//!
//! Each `ImageFeedService/Get` call performs one HTTP GET against the
//! configured camera over a shared keep-alive connection and returns the
//! response body as `Image.data`.

pub mod config;
pub mod grpc;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub mod proto {
    #![allow(missing_docs)]
    tonic::include_proto!("feed");

    /// Encoded descriptors for server reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("feed_descriptor");
}

pub use config::GatewayConfig;
pub use grpc::GrpcServer;
pub use lifecycle::Shutdown;
