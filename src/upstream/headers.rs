//! Fixed request headers sent with every snapshot request.

use base64::{engine::general_purpose, Engine as _};
use hyper::header::{self, HeaderMap, HeaderValue};

use crate::upstream::endpoint::{Credentials, EndpointError, UpstreamEndpoint};

pub const ACCEPT_IMAGES: &str =
    "image/webp,image/png,image/svg+xml,image/*;q=0.8,video/*;q=0.8,*/*;q=0.5";
pub const ACCEPT_ENCODING: &str = "gzip, deflate";
pub const KEEP_ALIVE: &str = "keep-alive";

/// `Basic <base64(user:password)>`.
pub fn basic_authorization(credentials: &Credentials) -> String {
    let pair = format!("{}:{}", credentials.username(), credentials.password());
    format!("Basic {}", general_purpose::STANDARD.encode(pair))
}

/// Build the header set for `endpoint`. Computed once per client.
///
/// `Authorization` is only present when the endpoint carries credentials.
pub fn build_headers(endpoint: &UpstreamEndpoint) -> Result<HeaderMap, EndpointError> {
    let mut headers = HeaderMap::new();

    let host = HeaderValue::from_str(&endpoint.host_header())
        .map_err(|_| EndpointError::InvalidHeader("host"))?;
    headers.insert(header::HOST, host);
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_IMAGES));
    headers.insert(header::CONNECTION, HeaderValue::from_static(KEEP_ALIVE));
    headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING));

    if let Some(credentials) = endpoint.credentials() {
        let mut value = HeaderValue::from_str(&basic_authorization(credentials))
            .map_err(|_| EndpointError::InvalidHeader("authorization"))?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    Ok(headers)
}
