//! Camera endpoint: where to connect, what to request, and as whom.

use std::fmt;

use hyper::Uri;
use url::Url;

use crate::config::UpstreamConfig;

/// Error type for endpoint construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("'{address}' is not a valid camera address: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("scheme '{0}' is not supported, cameras are reached over plain http")]
    UnsupportedScheme(String),

    #[error("'{0}' is not a valid request path")]
    InvalidPath(String),

    #[error("value for header '{0}' is not a valid header value")]
    InvalidHeader(&'static str),
}

/// Split a camera address into host and port.
///
/// Accepts `host`, `host:port` and `http://host[:port]`. The port defaults to 80.
pub fn parse_address(raw: &str) -> Result<(String, u16), EndpointError> {
    let raw = raw.trim();
    let invalid = |reason: &str| EndpointError::InvalidAddress {
        address: raw.to_string(),
        reason: reason.to_string(),
    };

    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };
    let url = Url::parse(&candidate).map_err(|e| invalid(&e.to_string()))?;

    if url.scheme() != "http" {
        return Err(EndpointError::UnsupportedScheme(url.scheme().to_string()));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("address must not carry credentials, set username and password instead"));
    }
    if url.path() != "/" || url.query().is_some() {
        return Err(invalid("address must not contain a path, set the request path instead"));
    }

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| invalid("missing host"))?;
    let port = url.port_or_known_default().unwrap_or(80);

    Ok((host.to_string(), port))
}

/// Basic auth credentials. Only constructed when both parts are non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Self {
                    username: username.to_string(),
                    password: password.to_string(),
                })
            }
            _ => None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Immutable description of the camera snapshot endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamEndpoint {
    host: String,
    port: u16,
    request_uri: Uri,
    credentials: Option<Credentials>,
}

impl UpstreamEndpoint {
    pub fn new(
        address: &str,
        request_path: &str,
        credentials: Option<Credentials>,
    ) -> Result<Self, EndpointError> {
        let (host, port) = parse_address(address)?;

        let request_uri: Uri = request_path
            .parse()
            .map_err(|_| EndpointError::InvalidPath(request_path.to_string()))?;
        if request_uri.scheme().is_some() || !request_path.starts_with('/') {
            return Err(EndpointError::InvalidPath(request_path.to_string()));
        }

        Ok(Self {
            host,
            port,
            request_uri,
            credentials,
        })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, EndpointError> {
        let credentials = Credentials::new(config.username.as_deref(), config.password.as_deref());
        Self::new(&config.address, &config.request_path, credentials)
    }

    /// `host:port`, used to open the TCP connection.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value of the `Host` header. The default port is left out.
    pub fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            self.authority()
        }
    }

    pub fn request_uri(&self) -> &Uri {
        &self.request_uri
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}
