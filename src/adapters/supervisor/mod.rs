mod client;
mod codec;
mod transport;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use client::SupervisorClient;
pub use codec::{RpcError, Value};
pub use transport::TransportError;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("unsupported supervisor url {0:?} (expected unix:// or http://)")]
    UnsupportedScheme(String),

    #[error("invalid supervisor url {0:?}")]
    Invalid(String),
}

/// Where the supervisord control API listens
#[derive(Debug, Clone)]
pub enum Endpoint {
    Unix(PathBuf),
    Inet { host: String, port: u16 },
}

impl Endpoint {
    /// Parse a supervisord-style server url: `unix:///path/to/socket`
    /// or `http://host[:port]` (port defaults to supervisord's 9001).
    pub fn parse(url: &str) -> Result<Self, EndpointError> {
        if let Some(path) = url.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(EndpointError::Invalid(url.to_string()));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        if let Some(rest) = url.strip_prefix("http://") {
            let authority = rest.split('/').next().unwrap_or("");
            if authority.is_empty() {
                return Err(EndpointError::Invalid(url.to_string()));
            }
            return match authority.split_once(':') {
                Some((host, port)) => {
                    let port = port
                        .parse()
                        .map_err(|_| EndpointError::Invalid(url.to_string()))?;
                    Ok(Self::Inet {
                        host: host.to_string(),
                        port,
                    })
                }
                None => Ok(Self::Inet {
                    host: authority.to_string(),
                    port: 9001,
                }),
            };
        }

        Err(EndpointError::UnsupportedScheme(url.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Inet { host, port } => write!(f, "http://{host}:{port}"),
        }
    }
}
