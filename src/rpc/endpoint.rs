use std::fmt;

use reqwest::Url;

use crate::config::{ConfigValue, LaunchConfig};
use crate::error::{Error, Result};

/// RPC port a full node listens on unless `rpc.laddr` says otherwise.
pub const FULL_NODE_RPC_PORT: u16 = 26657;

/// RPC port of the light-client proxy unless `laddr` says otherwise.
pub const LIGHT_CLIENT_RPC_PORT: u16 = 8888;

const RPC_HOST: &str = "127.0.0.1";

/// Where the supervised node answers RPC calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    pub host: String,
    pub port: u16,
}

impl RpcEndpoint {
    /// Derive the endpoint from the launch options.
    ///
    /// A flattened `laddr` wins over a nested `rpc.laddr`; without either the
    /// node listens on `default_port`.
    pub fn resolve(config: &LaunchConfig, default_port: u16) -> Result<Self> {
        let laddr = config.get("laddr").or_else(|| config.get_path("rpc.laddr"));
        let port = match laddr {
            None => default_port,
            Some(ConfigValue::Str(addr)) => parse_port(addr)?,
            Some(other) => {
                return Err(Error::Config(format!(
                    "rpc listen address must be a string, got {}",
                    other
                )))
            }
        };

        Ok(Self {
            host: RPC_HOST.to_string(),
            port,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for RpcEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Extract the port from `scheme://host:port` or a bare `host:port`.
fn parse_port(addr: &str) -> Result<u16> {
    let url = if addr.contains("://") {
        Url::parse(addr)
    } else {
        Url::parse(&format!("tcp://{}", addr))
    }
    .map_err(|e| Error::Config(format!("invalid rpc listen address {:?}: {}", addr, e)))?;

    match url.port_or_known_default() {
        None => Err(Error::Config(format!("rpc listen address {:?} has no port", addr))),
        Some(0) => Err(Error::Config(format!(
            "rpc listen address {:?} uses port 0, which cannot be polled",
            addr
        ))),
        Some(port) => Ok(port),
    }
}
