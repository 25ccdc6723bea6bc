use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::RpcEndpoint;
use crate::error::{Error, Result};

/// Per-request timeout for RPC calls. Status calls answer in milliseconds on a
/// healthy node, anything longer is treated as "not ready".
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can report the node's sync state.
///
/// The readiness gates are written against this so they can be driven by
/// something other than a live node.
pub trait StatusSource: Send + Sync + 'static {
    fn status(&self) -> impl Future<Output = Result<NodeStatus>> + Send;
}

/// The part of the `/status` reply the supervisor looks at.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeStatus {
    pub sync_info: SyncInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncInfo {
    pub catching_up: bool,
    #[serde(deserialize_with = "height_from_str_or_int")]
    pub latest_block_height: u64,
}

impl SyncInfo {
    /// Caught up with the network and past genesis.
    pub fn is_synced(&self) -> bool {
        !self.catching_up && self.latest_block_height > 0
    }
}

/// Heights come back as strings (`"5"`) from Tendermint, but accept plain numbers too.
fn height_from_str_or_int<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Height {
        Int(u64),
        Str(String),
    }

    match Height::deserialize(deserializer)? {
        Height::Int(h) => Ok(h),
        Height::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<String>,
}

/// Minimal JSON-RPC over HTTP client for a Tendermint node.
#[derive(Debug, Clone)]
pub struct RpcClient {
    base_url: String,
    client: reqwest::Client,
}

impl RpcClient {
    pub fn new(endpoint: &RpcEndpoint) -> Result<Self> {
        Self::with_url(endpoint.url())
    }

    pub fn with_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Call a parameterless RPC method (`GET <base>/<method>`).
    pub async fn call<T: DeserializeOwned>(&self, method: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(url = %url, "rpc call");

        let envelope: RpcEnvelope<T> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = envelope.error {
            let detail = err.data.map(|d| format!(" ({})", d)).unwrap_or_default();
            return Err(Error::RpcResponse(format!(
                "{} returned {}: {}{}",
                method, err.code, err.message, detail
            )));
        }
        envelope
            .result
            .ok_or_else(|| Error::RpcResponse(format!("{} returned neither result nor error", method)))
    }

    pub async fn status(&self) -> Result<NodeStatus> {
        self.call("status").await
    }
}

impl StatusSource for RpcClient {
    fn status(&self) -> impl Future<Output = Result<NodeStatus>> + Send {
        RpcClient::status(self)
    }
}
