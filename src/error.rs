use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::readiness::GateKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to spawn {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("tendermint exited with code {}", describe_code(*code))]
    Exit { code: Option<i32> },
    #[error("waiting for tendermint failed: {0}")]
    Wait(String),
    #[error("timed out while waiting for node to be {gate} (after {elapsed:?})")]
    Timeout { gate: GateKind, elapsed: Duration },
    #[error("{gate} readiness check aborted: {reason}")]
    Aborted { gate: GateKind, reason: String },
    #[error("rpc request failed: {0}")]
    Rpc(#[from] reqwest::Error),
    #[error("rpc error response: {0}")]
    RpcResponse(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Errors a readiness poll treats as "not ready yet" rather than fatal.
    ///
    /// A node that has not bound its RPC port refuses connections, and one
    /// still booting may answer with an error envelope. Both clear up on
    /// their own, so the poller keeps going.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Rpc(_) | Error::RpcResponse(_))
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
