//! Polling the node until it reaches a milestone.

pub mod gate;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::rpc::StatusSource;
use crate::settings::DEFAULT_POLL_INTERVAL;

pub use gate::{Gate, GateOutcome};

/// The milestones a supervised node can be waited on for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// The RPC server answers.
    Started,
    /// Caught up with the network and past genesis.
    Synced,
}

impl GateKind {
    /// Evaluate this gate's condition once.
    pub async fn check<S: StatusSource>(self, source: &S) -> Result<bool> {
        match self {
            GateKind::Started => rpc_started(source).await,
            GateKind::Synced => rpc_synced(source).await,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateKind::Started => f.write_str("started"),
            GateKind::Synced => f.write_str("synced"),
        }
    }
}

/// Any successful status reply means the RPC server is up.
pub async fn rpc_started<S: StatusSource>(source: &S) -> Result<bool> {
    source.status().await?;
    Ok(true)
}

pub async fn rpc_synced<S: StatusSource>(source: &S) -> Result<bool> {
    Ok(source.status().await?.sync_info.is_synced())
}

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// `None` polls forever.
    pub timeout: Option<Duration>,
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Evaluate `predicate` until it returns `true` or the timeout passes.
///
/// Retryable errors (see [`Error::is_retryable`]) count as "not yet"; any
/// other error ends the wait. Sleeps never run past the deadline, and a check
/// still in flight when the deadline hits is abandoned.
pub async fn wait_until<'a, S, F, Fut>(
    gate: GateKind,
    source: &'a S,
    options: PollOptions,
    mut predicate: F,
) -> Result<()>
where
    F: FnMut(&'a S) -> Fut,
    Fut: Future<Output = Result<bool>> + 'a,
{
    let start = Instant::now();
    let deadline = options.timeout.map(|t| start + t);
    let mut attempts: u32 = 0;

    loop {
        let elapsed = start.elapsed();
        if let Some(timeout) = options.timeout {
            if elapsed >= timeout {
                warn!(gate = %gate, attempts, elapsed_ms = elapsed.as_millis() as u64, "gave up waiting for node");
                return Err(Error::Timeout { gate, elapsed });
            }
        }

        attempts += 1;
        let check = predicate(source);
        let result = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, check).await {
                Ok(result) => result,
                Err(_) => continue,
            },
            None => check.await,
        };

        match result {
            Ok(true) => {
                info!(
                    gate = %gate,
                    attempts,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "node is {}", gate
                );
                return Ok(());
            }
            Ok(false) => debug!(gate = %gate, attempts, "node not ready yet"),
            Err(e) if e.is_retryable() => {
                debug!(gate = %gate, attempts, error = %e, "readiness check failed, retrying")
            }
            Err(e) => return Err(e),
        }

        let nap = match deadline {
            Some(deadline) => options
                .interval
                .min(deadline.saturating_duration_since(Instant::now())),
            None => options.interval,
        };
        sleep(nap).await;
    }
}
