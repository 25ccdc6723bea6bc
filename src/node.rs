//! Launching a supervised node and waiting for it to become usable.

use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::process::{ChildStderr, ChildStdout};
use tracing::{info, warn};

use crate::config::LaunchConfig;
use crate::error::{Error, Result};
use crate::process::{self, Completion, ExitOutcome, ProcessControl};
use crate::readiness::{Gate, GateKind, PollOptions};
use crate::rpc::{RpcClient, RpcEndpoint, FULL_NODE_RPC_PORT, LIGHT_CLIENT_RPC_PORT};
use crate::settings::Settings;

/// Which flavour of node to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `tendermint node`
    Full,
    /// `tendermint lite`, an RPC proxy verifying a remote node.
    Light,
}

impl NodeKind {
    pub fn subcommand(self) -> &'static str {
        match self {
            NodeKind::Full => "node",
            NodeKind::Light => "lite",
        }
    }

    pub fn default_rpc_port(self) -> u16 {
        match self {
            NodeKind::Full => FULL_NODE_RPC_PORT,
            NodeKind::Light => LIGHT_CLIENT_RPC_PORT,
        }
    }

    /// Options that must be non-empty strings before anything is spawned.
    pub fn required_options(self) -> &'static [&'static str] {
        match self {
            NodeKind::Full => &["home"],
            NodeKind::Light => &["node", "chain-id", "home-dir"],
        }
    }
}

/// Start `tendermint node` with `home` as its home directory.
pub fn start_full_node(
    settings: &Settings,
    home: impl AsRef<Path>,
    config: LaunchConfig,
) -> Result<NodeHandle> {
    let config = config.with("home", path_option("home", home.as_ref())?);
    launch(settings, NodeKind::Full, config)
}

/// Start `tendermint lite` proxying `target` for `chain_id`, keeping its data in `path`.
pub fn start_light_client(
    settings: &Settings,
    target: &str,
    chain_id: &str,
    path: impl AsRef<Path>,
    config: LaunchConfig,
) -> Result<NodeHandle> {
    let config = config
        .with("node", target)
        .with("chain-id", chain_id)
        .with("home-dir", path_option("path", path.as_ref())?);
    launch(settings, NodeKind::Light, config)
}

fn path_option(name: &str, path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Config(format!("{:?} must be valid UTF-8: {}", name, path.display())))
}

/// Validate `config`, resolve the RPC endpoint, and spawn the node.
///
/// Configuration problems are reported before any process exists. Must be
/// called from within a tokio runtime.
pub fn launch(settings: &Settings, kind: NodeKind, config: LaunchConfig) -> Result<NodeHandle> {
    for option in kind.required_options() {
        config.require_str(option)?;
    }

    let endpoint = RpcEndpoint::resolve(&config, kind.default_rpc_port())?;
    let rpc = Arc::new(RpcClient::new(&endpoint)?);

    let (control, completion) = process::spawn(settings, kind.subcommand(), &config)?.into_parts();
    info!(kind = ?kind, pid = ?control.pid(), rpc = %endpoint, "node launched");

    Ok(NodeHandle {
        kind,
        endpoint,
        rpc,
        control,
        completion,
        poll_interval: settings.poll_interval,
        started_timeout: settings.started_timeout,
        started: OnceLock::new(),
        synced: OnceLock::new(),
    })
}

/// A running node: process control, completion, RPC client and readiness gates.
#[derive(Debug)]
pub struct NodeHandle {
    kind: NodeKind,
    endpoint: RpcEndpoint,
    rpc: Arc<RpcClient>,
    control: ProcessControl,
    completion: Completion,
    poll_interval: Duration,
    started_timeout: Duration,
    started: OnceLock<Gate>,
    synced: OnceLock<Gate>,
}

impl NodeHandle {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn endpoint(&self) -> &RpcEndpoint {
        &self.endpoint
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn pid(&self) -> Option<u32> {
        self.control.pid()
    }

    pub fn control(&self) -> &ProcessControl {
        &self.control
    }

    /// Resolves when the process exits; clones resolve to the same outcome.
    pub fn completion(&self) -> Completion {
        self.completion.clone()
    }

    /// Resolves once the RPC server answers.
    ///
    /// If the node has already failed when the gate is first requested, the
    /// gate resolves to that exit error without polling.
    ///
    /// The first call starts the poll loop with its `timeout` (default from
    /// [`Settings::started_timeout`]); later calls return the same gate and
    /// their `timeout` is ignored.
    pub fn started(&self, timeout: Option<Duration>) -> Gate {
        let timeout = timeout.unwrap_or(self.started_timeout);
        self.started
            .get_or_init(|| self.spawn_gate(GateKind::Started, Some(timeout)))
            .clone()
    }

    /// Resolves once the node has caught up and produced a block.
    ///
    /// Waits forever unless a `timeout` is given. Like [`started`](Self::started),
    /// only the first call's timeout counts. A node that dies while this is
    /// pending is not noticed by the poll loop; pair it with
    /// [`completion`](Self::completion) if that matters.
    pub fn synced(&self, timeout: Option<Duration>) -> Gate {
        self.synced
            .get_or_init(|| self.spawn_gate(GateKind::Synced, timeout))
            .clone()
    }

    fn spawn_gate(&self, kind: GateKind, timeout: Option<Duration>) -> Gate {
        if let Some(Err(e)) = self.completion.try_outcome().map(ExitOutcome::into_result) {
            warn!(gate = %kind, error = %e, "node already exited, not polling");
            return Gate::resolved(kind, Err(Arc::new(e)));
        }

        info!(gate = %kind, timeout = ?timeout, rpc = %self.endpoint, "waiting for node");
        Gate::spawn(
            kind,
            self.rpc.clone(),
            PollOptions {
                timeout,
                interval: self.poll_interval,
            },
        )
    }

    pub fn take_stdout(&self) -> Option<ChildStdout> {
        self.control.take_stdout()
    }

    pub fn take_stderr(&self) -> Option<ChildStderr> {
        self.control.take_stderr()
    }

    /// SIGKILL the node and wait for it to be reaped.
    pub async fn kill(&self) -> ExitOutcome {
        self.control.kill();
        self.completion.outcome().await
    }

    /// SIGTERM the node, SIGKILL after `grace`.
    pub async fn terminate(&self, grace: Duration) -> ExitOutcome {
        self.control.terminate(grace).await
    }
}
