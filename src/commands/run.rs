//! `tmnode node` / `tmnode lite`: launch, wait for readiness, supervise until exit.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::cli::{LaunchArgs, LiteArgs, NodeArgs};
use crate::node::{self, NodeHandle};
use crate::readiness::GateKind;
use crate::settings::Settings;

pub async fn cmd_node(settings: &Settings, args: NodeArgs) -> Result<()> {
    let config = args.launch.to_config().context("building node options")?;
    let handle = node::start_full_node(settings, &args.home, config)
        .with_context(|| format!("launching full node in {}", args.home.display()))?;
    supervise(handle, &args.launch).await
}

pub async fn cmd_lite(settings: &Settings, args: LiteArgs) -> Result<()> {
    let config = args.launch.to_config().context("building light-client options")?;
    let handle = node::start_light_client(settings, &args.target, &args.chain_id, &args.home, config)
        .with_context(|| format!("launching light client for {}", args.target))?;
    supervise(handle, &args.launch).await
}

async fn supervise(handle: NodeHandle, launch: &LaunchArgs) -> Result<()> {
    let grace = Duration::from_secs(launch.stop_grace);
    let completion = handle.completion();

    if let Some(kind) = Option::<GateKind>::from(launch.wait) {
        let timeout = launch.timeout.map(Duration::from_secs);
        let gate = match kind {
            GateKind::Started => handle.started(timeout),
            GateKind::Synced => handle.synced(timeout),
        };

        // The gate alone would keep polling a dead node until its timeout.
        tokio::select! {
            outcome = gate.wait() => {
                if let Err(e) = outcome {
                    error!(gate = %kind, "node did not become ready, stopping it");
                    handle.terminate(grace).await;
                    return Err(e).with_context(|| format!("waiting for node to be {}", kind));
                }
                println!("node is {}: rpc at {}", kind, handle.endpoint().url());
            }
            outcome = completion.outcome() => {
                bail!("tendermint exited before it was {}: {:?}", kind, outcome);
            }
        }
    }

    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;

    tokio::select! {
        outcome = completion.outcome() => {
            let outcome = outcome.into_result().context("tendermint failed")?;
            info!(outcome = ?outcome, "tendermint exited");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM");
            let outcome = handle.terminate(grace).await;
            info!(outcome = ?outcome, "tendermint stopped");
        }
        _ = sigint.recv() => {
            info!("received SIGINT");
            let outcome = handle.terminate(grace).await;
            info!(outcome = ?outcome, "tendermint stopped");
        }
    }

    Ok(())
}
