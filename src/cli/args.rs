use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::LaunchConfig;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "tmnode", version, about = "Launch and supervise a Tendermint node")]
pub struct Cli {
    /// Path to the tendermint binary (default: $TM_BINARY, next to tmnode, or on PATH)
    #[arg(long, global = true)]
    pub binary: Option<PathBuf>,

    /// Copy the node's stdout/stderr to ours (also enabled by a non-empty $TM_LOG)
    #[arg(long, global = true)]
    pub forward_logs: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full node until it exits or we are interrupted
    Node(NodeArgs),
    /// Run a light-client RPC proxy in front of a remote node
    Lite(LiteArgs),
    /// Initialize a node home directory
    Init(InitArgs),
    /// Print the tendermint version
    Version,
    /// Generate a validator key and print it
    GenValidator,
}

#[derive(Args, Debug)]
pub struct NodeArgs {
    /// Node home directory
    #[arg(long)]
    pub home: PathBuf,

    #[command(flatten)]
    pub launch: LaunchArgs,
}

#[derive(Args, Debug)]
pub struct LiteArgs {
    /// RPC address of the node to verify against (e.g. tcp://localhost:26657)
    #[arg(long)]
    pub target: String,

    /// Chain ID of the target network
    #[arg(long)]
    pub chain_id: String,

    /// Light-client data directory
    #[arg(long)]
    pub home: PathBuf,

    #[command(flatten)]
    pub launch: LaunchArgs,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Node home directory to initialize
    #[arg(long)]
    pub home: PathBuf,
}

/// Options shared by the long-running commands.
#[derive(Args, Debug)]
pub struct LaunchArgs {
    /// JSON file with node options ({"rpc": {"laddr": "tcp://0.0.0.0:26657"}, ...})
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Node option as KEY=VALUE; dotted keys nest (rpc.laddr=tcp://0.0.0.0:26657)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Milestone to wait for before reporting the node as up
    #[arg(long, value_enum, default_value_t = WaitFor::Started)]
    pub wait: WaitFor,

    /// Seconds to wait for the milestone (default: 30 for started, forever for synced)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seconds between SIGTERM and SIGKILL when stopping the node
    #[arg(long, default_value_t = 10)]
    pub stop_grace: u64,
}

impl LaunchArgs {
    /// Options from `--config`, then each `--set` applied on top.
    pub fn to_config(&self) -> Result<LaunchConfig> {
        let mut config = match &self.config {
            Some(path) => LaunchConfig::from_json_file(path)?,
            None => LaunchConfig::new(),
        };
        for pair in &self.set {
            config.set_pair(pair)?;
        }
        Ok(config)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum WaitFor {
    /// Don't wait
    #[value(name = "none")]
    NoWait,
    /// RPC server answering
    Started,
    /// Caught up with the network
    Synced,
}
