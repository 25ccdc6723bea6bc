pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod flags;
pub mod node;
pub mod oneshot;
pub mod paths;
pub mod process;
pub mod readiness;
pub mod rpc;
pub mod settings;

// Re-export core types for convenience
pub use config::{ConfigValue, LaunchConfig};
pub use error::{Error, Result};
pub use node::{launch, start_full_node, start_light_client, NodeHandle, NodeKind};
pub use oneshot::{gen_validator, init, init_blocking, version};
pub use process::{Completion, ExitOutcome, ManagedProcess, ProcessControl};
pub use readiness::{Gate, GateKind, GateOutcome};
pub use rpc::{RpcClient, RpcEndpoint};
pub use settings::Settings;
