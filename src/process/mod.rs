//! Running the node binary, either to completion or as a supervised background process.

pub mod managed;

use std::process::{ExitStatus, Output, Stdio};

use tracing::{debug, warn};

use crate::config::LaunchConfig;
use crate::error::{Error, Result};
use crate::flags::flags;
use crate::settings::Settings;

pub use managed::{Completion, ExitOutcome, ManagedProcess, ProcessControl};

/// `<command> <flags...>` as handed to the binary.
pub fn command_args(command: &str, config: &LaunchConfig) -> Vec<String> {
    let mut args = Vec::with_capacity(1 + config.iter().count());
    args.push(command.to_string());
    args.extend(flags(config));
    args
}

/// Run the binary to completion on the calling thread.
pub fn exec_blocking(settings: &Settings, command: &str, config: &LaunchConfig) -> Result<Output> {
    let args = command_args(command, config);
    debug!("executing: tendermint {}", args.join(" "));

    let output = std::process::Command::new(&settings.binary)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| Error::Spawn {
            binary: settings.binary.clone(),
            source,
        })?;

    check_exit(command, output.status, &output.stderr)?;
    Ok(output)
}

/// Run the binary to completion without blocking the runtime.
pub async fn exec(settings: &Settings, command: &str, config: &LaunchConfig) -> Result<Output> {
    let args = command_args(command, config);
    debug!("executing: tendermint {}", args.join(" "));

    let output = tokio::process::Command::new(&settings.binary)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| Error::Spawn {
            binary: settings.binary.clone(),
            source,
        })?;

    check_exit(command, output.status, &output.stderr)?;
    Ok(output)
}

/// Start the binary in the background and return immediately.
pub fn spawn(settings: &Settings, command: &str, config: &LaunchConfig) -> Result<ManagedProcess> {
    let args = command_args(command, config);
    debug!("spawning: tendermint {}", args.join(" "));
    ManagedProcess::start(settings, &args)
}

fn check_exit(command: &str, status: ExitStatus, stderr: &[u8]) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    warn!(
        command,
        code = ?status.code(),
        stderr = %String::from_utf8_lossy(stderr).trim_end(),
        "tendermint command failed"
    );
    Err(Error::Exit {
        code: status.code(),
    })
}
