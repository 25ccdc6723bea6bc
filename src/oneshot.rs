//! Short-lived node commands that run to completion.

use std::path::Path;

use crate::config::LaunchConfig;
use crate::error::{Error, Result};
use crate::process::{exec, exec_blocking};
use crate::settings::Settings;

fn home_config(home: &Path) -> Result<LaunchConfig> {
    let home = home
        .to_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::Config(format!("invalid home directory {:?}", home)))?;
    Ok(LaunchConfig::new().with("home", home))
}

fn stdout_text(stdout: Vec<u8>) -> String {
    String::from_utf8_lossy(&stdout).trim_end().to_string()
}

/// `tendermint init --home=<home>`: write a fresh config, genesis and keys.
pub async fn init(settings: &Settings, home: impl AsRef<Path>) -> Result<String> {
    let output = exec(settings, "init", &home_config(home.as_ref())?).await?;
    Ok(stdout_text(output.stdout))
}

/// Same as [`init`], blocking the calling thread.
pub fn init_blocking(settings: &Settings, home: impl AsRef<Path>) -> Result<String> {
    let output = exec_blocking(settings, "init", &home_config(home.as_ref())?)?;
    Ok(stdout_text(output.stdout))
}

/// The binary's version string.
pub fn version(settings: &Settings) -> Result<String> {
    let output = exec_blocking(settings, "version", &LaunchConfig::new())?;
    Ok(stdout_text(output.stdout))
}

/// A freshly generated validator key, as the JSON the binary prints.
pub fn gen_validator(settings: &Settings) -> Result<String> {
    let output = exec_blocking(settings, "gen_validator", &LaunchConfig::new())?;
    Ok(stdout_text(output.stdout))
}
