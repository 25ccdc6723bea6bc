//! One-shot commands: `init`, `version`, `gen-validator`.

use anyhow::{Context, Result};

use crate::cli::InitArgs;
use crate::oneshot;
use crate::settings::Settings;

pub async fn cmd_init(settings: &Settings, args: InitArgs) -> Result<()> {
    let output = oneshot::init(settings, &args.home)
        .await
        .with_context(|| format!("initializing {}", args.home.display()))?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

pub async fn cmd_version(settings: &Settings) -> Result<()> {
    let settings = settings.clone();
    let version = tokio::task::spawn_blocking(move || oneshot::version(&settings))
        .await
        .context("version task panicked")?
        .context("reading tendermint version")?;
    println!("{}", version);
    Ok(())
}

pub async fn cmd_gen_validator(settings: &Settings) -> Result<()> {
    let settings = settings.clone();
    let key = tokio::task::spawn_blocking(move || oneshot::gen_validator(&settings))
        .await
        .context("gen_validator task panicked")?
        .context("generating validator key")?;
    println!("{}", key);
    Ok(())
}
