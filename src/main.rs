use anyhow::Result;
use clap::Parser;
use tmnode::cli::Commands;
use tmnode::{cli, commands, Settings};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Only use colors when outputting to a TTY (not when piped to file)
    let use_color = atty::is(atty::Stream::Stdout);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(true)
        .with_ansi(use_color)
        .init();

    let mut settings = Settings::from_env();
    if let Some(binary) = cli.binary {
        settings.binary = binary;
    }
    settings.forward_logs |= cli.forward_logs;

    // Dispatch to appropriate command handler
    let result = match cli.cmd {
        Commands::Node(args) => commands::cmd_node(&settings, args).await,
        Commands::Lite(args) => commands::cmd_lite(&settings, args).await,
        Commands::Init(args) => commands::cmd_init(&settings, args).await,
        Commands::Version => commands::cmd_version(&settings).await,
        Commands::GenValidator => commands::cmd_gen_validator(&settings).await,
    };

    // Handle errors
    if let Err(e) = &result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }

    result
}
