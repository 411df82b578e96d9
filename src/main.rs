// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Analyze { package, json }) => commands::cmd_analyze(&package, json),
        Some(Commands::Convert {
            package,
            output,
            config,
        }) => commands::cmd_convert(&package, &output, config.as_deref()),
        Some(Commands::Publish {
            package,
            config,
            output,
        }) => commands::cmd_publish(&package, &config, output.as_deref()),
        None => {
            println!("flowport v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'flowport --help' for usage information");
            Ok(())
        }
    }
}
