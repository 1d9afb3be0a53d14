#![doc = include_str!("../README.md")]

mod cli;
mod commands;
mod output;

use clap::Parser;
use polywit_lang::SourceLanguage;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Java(args) => {
            commands::validate::run_validate_command(SourceLanguage::Java, args)?;
        }
        Commands::Kotlin(args) => {
            commands::validate::run_validate_command(SourceLanguage::Kotlin, args)?;
        }
    }
    Ok(())
}
