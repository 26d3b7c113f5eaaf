//! Rackmix CLI - Render, inspect and validate rackmix mixer sessions.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rackmix")]
#[command(author, version, about = "Rackmix mixer engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a session to a WAV file using synthetic track sources
    Render(commands::render::RenderArgs),

    /// List the host parameter table for a mixer layout
    Params(commands::params::ParamsArgs),

    /// Create or validate session files
    Session(commands::session::SessionArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Params(args) => commands::params::run(args),
        Commands::Session(args) => commands::session::run(args),
    }
}
