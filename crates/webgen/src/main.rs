//! webgen CLI - static site generator.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use commands::build::BuildArgs;
use config::ConfigFile;

#[derive(Parser)]
#[command(name = "webgen")]
#[command(about = "Generates a static website from content, page templates and Markdown")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to webgen.toml config file
    #[arg(short, long, default_value = "webgen.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the site
    Build(BuildArgs),

    /// Serve a generated site
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:4000 or :4000
        #[arg(short, long, default_value = "127.0.0.1:4000")]
        addr: String,

        /// Directory to serve (defaults to config or "public")
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let file = ConfigFile::load(&cli.config)?;

    match cli.command {
        Commands::Build(args) => {
            commands::build::run(args, file).await?;
        }
        Commands::Serve { addr, dir } => {
            commands::serve::run(&addr, dir, file).await?;
        }
    }

    Ok(())
}
