use clap::{Parser, Subcommand};
use motofix::Result;
use motofix::commands::{build_indexes, list_indexes, serve_api};
use motofix::config::{Config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "motofix")]
#[command(about = "Motorcycle manual Q&A service backed by per-model semantic indexes")]
#[command(version)]
struct Cli {
    /// Base directory holding config.toml, manuals and indexes
    #[arg(long, global = true, env = "MOTOFIX_HOME")]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build one index per manual
    Build {
        /// Directory containing one .txt manual per model
        #[arg(long)]
        manuals: Option<PathBuf>,
        /// Only rebuild the manual for this model
        #[arg(long)]
        model: Option<String>,
    },
    /// List the built model indexes
    List,
    /// Start the HTTP API
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => Config::default_base_dir()?,
    };

    match cli.command {
        Commands::Config { show: _ } => {
            show_config(&base_dir)?;
        }
        Commands::Build { manuals, model } => {
            build_indexes(&base_dir, manuals, model)?;
        }
        Commands::List => {
            list_indexes(&base_dir)?;
        }
        Commands::Serve { host, port } => {
            serve_api(&base_dir, host, port).await?;
        }
    }

    Ok(())
}
